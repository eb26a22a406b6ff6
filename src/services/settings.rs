use crate::constants::{network, storage};
use crate::errors::ToolError;
use std::path::PathBuf;
use std::time::Duration;

/// Process configuration, read once from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub storage_dir: PathBuf,
    pub http_timeout: Option<Duration>,
    pub max_redirects: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(storage::DEFAULT_DIR),
            http_timeout: None,
            max_redirects: network::DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ToolError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ToolError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        if let Some(dir) = non_empty(lookup(storage::ENV_STORAGE_DIR)) {
            settings.storage_dir = PathBuf::from(dir);
        }
        if let Some(raw) = non_empty(lookup(network::ENV_HTTP_TIMEOUT_MS)) {
            let ms = parse_u64(network::ENV_HTTP_TIMEOUT_MS, &raw)?;
            settings.http_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(raw) = non_empty(lookup(network::ENV_MAX_REDIRECTS)) {
            settings.max_redirects = parse_u64(network::ENV_MAX_REDIRECTS, &raw)? as usize;
        }
        Ok(settings)
    }

    /// The shared transport handed to the executor.
    pub fn build_http_client(&self) -> Result<reqwest::Client, ToolError> {
        let redirect = if self.max_redirects == 0 {
            reqwest::redirect::Policy::none()
        } else {
            reqwest::redirect::Policy::limited(self.max_redirects)
        };
        let mut builder = reqwest::Client::builder().redirect(redirect);
        if let Some(timeout) = self.http_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| ToolError::internal(format!("Failed to build HTTP client: {}", err)))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, ToolError> {
    raw.parse::<u64>().map_err(|_| {
        ToolError::invalid_params(format!("{} must be a non-negative integer", key))
            .with_details(serde_json::json!({ "value": raw }))
    })
}
