use crate::constants::{logging, network};
use crate::models::{OAuth2Config, OAuth2Grant};
use crate::services::logger::Logger;
use crate::utils::redact::{redact_text, redact_url};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum TokenFailure {
    #[error("unsupported grant type '{0}'")]
    UnsupportedGrant(String),
    #[error("accessTokenUrl is empty")]
    MissingTokenUrl,
    #[error("failed to encode token request: {0}")]
    Encode(String),
    #[error("token endpoint unreachable: {0}")]
    Transport(String),
    #[error("token endpoint answered {status}")]
    Status { status: u16, body: String },
    #[error("token response is not JSON: {0}")]
    InvalidResponse(String),
    #[error("token response has no access_token")]
    MissingAccessToken,
}

/// Form fields for the machine-to-machine grants. `None` for any grant that
/// would need a browser redirect.
pub fn token_request_form(config: &OAuth2Config) -> Option<Vec<(&'static str, String)>> {
    let grant = config.grant();
    let grant_type = match &grant {
        OAuth2Grant::ClientCredentials => "client_credentials",
        OAuth2Grant::Password => "password",
        OAuth2Grant::RefreshToken => "refresh_token",
        OAuth2Grant::Unsupported(_) => return None,
    };

    let mut form = vec![
        ("grant_type", grant_type.to_string()),
        ("client_id", config.client_id.clone()),
        ("client_secret", config.client_secret.clone()),
    ];
    match grant {
        OAuth2Grant::ClientCredentials => push_scope(&mut form, config),
        OAuth2Grant::Password => {
            form.push(("username", config.username.clone().unwrap_or_default()));
            form.push(("password", config.password.clone().unwrap_or_default()));
            push_scope(&mut form, config);
        }
        OAuth2Grant::RefreshToken => {
            form.push((
                "refresh_token",
                config.refresh_token.clone().unwrap_or_default(),
            ));
        }
        OAuth2Grant::Unsupported(_) => {}
    }
    Some(form)
}

fn push_scope(form: &mut Vec<(&'static str, String)>, config: &OAuth2Config) {
    if let Some(scope) = config.scope.as_deref().filter(|s| !s.trim().is_empty()) {
        form.push(("scope", scope.to_string()));
    }
}

/// Exchanges OAuth2 client credentials for an access token.
#[derive(Clone)]
pub struct TokenAcquirer {
    logger: Logger,
    client: Client,
}

impl TokenAcquirer {
    pub fn new(logger: Logger, client: Client) -> Self {
        Self {
            logger: logger.child("oauth2"),
            client,
        }
    }

    /// Never fails: every problem is logged and reported as `None`, so the
    /// enclosing request goes out without authorization instead.
    pub async fn acquire_token(&self, config: &OAuth2Config) -> Option<String> {
        match self.request_token(config).await {
            Ok(token) => {
                self.logger.debug(
                    "access token acquired",
                    Some(&serde_json::json!({
                        "grant_type": config.grant_type,
                        "token_url": redact_url(&config.access_token_url),
                    })),
                );
                Some(token)
            }
            Err(failure) => {
                let mut meta = serde_json::json!({
                    "grant_type": config.grant_type,
                    "token_url": redact_url(&config.access_token_url),
                    "reason": failure.to_string(),
                });
                if let TokenFailure::Status { body, .. } = &failure {
                    meta["body"] = Value::String(body.clone());
                }
                self.logger.warn(
                    "OAuth2 token acquisition failed, sending request without authorization",
                    Some(&meta),
                );
                None
            }
        }
    }

    pub async fn request_token(&self, config: &OAuth2Config) -> Result<String, TokenFailure> {
        let form = token_request_form(config)
            .ok_or_else(|| TokenFailure::UnsupportedGrant(config.grant_type.clone()))?;
        let token_url = config.access_token_url.trim();
        if token_url.is_empty() {
            return Err(TokenFailure::MissingTokenUrl);
        }
        let encoded =
            serde_urlencoded::to_string(&form).map_err(|err| TokenFailure::Encode(err.to_string()))?;

        let response = self
            .client
            .post(token_url)
            .header(CONTENT_TYPE, network::FORM_CONTENT_TYPE)
            .header(ACCEPT, "application/json")
            .body(encoded)
            .send()
            .await
            .map_err(|err| TokenFailure::Transport(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| TokenFailure::Transport(err.to_string()))?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            return Err(TokenFailure::Status {
                status: status.as_u16(),
                body: redact_text(&text, logging::MAX_LOGGED_BODY_BYTES),
            });
        }

        let payload: Value = serde_json::from_slice(&bytes)
            .map_err(|err| TokenFailure::InvalidResponse(err.to_string()))?;
        payload
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or(TokenFailure::MissingAccessToken)
    }
}
