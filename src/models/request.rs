use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::auth::Authentication;

/// Declarative description of one outbound call, as the editor produces it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescription {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: RequestUrl,
    #[serde(default, alias = "header", deserialize_with = "null_as_default")]
    pub headers: Vec<RequestHeader>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: RequestBody,
    #[serde(default, alias = "auth")]
    pub authentication: Option<Authentication>,
}

fn default_method() -> String {
    "GET".to_string()
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Only `raw` is used on the wire; the remaining Postman URL fields
/// (`protocol`, `host`, `path`, `query`) are kept for display.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "UrlWire")]
pub struct RequestUrl {
    pub raw: String,
    pub parts: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UrlWire {
    Raw(String),
    Structured {
        #[serde(default)]
        raw: String,
        #[serde(flatten)]
        parts: Map<String, Value>,
    },
}

impl From<UrlWire> for RequestUrl {
    fn from(wire: UrlWire) -> Self {
        match wire {
            UrlWire::Raw(raw) => RequestUrl {
                raw,
                parts: Map::new(),
            },
            UrlWire::Structured { raw, parts } => RequestUrl { raw, parts },
        }
    }
}

impl From<&str> for RequestUrl {
    fn from(raw: &str) -> Self {
        RequestUrl {
            raw: raw.to_string(),
            parts: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RequestHeader {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestBody {
    #[serde(default = "default_body_mode")]
    pub mode: String,
    #[serde(default)]
    pub raw: Option<String>,
    /// `formdata`, `urlencoded`, `options` and friends; accepted, never sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_body_mode() -> String {
    "raw".to_string()
}

impl Default for RequestBody {
    fn default() -> Self {
        Self {
            mode: default_body_mode(),
            raw: None,
            extra: Map::new(),
        }
    }
}

impl RequestBody {
    pub fn raw_text(&self) -> &str {
        self.raw.as_deref().unwrap_or("")
    }
}
