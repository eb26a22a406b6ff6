use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

use super::collection_error::{CollectionError, NotFoundKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidParams,
    NotFound,
    Internal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidParams, "INVALID_PARAMS", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, "INTERNAL", message)
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ToolError {}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::internal(err.to_string())
    }
}

impl From<CollectionError> for ToolError {
    fn from(err: CollectionError) -> Self {
        let message = err.to_string();
        match &err {
            CollectionError::InvalidStructure(_) => {
                ToolError::new(ToolErrorKind::InvalidParams, "INVALID_STRUCTURE", message)
            }
            CollectionError::NotFound { kind, name } => {
                let code = match kind {
                    NotFoundKind::Collection => "COLLECTION_NOT_FOUND",
                    NotFoundKind::Request => "REQUEST_NOT_FOUND",
                };
                ToolError::new(ToolErrorKind::NotFound, code, message)
                    .with_details(serde_json::json!({ "kind": kind, "name": name }))
            }
            CollectionError::Internal(_) => ToolError::internal(message),
        }
    }
}
