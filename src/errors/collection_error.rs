use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundKind {
    Collection,
    Request,
}

impl fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundKind::Collection => write!(f, "Collection"),
            NotFoundKind::Request => write!(f, "Request"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollectionError {
    #[error("Invalid JSON structure: {0}")]
    InvalidStructure(String),
    #[error("{kind} not found: {name}")]
    NotFound { kind: NotFoundKind, name: String },
    #[error("Error updating request: {0}")]
    Internal(String),
}

impl CollectionError {
    pub fn collection_not_found(name: &str) -> Self {
        Self::NotFound {
            kind: NotFoundKind::Collection,
            name: name.to_string(),
        }
    }

    pub fn request_not_found(name: &str) -> Self {
        Self::NotFound {
            kind: NotFoundKind::Request,
            name: name.to_string(),
        }
    }
}
