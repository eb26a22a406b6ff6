use crate::constants::storage;
use crate::errors::ToolError;
use crate::utils::fs_atomic::{atomic_write_file, DOCUMENT_FILE_MODE};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Byte storage for collection documents, addressed by file name.
///
/// Names reaching a store have already been validated as relative paths.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Top-level `.json` documents, sorted by name.
    async fn list(&self) -> Result<Vec<String>, ToolError>;
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, ToolError>;
    /// Replaces the whole document; readers never observe a partial write.
    async fn write(&self, name: &str, content: Vec<u8>) -> Result<(), ToolError>;
}

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl DocumentStore for DirectoryStore {
    async fn list(&self) -> Result<Vec<String>, ToolError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(ToolError::internal(format!(
                    "Failed to list storage directory: {}",
                    err
                )))
            }
        };
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !name.ends_with(storage::DOCUMENT_EXTENSION) {
                continue;
            }
            // Follows symlinks: a link to a regular file counts as a document.
            let is_file = tokio::fs::metadata(entry.path())
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);
            if is_file {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, ToolError> {
        let path = self.resolve(name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        }
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ToolError::internal(format!(
                "Failed to read {}: {}",
                name, err
            ))),
        }
    }

    async fn write(&self, name: &str, content: Vec<u8>) -> Result<(), ToolError> {
        let path = self.resolve(name);
        let label = name.to_string();
        tokio::task::spawn_blocking(move || atomic_write_file(&path, &content, DOCUMENT_FILE_MODE))
            .await
            .map_err(|err| ToolError::internal(format!("Write task failed: {}", err)))?
            .map_err(|err| ToolError::internal(format!("Failed to write {}: {}", label, err)))
    }
}
