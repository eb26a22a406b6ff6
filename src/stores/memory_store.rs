use crate::constants::storage;
use crate::errors::ToolError;
use crate::stores::file_store::DocumentStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Process-local documents, used where no storage directory is wanted.
#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, name: &str, content: impl Into<Vec<u8>>) -> Self {
        if let Ok(mut documents) = self.documents.write() {
            documents.insert(name.to_string(), content.into());
        }
        self
    }

    fn poisoned() -> ToolError {
        ToolError::internal("memory store lock poisoned")
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self) -> Result<Vec<String>, ToolError> {
        let documents = self.documents.read().map_err(|_| Self::poisoned())?;
        Ok(documents
            .keys()
            .filter(|name| name.ends_with(storage::DOCUMENT_EXTENSION) && !name.contains('/'))
            .cloned()
            .collect())
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, ToolError> {
        let documents = self.documents.read().map_err(|_| Self::poisoned())?;
        Ok(documents.get(name).cloned())
    }

    async fn write(&self, name: &str, content: Vec<u8>) -> Result<(), ToolError> {
        let mut documents = self.documents.write().map_err(|_| Self::poisoned())?;
        documents.insert(name.to_string(), content);
        Ok(())
    }
}
