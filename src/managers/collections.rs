use crate::errors::{ToolError, ToolErrorKind};
use crate::services::collection_editor;
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use crate::stores::DocumentStore;
use crate::utils::tool_errors::unknown_action_error;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const COLLECTIONS_TOOL: &str = "collections";
const COLLECTIONS_ACTIONS: &[&str] = &["list_files", "get_file", "save_request"];

pub const SAVE_SUCCESS_MESSAGE: &str = "Request updated successfully.";

/// Listing, retrieval and request updates for stored collection documents.
///
/// Saves to the same file are serialized through a per-file lock held
/// across the whole read-modify-write cycle.
#[derive(Clone)]
pub struct CollectionsManager {
    logger: Logger,
    validation: Validation,
    store: Arc<dyn DocumentStore>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl CollectionsManager {
    pub fn new(logger: Logger, validation: Validation, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            logger: logger.child("collections"),
            validation,
            store,
            locks: Arc::new(DashMap::new()),
        }
    }

    pub async fn handle_action(&self, args: Value) -> Result<Value, ToolError> {
        let action = args.get("action");
        match action.and_then(|v| v.as_str()).unwrap_or("") {
            "list_files" => self.list_files().await,
            "get_file" => self.get_file(&args).await,
            "save_request" => self.save_request(&args).await,
            _ => Err(unknown_action_error(
                COLLECTIONS_TOOL,
                action,
                COLLECTIONS_ACTIONS,
            )),
        }
    }

    async fn list_files(&self) -> Result<Value, ToolError> {
        let files = self.store.list().await?;
        Ok(serde_json::json!({ "files": files }))
    }

    async fn get_file(&self, args: &Value) -> Result<Value, ToolError> {
        let file_name = self.validation.ensure_file_name(args.get("file_name"))?;
        let bytes = self
            .store
            .read(&file_name)
            .await?
            .ok_or_else(|| file_not_found(&file_name))?;
        let document: Value = serde_json::from_slice(&bytes).map_err(|err| {
            ToolError::internal(format!("{} is not valid JSON: {}", file_name, err))
        })?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        Ok(serde_json::json!({
            "file_name": file_name,
            "content": content,
            "document": document,
        }))
    }

    async fn save_request(&self, args: &Value) -> Result<Value, ToolError> {
        let file_name = self.validation.ensure_file_name(args.get("file_name"))?;
        let collection_name = self
            .validation
            .ensure_optional_string(args.get("collection_name"), "collection_name")?;
        let request_name = self.validation.ensure_string(
            args.get("request_name").unwrap_or(&Value::Null),
            "request_name",
            false,
        )?;
        let payload = args
            .get("request")
            .cloned()
            .ok_or_else(|| ToolError::invalid_params("request is required"))?;

        let lock = self.file_lock(&file_name);
        let outcome = {
            let _guard = lock.lock().await;
            self.rewrite_document(&file_name, collection_name.as_deref(), &request_name, payload)
                .await
        };
        self.release_lock(&file_name);
        outcome?;

        self.logger.info(
            "request updated",
            Some(&serde_json::json!({
                "file_name": file_name,
                "collection_name": collection_name,
                "request_name": request_name,
            })),
        );
        Ok(serde_json::json!({
            "success": true,
            "message": SAVE_SUCCESS_MESSAGE,
        }))
    }

    async fn rewrite_document(
        &self,
        file_name: &str,
        collection_name: Option<&str>,
        request_name: &str,
        payload: Value,
    ) -> Result<(), ToolError> {
        let bytes = self
            .store
            .read(file_name)
            .await?
            .ok_or_else(|| file_not_found(file_name))?;
        let updated =
            collection_editor::save_request_bytes(&bytes, collection_name, request_name, payload)
                .map_err(|err| {
                    self.logger.warn(
                        "request update rejected",
                        Some(&serde_json::json!({
                            "file_name": file_name,
                            "collection_name": collection_name,
                            "request_name": request_name,
                            "reason": err.to_string(),
                        })),
                    );
                    ToolError::from(err)
                })?;
        self.store.write(file_name, updated).await?;
        Ok(())
    }

    fn file_lock(&self, file_name: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(file_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the map entry once only the map and the releasing caller hold it.
    fn release_lock(&self, file_name: &str) {
        self.locks
            .remove_if(file_name, |_, lock| Arc::strong_count(lock) <= 2);
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.len()
    }
}

fn file_not_found(file_name: &str) -> ToolError {
    ToolError::new(ToolErrorKind::NotFound, "FILE_NOT_FOUND", "File not found.")
        .with_details(serde_json::json!({ "file_name": file_name }))
}

#[async_trait::async_trait]
impl ToolHandler for CollectionsManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        self.logger.debug("handle_action", args.get("action"));
        self.handle_action(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use serde_json::json;

    const DOC: &str = r#"{"item":[{"name":"A","item":[{"name":"req1","request":{"method":"GET"}}]}]}"#;

    fn manager(store: MemoryStore) -> CollectionsManager {
        CollectionsManager::new(
            Logger::capturing("test").0,
            Validation::new(),
            Arc::new(store),
        )
    }

    #[tokio::test]
    async fn save_rewrites_the_stored_document() {
        let store = MemoryStore::new().with_document("demo.json", DOC);
        let manager = manager(store.clone());
        let result = manager
            .handle_action(json!({
                "action": "save_request",
                "file_name": "demo.json",
                "collection_name": "A",
                "request_name": "req1",
                "request": {"method": "POST"}
            }))
            .await
            .expect("saved");
        assert_eq!(result["message"], SAVE_SUCCESS_MESSAGE);

        let bytes = store.read("demo.json").await.unwrap().unwrap();
        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc["item"][0]["item"][0]["request"]["method"], "POST");
    }

    #[tokio::test]
    async fn rejected_save_leaves_bytes_untouched() {
        let store = MemoryStore::new().with_document("demo.json", DOC);
        let manager = manager(store.clone());
        let err = manager
            .handle_action(json!({
                "action": "save_request",
                "file_name": "demo.json",
                "collection_name": "A",
                "request_name": "missing",
                "request": {}
            }))
            .await
            .expect_err("must fail");
        assert_eq!(err.code, "REQUEST_NOT_FOUND");
        assert_eq!(store.read("demo.json").await.unwrap().unwrap(), DOC.as_bytes());
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let manager = manager(MemoryStore::new());
        for action in ["get_file", "save_request"] {
            let err = manager
                .handle_action(json!({
                    "action": action,
                    "file_name": "nope.json",
                    "request_name": "r",
                    "request": {}
                }))
                .await
                .expect_err("must fail");
            assert_eq!(err.kind, ToolErrorKind::NotFound);
            assert_eq!(err.message, "File not found.");
        }
    }

    #[tokio::test]
    async fn request_payload_is_required() {
        let manager = manager(MemoryStore::new().with_document("demo.json", DOC));
        let err = manager
            .handle_action(json!({
                "action": "save_request",
                "file_name": "demo.json",
                "request_name": "req1"
            }))
            .await
            .expect_err("must fail");
        assert_eq!(err.code, "INVALID_PARAMS");
    }

    #[tokio::test]
    async fn get_file_returns_exact_content() {
        let manager = manager(MemoryStore::new().with_document("demo.json", DOC));
        let result = manager
            .handle_action(json!({"action": "get_file", "file_name": "demo.json"}))
            .await
            .expect("file");
        assert_eq!(result["content"], DOC);
        assert_eq!(result["document"]["item"][0]["name"], "A");
    }

    #[tokio::test]
    async fn get_file_rejects_unparseable_content() {
        let manager = manager(MemoryStore::new().with_document("bad.json", "{oops"));
        let err = manager
            .handle_action(json!({"action": "get_file", "file_name": "bad.json"}))
            .await
            .expect_err("must fail");
        assert_eq!(err.kind, ToolErrorKind::Internal);
    }

    #[tokio::test]
    async fn lock_entries_are_released_after_saves() {
        let manager = manager(MemoryStore::new().with_document("demo.json", DOC));
        for i in 0..50 {
            let _ = manager
                .handle_action(json!({
                    "action": "save_request",
                    "file_name": format!("missing-{}.json", i),
                    "request_name": "r",
                    "request": {}
                }))
                .await;
        }
        assert_eq!(manager.tracked_locks(), 0);

        let mut tasks = Vec::new();
        for i in 0..8 {
            let manager = manager.clone();
            tasks.push(tokio::spawn(async move {
                manager
                    .handle_action(json!({
                        "action": "save_request",
                        "file_name": "demo.json",
                        "collection_name": "A",
                        "request_name": "req1",
                        "request": {"v": i}
                    }))
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().expect("saved");
        }
        assert_eq!(manager.tracked_locks(), 0);
    }
}
