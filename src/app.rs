use crate::errors::ToolError;
use crate::managers;
use crate::mcp::catalog::tool_catalog;
use crate::services::executor::RequestExecutor;
use crate::services::logger::Logger;
use crate::services::settings::Settings;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::validation::Validation;
use crate::stores::{DirectoryStore, DocumentStore};
use std::collections::HashMap;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub settings: Settings,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    fn validate_tool_wiring(
        handlers: &HashMap<String, Arc<dyn ToolHandler>>,
    ) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint("Every tool in tool_catalog.json must have a handler.")
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    pub fn initialize() -> Result<Self, ToolError> {
        Self::with_settings(Settings::from_env()?)
    }

    pub fn with_settings(settings: Settings) -> Result<Self, ToolError> {
        let store = Arc::new(DirectoryStore::new(settings.storage_dir.clone()));
        Self::with_parts(Logger::new("courier"), settings, store)
    }

    pub fn with_parts(
        logger: Logger,
        settings: Settings,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self, ToolError> {
        let validation = Validation::new();
        let client = settings.build_http_client()?;
        let executor = Arc::new(RequestExecutor::new(logger.clone(), client));

        let http_client_manager = Arc::new(managers::http_client::HttpClientManager::new(
            logger.clone(),
            executor,
        ));
        let collections_manager = Arc::new(managers::collections::CollectionsManager::new(
            logger.clone(),
            validation,
            store,
        ));

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert(
            managers::http_client::HTTP_CLIENT_TOOL.to_string(),
            http_client_manager,
        );
        handlers.insert(
            managers::collections::COLLECTIONS_TOOL.to_string(),
            collections_manager,
        );

        Self::validate_tool_wiring(&handlers)?;

        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));
        Ok(Self {
            logger,
            settings,
            tool_executor,
        })
    }
}
