pub mod collection_editor;
pub mod executor;
pub mod logger;
pub mod oauth2;
pub mod settings;
pub mod tool_executor;
pub mod validation;
