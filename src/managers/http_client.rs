use crate::errors::ToolError;
use crate::models::RequestDescription;
use crate::services::executor::RequestExecutor;
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::utils::redact::redact_url;
use crate::utils::tool_errors::unknown_action_error;
use serde_json::Value;
use std::sync::Arc;

pub const HTTP_CLIENT_TOOL: &str = "http_client";
const HTTP_CLIENT_ACTIONS: &[&str] = &["execute"];

#[derive(Clone)]
pub struct HttpClientManager {
    logger: Logger,
    executor: Arc<RequestExecutor>,
}

impl HttpClientManager {
    pub fn new(logger: Logger, executor: Arc<RequestExecutor>) -> Self {
        Self {
            logger: logger.child("http_client"),
            executor,
        }
    }

    pub async fn handle_action(&self, args: Value) -> Result<Value, ToolError> {
        let action = args.get("action");
        match action.and_then(|v| v.as_str()).unwrap_or("") {
            "execute" => self.execute(&args).await,
            _ => Err(unknown_action_error(
                HTTP_CLIENT_TOOL,
                action,
                HTTP_CLIENT_ACTIONS,
            )),
        }
    }

    async fn execute(&self, args: &Value) -> Result<Value, ToolError> {
        let raw = args
            .get("request")
            .filter(|v| v.is_object())
            .ok_or_else(|| {
                ToolError::invalid_params("request must be an object")
                    .with_hint("Pass {\"url\": \"https://...\", \"method\": \"GET\"}")
            })?;
        let description: RequestDescription =
            serde_json::from_value(raw.clone()).map_err(|err| {
                ToolError::invalid_params(format!("request is not a valid description: {}", err))
            })?;

        let result = self.executor.execute(&description).await;
        let summary = serde_json::json!({
            "method": description.method,
            "url": redact_url(&description.url.raw),
            "auth": description.authentication.as_ref().map(|auth| auth.type_name()),
            "status_code": result.status_code,
            "response_time": result.response_time,
            "size": result.size,
        });
        if result.is_transport_failure() {
            self.logger.warn("request failed", Some(&summary));
        } else {
            self.logger.info("request executed", Some(&summary));
        }
        serde_json::to_value(&result).map_err(|err| ToolError::internal(err.to_string()))
    }
}

#[async_trait::async_trait]
impl ToolHandler for HttpClientManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        self.logger.debug("handle_action", args.get("action"));
        self.handle_action(args).await
    }
}
