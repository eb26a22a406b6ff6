use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::utils::suggest::suggest;

use serde_json::Value;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, args: Value) -> Result<Value, ToolError>;
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    fn strip_args_for_handler(&self, args: &Value) -> Value {
        let mut cleaned = args.clone();
        if let Value::Object(map) = &mut cleaned {
            map.remove("trace_id");
        }
        cleaned
    }

    /// Runs one tool call and wraps the handler's value as
    /// `{ok, result, meta}`.
    pub async fn execute(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        let started_at = chrono::Utc::now().timestamp_millis();
        let Some(handler) = self.handlers.get(tool) else {
            let candidates: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
            let suggestions = suggest(tool, &candidates, 6);
            let hint = if suggestions.is_empty() {
                "Call tools/list to see available tools".to_string()
            } else {
                format!("Did you mean: {}", suggestions.join(", "))
            };
            return Err(
                ToolError::invalid_params(format!("Unknown tool: {}", tool)).with_hint(hint)
            );
        };
        let trace_id = args
            .get("trace_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        self.logger.debug(tool, args.get("action"));

        let result = match handler.handle(self.strip_args_for_handler(&args)).await {
            Ok(result) => result,
            Err(err) => {
                self.logger.warn(
                    "tool call failed",
                    Some(&serde_json::json!({
                        "tool": tool,
                        "action": args.get("action"),
                        "trace_id": trace_id,
                        "code": err.code,
                        "message": err.message,
                    })),
                );
                return Err(err);
            }
        };

        Ok(serde_json::json!({
            "ok": true,
            "result": result,
            "meta": {
                "tool": tool,
                "action": args.get("action").cloned().unwrap_or(Value::Null),
                "trace_id": trace_id,
                "duration_ms": chrono::Utc::now().timestamp_millis() - started_at,
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn handle(&self, args: Value) -> Result<Value, ToolError> {
            Ok(args)
        }
    }

    fn executor() -> ToolExecutor {
        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert("collections".to_string(), Arc::new(Echo));
        ToolExecutor::new(Logger::capturing("test").0, handlers)
    }

    #[tokio::test]
    async fn wraps_result_and_keeps_caller_trace_id() {
        let out = executor()
            .execute(
                "collections",
                json!({"action": "list_files", "trace_id": "t-1"}),
            )
            .await
            .expect("ok");
        assert_eq!(out["ok"], true);
        assert_eq!(out["meta"]["trace_id"], "t-1");
        assert_eq!(out["meta"]["action"], "list_files");
        assert!(out["result"].get("trace_id").is_none());
    }

    #[tokio::test]
    async fn unknown_tool_suggests_close_names() {
        let err = executor()
            .execute("colections", json!({}))
            .await
            .expect_err("must fail");
        assert_eq!(err.code, "INVALID_PARAMS");
        assert!(err.hint.unwrap().contains("collections"));
    }
}
