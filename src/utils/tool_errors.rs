use crate::errors::ToolError;
use crate::utils::suggest::suggest;
use serde_json::Value;

pub fn unknown_action_error(tool: &str, action: Option<&Value>, known: &[&str]) -> ToolError {
    let action_name = action.and_then(|v| v.as_str()).unwrap_or("");
    let suggestions = suggest(action_name, known, 3);

    let mut hint = format!("Use one of: {}.", known.join(", "));
    if !suggestions.is_empty() {
        hint = format!("Did you mean: {}? {}", suggestions.join(", "), hint);
    }

    ToolError::invalid_params(format!("Unknown {} action: {}", tool, action_name))
        .with_hint(hint)
        .with_details(serde_json::json!({
            "known_actions": known,
            "did_you_mean": suggestions,
        }))
}
