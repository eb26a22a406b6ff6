use crate::errors::ToolError;
use serde_json::Value;
use std::path::{Component, Path};

#[derive(Clone, Default)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(
        &self,
        value: &Value,
        label: &str,
        trim: bool,
    ) -> Result<String, ToolError> {
        let text = value.as_str().ok_or_else(|| {
            ToolError::invalid_params(format!("{} must be a non-empty string", label))
        })?;
        let normalized = text.trim();
        if normalized.is_empty() {
            return Err(ToolError::invalid_params(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(if trim {
            normalized.to_string()
        } else {
            text.to_string()
        })
    }

    /// Absent, null and empty strings all mean "not given".
    pub fn ensure_optional_string(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<String>, ToolError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) if text.is_empty() => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.clone())),
            Some(_) => Err(ToolError::invalid_params(format!(
                "{} must be a string when provided",
                label
            ))),
        }
    }

    /// A file name is a relative path that stays inside the storage root.
    pub fn ensure_file_name(&self, value: Option<&Value>) -> Result<String, ToolError> {
        let value = value.ok_or_else(|| ToolError::invalid_params("file_name is required"))?;
        let name = self.ensure_string(value, "file_name", true)?;
        let escapes = Path::new(&name)
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
        if escapes {
            return Err(ToolError::invalid_params(
                "file_name must be relative to the storage directory",
            )
            .with_hint("Use a plain name such as \"demo.json\"")
            .with_details(serde_json::json!({ "file_name": name })));
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_names_stay_inside_root() {
        let validation = Validation::new();
        assert_eq!(
            validation.ensure_file_name(Some(&json!(" demo.json "))).unwrap(),
            "demo.json"
        );
        assert_eq!(
            validation.ensure_file_name(Some(&json!("team/api.json"))).unwrap(),
            "team/api.json"
        );
        for bad in ["../etc/passwd", "/abs.json", "a/../../b.json", "./x.json", "  "] {
            let err = validation
                .ensure_file_name(Some(&json!(bad)))
                .expect_err(bad);
            assert_eq!(err.code, "INVALID_PARAMS", "{}", bad);
        }
        assert!(validation.ensure_file_name(None).is_err());
    }

    #[test]
    fn optional_strings_treat_empty_as_absent() {
        let validation = Validation::new();
        assert_eq!(validation.ensure_optional_string(None, "x").unwrap(), None);
        assert_eq!(
            validation.ensure_optional_string(Some(&json!("")), "x").unwrap(),
            None
        );
        assert_eq!(
            validation.ensure_optional_string(Some(&json!("A")), "x").unwrap(),
            Some("A".to_string())
        );
        assert!(validation.ensure_optional_string(Some(&json!(3)), "x").is_err());
    }
}
