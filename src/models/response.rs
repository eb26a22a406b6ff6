use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalized outcome of one execution. `status_code == 0` means no
/// response was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub response_time: u64,
    pub size: usize,
}

impl ExecutionResult {
    pub fn new(
        status_code: u16,
        headers: BTreeMap<String, String>,
        body: String,
        response_time: u64,
    ) -> Self {
        let size = body.len();
        Self {
            status_code,
            headers,
            body,
            response_time,
            size,
        }
    }

    pub fn transport_failure(message: impl std::fmt::Display, response_time: u64) -> Self {
        Self {
            status_code: 0,
            headers: BTreeMap::new(),
            body: format!("Request failed: {}", message),
            response_time,
            size: 0,
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        self.status_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_counts_utf8_bytes() {
        let result = ExecutionResult::new(200, BTreeMap::new(), "café".to_string(), 3);
        assert_eq!(result.size, 5);
    }

    #[test]
    fn serializes_with_frontend_field_names() {
        let result = ExecutionResult::transport_failure("dns error", 7);
        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(value["statusCode"], 0);
        assert_eq!(value["responseTime"], 7);
        assert_eq!(value["size"], 0);
        assert_eq!(value["body"], "Request failed: dns error");
        assert!(value["headers"].as_object().expect("headers").is_empty());
    }
}
