//! Uniform success/failure envelope returned by every tool.
//!
//! Success serializes as `{"success": true, ...payload}`; failure as
//! `{"success": false, "error": "...", "error_type": "..."}`.

use crate::error::{BqError, BqResult};
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ToolResponse<T> {
    /// False when the call failed; inspect `error` and `error_type` then
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure category: engine reason (e.g. invalidQuery, notFound) or ConfigurationError, Timeout, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl<T> ToolResponse<T> {
    /// Wrap a successful payload.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_type: None,
        }
    }

    /// Describe a failure.
    pub fn failure(err: &BqError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            error_type: Some(err.error_type().to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl<T> From<BqResult<T>> for ToolResponse<T> {
    fn from(result: BqResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::failure(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize, JsonSchema)]
    struct Payload {
        count: usize,
    }

    #[test]
    fn test_success_flattens_payload() {
        let response = ToolResponse::ok(Payload { count: 2 });
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({ "success": true, "count": 2 }));
    }

    #[test]
    fn test_failure_shape() {
        let err = BqError::engine("Not found: Table p:d.t", "notFound", Some(404));
        let response: ToolResponse<Payload> = Err(err).into();
        assert!(!response.is_success());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "success": false,
                "error": "Not found: Table p:d.t",
                "error_type": "notFound"
            })
        );
    }

    #[test]
    fn test_configuration_failure_shape() {
        let response: ToolResponse<Payload> =
            ToolResponse::failure(&BqError::configuration("project missing"));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error_type"], "ConfigurationError");
        assert!(value.get("count").is_none());
    }
}
