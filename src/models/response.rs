//! Uniform result envelope returned by every tool operation.

use crate::error::{DbError, DbResult};
use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::Serialize;

const UNKNOWN_ERROR: &str = "Unknown error";

/// `{success, data, error, timestamp}` wrapper around an operation result.
///
/// A successful envelope never carries an error and a failed one never
/// carries data. Both keys are always serialized, as `null` when absent.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ToolResponse<T> {
    /// True when the operation completed
    pub success: bool,
    /// Operation payload, present only on success
    pub data: Option<T>,
    /// Human-readable failure description, present only on failure
    pub error: Option<String>,
    /// ISO-8601 (RFC 3339, UTC) time at which this response was built
    pub timestamp: String,
}

impl<T> ToolResponse<T> {
    /// Build an envelope, enforcing the success/data/error invariant.
    pub fn wrap(success: bool, data: Option<T>, error: Option<String>) -> Self {
        let (data, error) = if success {
            (data, None)
        } else {
            let message = error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            (None, Some(message))
        };

        Self {
            success,
            data,
            error,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }

    pub fn ok(data: T) -> Self {
        Self::wrap(true, Some(data), None)
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self::wrap(false, None, Some(message.into()))
    }

    pub fn from_error(err: &DbError) -> Self {
        Self::err(err.to_envelope_message())
    }

    pub fn from_result(result: DbResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::from_error(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::json;

    #[test]
    fn test_ok_envelope() {
        let response = ToolResponse::ok(json!({"tables": ["users"]}));
        assert!(response.success);
        assert!(response.error.is_none());
        assert_eq!(response.data, Some(json!({"tables": ["users"]})));
    }

    #[test]
    fn test_err_envelope() {
        let response: ToolResponse<()> = ToolResponse::err("boom");
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_wrap_drops_error_on_success() {
        let response = ToolResponse::wrap(true, Some(1), Some("ignored".to_string()));
        assert!(response.error.is_none());
        assert_eq!(response.data, Some(1));
    }

    #[test]
    fn test_wrap_drops_data_on_failure() {
        let response = ToolResponse::wrap(false, Some(1), Some("failed".to_string()));
        assert!(response.data.is_none());
        assert_eq!(response.error.as_deref(), Some("failed"));
    }

    #[test]
    fn test_failure_without_message_gets_generic_error() {
        let response: ToolResponse<u8> = ToolResponse::wrap(false, None, None);
        assert_eq!(response.error.as_deref(), Some(UNKNOWN_ERROR));

        let response: ToolResponse<u8> = ToolResponse::wrap(false, None, Some("  ".to_string()));
        assert_eq!(response.error.as_deref(), Some(UNKNOWN_ERROR));
    }

    #[test]
    fn test_timestamp_is_rfc3339_utc() {
        let response = ToolResponse::ok(());
        assert!(response.timestamp.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&response.timestamp).is_ok());
    }

    #[test]
    fn test_serializes_all_keys() {
        let response: ToolResponse<u8> = ToolResponse::err("nope");
        let value = serde_json::to_value(&response).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(obj["success"], json!(false));
        assert_eq!(obj["data"], json!(null));
        assert_eq!(obj["error"], json!("nope"));
    }

    #[test]
    fn test_from_result_uses_envelope_message() {
        let result: DbResult<u8> = Err(DbError::connection("refused", "Is MySQL running?"));
        let response = ToolResponse::from_result(result);
        assert_eq!(
            response.error.as_deref(),
            Some("Connection failed: refused. Is MySQL running?")
        );
    }
}
