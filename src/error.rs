//! Error types for directory-service calls
//!
//! Failures are classified by recoverability:
//! - Retryable: network issues, timeouts
//! - NonRetryable: unknown identities, malformed payloads, configuration
//!
//! An empty result is not an error; callers get `Ok(vec![])`.

use thiserror::Error;

/// Failure of any directory-service call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    // Retryable errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Directory call timed out after {0} seconds")]
    Timeout(u64),

    // Non-retryable errors
    #[error("Identity not found: {0}")]
    NotFound(String),

    #[error("Invalid directory response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl DirectoryError {
    /// Returns true if repeating the call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DirectoryError::Network(_) | DirectoryError::Timeout(_))
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DirectoryError::Network(_) => "Check your connection and try again.",
            DirectoryError::Timeout(_) => "The directory took too long to answer. Try again.",
            DirectoryError::NotFound(_) => "The person may have left the company. Reload the chart.",
            DirectoryError::InvalidResponse(_) => "The directory data is malformed. Check the snapshot file.",
            DirectoryError::Io(_) => "Check file permissions and that the snapshot file exists.",
            DirectoryError::Configuration(_) => "Check your configuration in ~/.orgchart/config.json",
        }
    }
}

impl From<std::io::Error> for DirectoryError {
    fn from(err: std::io::Error) -> Self {
        DirectoryError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DirectoryError {
    fn from(err: serde_json::Error) -> Self {
        DirectoryError::InvalidResponse(err.to_string())
    }
}

/// Serializable record of the last failure, for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    pub operation: String,
    pub message: String,
    pub can_retry: bool,
    pub recovery_suggestion: String,
}

impl FailureReport {
    pub fn new(operation: &str, err: &DirectoryError) -> Self {
        FailureReport {
            operation: operation.to_string(),
            message: err.to_string(),
            can_retry: err.is_retryable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(DirectoryError::Network("reset".into()).is_retryable());
        assert!(DirectoryError::Timeout(30).is_retryable());
        assert!(!DirectoryError::NotFound("u1".into()).is_retryable());
        assert!(!DirectoryError::Configuration("no snapshot".into()).is_retryable());
    }

    #[test]
    fn test_failure_report_carries_suggestion() {
        let report = FailureReport::new("get_users", &DirectoryError::Timeout(5));
        assert_eq!(report.operation, "get_users");
        assert!(report.can_retry);
        assert!(report.message.contains("5 seconds"));
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("recoverySuggestion").is_some());
    }

    #[test]
    fn test_from_serde_error_is_invalid_response() {
        let err: DirectoryError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, DirectoryError::InvalidResponse(_)));
    }
}
