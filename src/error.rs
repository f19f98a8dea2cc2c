//! Error Types
//!
//! Shared error type for the deployment tooling. Most failures here are
//! precondition failures (a file that should exist, a required environment
//! variable, a non-200 API response) that the console tools report and then
//! exit nonzero.

use thiserror::Error;

/// Errors produced by the deployment and data-staging tooling.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Missing or invalid environment configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A precondition or input validation failure.
    #[error("{0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A service responded with a non-success status.
    #[error("{context}: HTTP {status}: {body}")]
    Api {
        context: String,
        status: u16,
        body: String,
    },

    /// An external tool exited with a nonzero status.
    #[error("{tool} exited with status {status}")]
    ToolFailed { tool: String, status: i32 },
}

impl DeployError {
    /// Creates a configuration error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates an API error from a response context.
    pub fn api(context: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            context: context.into(),
            status,
            body: body.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = DeployError::validation("manifest argument is required");
        assert_eq!(err.to_string(), "manifest argument is required");
    }

    #[test]
    fn test_api_display() {
        let err = DeployError::api("triggering DAG", 403, "forbidden");
        assert_eq!(err.to_string(), "triggering DAG: HTTP 403: forbidden");
    }

    #[test]
    fn test_tool_failed_display() {
        let err = DeployError::ToolFailed {
            tool: "cwltool".to_string(),
            status: 2,
        };
        assert_eq!(err.to_string(), "cwltool exited with status 2");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DeployError = io.into();
        assert!(matches!(err, DeployError::Io(_)));
    }
}
