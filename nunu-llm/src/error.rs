//! LLM error types.

use thiserror::Error;

/// Errors that can occur during a generation call.
///
/// Every variant is a hard failure of the whole call. Malformed individual
/// stream frames are not errors; the aggregator skips them.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed, or the body broke off mid-stream.
    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    /// The backend answered with a non-success status.
    #[error("LLM backend returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// Request timed out.
    #[error("LLM request timed out after {0}ms")]
    Timeout(u64),

    /// LLM provider is unavailable (not configured or connection refused).
    #[error("LLM provider unavailable: {0}")]
    Unavailable(String),

    /// Configuration error.
    #[error("LLM configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// Classify a transport error, recording the timeout that was in force.
    #[must_use]
    pub fn from_transport(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(timeout_ms)
        } else {
            LlmError::from(err)
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else if err.is_connect() {
            LlmError::Unavailable(err.to_string())
        } else if let Some(status) = err.status() {
            LlmError::Status {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}
