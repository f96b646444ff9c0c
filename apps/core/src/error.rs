use thiserror::Error;

/// Application-wide error type, consolidating all possible errors into a single enum.
///
/// The detection and routing core never produces these; they come from the
/// collaborators around it (input validation, HTTP services, configuration).
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Represents data validation errors (e.g., empty or oversized input).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Represents configuration-related errors (e.g., malformed environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Represents transport-level failures talking to an HTTP service.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Represents errors reported by the language-model backend.
    #[error("LLM request failed: {0}")]
    Llm(String),

    /// Represents unexpected internal errors that indicate a bug.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Represents errors from operations that did not complete in time.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Represents an error indicating that a rate limit has been exceeded.
    #[error("Rate limit exceeded ({count}/{limit})")]
    RateLimited {
        count: u32,
        limit: u32,
        /// Epoch milliseconds at which a slot frees up, when known
        reset_time: Option<i64>,
    },
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout(format!("Operation timed out: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON error: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("URL parse error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation errors: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(format!("HTTP request timed out: {}", err))
        } else {
            AppError::Http(err.to_string())
        }
    }
}
