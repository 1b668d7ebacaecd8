//! Error types for pagelens
//!
//! Structured error definitions via thiserror, with anyhow available as an
//! escape hatch in the binary. Expected anchoring failures (no candidate
//! matched, a range could not be wrapped) are not errors: the engine reports
//! them through its boolean/Option surface.

use thiserror::Error;

/// Main error type for pagelens operations
#[derive(Error, Debug)]
pub enum PagelensError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// LLM API request failed or was misconfigured
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Malformed or unsupported URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A transcript could not be located for a video
    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for pagelens operations
pub type Result<T> = std::result::Result<T, PagelensError>;

impl From<url::ParseError> for PagelensError {
    fn from(err: url::ParseError) -> Self {
        PagelensError::InvalidUrl(err.to_string())
    }
}

/// Convert anyhow::Error to PagelensError
impl From<anyhow::Error> for PagelensError {
    fn from(err: anyhow::Error) -> Self {
        PagelensError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PagelensError::NotFound("no price history".to_string());
        assert_eq!(err.to_string(), "Not found: no price history");
    }

    #[test]
    fn test_url_error_conversion() {
        let parse_err = url::Url::parse("not a url").unwrap_err();
        let err: PagelensError = parse_err.into();
        assert!(matches!(err, PagelensError::InvalidUrl(_)));
    }
}
