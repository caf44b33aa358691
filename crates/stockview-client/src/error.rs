//! Error types for analysis requests

use std::error::Error as StdError;
use thiserror::Error;

/// Message shown when a 2xx reply does not satisfy the success contract
pub const UNEXPECTED_RESPONSE: &str = "Unexpected API response";

/// Everything that can end a submission in the `Failed` state
///
/// The `Display` text of each variant is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Symbol was empty after trimming; no request was sent
    #[error("Please enter a stock symbol.")]
    EmptySymbol,

    /// Assistant question was empty after trimming; no request was sent
    #[error("Please enter a question.")]
    EmptyQuestion,

    /// Network-level failure (connection refused, DNS, timeout)
    #[error("{0}")]
    Transport(String),

    /// Non-2xx reply
    #[error("{message}")]
    HttpStatus { status: u16, message: String },

    /// 2xx reply whose envelope breaks the success contract
    #[error("{0}")]
    Protocol(String),

    /// Analysis mode text that names neither supported mode
    #[error("Unknown analysis mode: {0} (expected 'complete' or 'news')")]
    UnknownMode(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    /// Validation errors raised before any network traffic
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            AnalysisError::EmptySymbol | AnalysisError::EmptyQuestion
        )
    }

    /// HTTP status code for `HttpStatus` errors
    pub fn status(&self) -> Option<u16> {
        match self {
            AnalysisError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// reqwest keeps the useful part ("Connection refused") in the source chain
impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        AnalysisError::Transport(message)
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Protocol(format!("JSON error: {err}"))
    }
}

impl From<url::ParseError> for AnalysisError {
    fn from(err: url::ParseError) -> Self {
        AnalysisError::Config(format!("Invalid API URL: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AnalysisError::EmptySymbol.to_string(),
            "Please enter a stock symbol."
        );

        let err = AnalysisError::HttpStatus {
            status: 500,
            message: "server overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "server overloaded");
        assert_eq!(err.status(), Some(500));

        let err = AnalysisError::Protocol(UNEXPECTED_RESPONSE.to_string());
        assert_eq!(err.to_string(), "Unexpected API response");
    }

    #[test]
    fn test_is_local() {
        assert!(AnalysisError::EmptySymbol.is_local());
        assert!(AnalysisError::EmptyQuestion.is_local());
        assert!(!AnalysisError::Transport("refused".to_string()).is_local());
    }

    #[test]
    fn test_reqwest_error_conversion() {
        let err = reqwest::Client::new().get("not a url").build().unwrap_err();
        let err: AnalysisError = err.into();
        assert!(matches!(err, AnalysisError::Transport(ref msg) if !msg.is_empty()));
    }

    #[test]
    fn test_url_error_conversion() {
        let err = url::Url::parse("::nope").unwrap_err();
        let err: AnalysisError = err.into();
        assert!(err.to_string().starts_with("Configuration error: Invalid API URL"));
    }
}
