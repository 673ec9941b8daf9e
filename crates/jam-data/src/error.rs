//! HTTP client error types.

use thiserror::Error;

/// Errors that can occur when making HTTP requests.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Failed to send the request (connection refused, reset, DNS).
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Invalid URL or request that could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP error response.
    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    /// Failed to parse response body.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Request timeout.
    #[error("Request timed out")]
    Timeout,

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl FetchError {
    /// Whether the same request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::RequestError(_) | FetchError::Timeout => true,
            FetchError::HttpError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::JsonError(e.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_builder() {
            FetchError::InvalidUrl(e.to_string())
        } else if e.is_decode() {
            FetchError::ParseError(e.to_string())
        } else {
            FetchError::RequestError(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::RequestError("refused".into()).is_retryable());
        assert!(FetchError::HttpError { status: 503, message: String::new() }.is_retryable());
        assert!(FetchError::HttpError { status: 429, message: String::new() }.is_retryable());
        assert!(!FetchError::HttpError { status: 404, message: String::new() }.is_retryable());
        assert!(!FetchError::ParseError("bad".into()).is_retryable());
    }

    #[test]
    fn test_status() {
        let err = FetchError::HttpError { status: 422, message: "nope".into() };
        assert_eq!(err.status(), Some(422));
        assert_eq!(FetchError::Timeout.status(), None);
        assert_eq!(err.to_string(), "HTTP 422: nope");
    }
}
