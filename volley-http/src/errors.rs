//! HTTP error types

/// Error type for HTTP operations
///
/// Only transport failures are errors. A response with any status code,
/// including 5xx, is a successful send.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HttpError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl HttpError {
    /// Short label used to group failures in run metrics
    pub fn kind(&self) -> &'static str {
        match self {
            HttpError::Network(_) => "network",
            HttpError::Timeout(_) => "timeout",
            HttpError::Connect(_) => "connect",
            HttpError::InvalidUrl(_) => "invalid_url",
            HttpError::ClientBuild(_) => "client_build",
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            HttpError::Timeout(message)
        } else if err.is_connect() {
            HttpError::Connect(message)
        } else if err.is_builder() {
            HttpError::InvalidUrl(message)
        } else {
            HttpError::Network(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(HttpError::Timeout("slow".into()).kind(), "timeout");
        assert_eq!(HttpError::Connect("refused".into()).kind(), "connect");
        assert_eq!(HttpError::Network("reset".into()).kind(), "network");
        assert_eq!(HttpError::InvalidUrl("x".into()).kind(), "invalid_url");
    }
}
