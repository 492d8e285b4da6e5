use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum FeedError {
    /// Remote call exceeded its deadline
    #[error("Timeout Error: {0}")]
    Timeout(String),

    /// Source signalled temporary unavailability (429/502/503/504)
    #[error("Source Unavailable: {0}")]
    Unavailable(String),

    /// Network/connectivity issues
    #[error("Network Error: {0}")]
    Network(String),

    /// Parsing errors for source records
    #[error("Parse Error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Config Error: {0}")]
    Config(String),

    /// Invalid input parameters
    #[error("Invalid Input: {0}")]
    InvalidInput(String),

    /// Unknown/unclassified errors
    #[error("Unknown Error: {0}")]
    Unknown(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Parse(format!("JSON serialization/deserialization error: {}", err))
    }
}

impl From<anyhow::Error> for FeedError {
    fn from(err: anyhow::Error) -> Self {
        FeedError::Unknown(err.to_string())
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(err.to_string())
        } else if err.is_decode() {
            FeedError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                429 | 502 | 503 | 504 => FeedError::Unavailable(err.to_string()),
                _ => FeedError::Network(err.to_string()),
            }
        } else {
            FeedError::Network(err.to_string())
        }
    }
}

impl FeedError {
    /// Classification is conservative: only errors recognizable as transient
    /// qualify, everything else fails fast to the fallback path.
    pub fn is_transient(&self) -> bool {
        matches!(self, FeedError::Timeout(_) | FeedError::Unavailable(_))
    }

    /// Determines if the operation should be retried
    pub fn should_retry(&self) -> bool {
        self.is_transient()
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FeedError::Timeout("deadline".to_string()).should_retry());
        assert!(FeedError::Unavailable("503".to_string()).should_retry());

        assert!(!FeedError::Network("connection refused".to_string()).should_retry());
        assert!(!FeedError::Parse("bad json".to_string()).should_retry());
        assert!(!FeedError::Config("missing url".to_string()).should_retry());
        assert!(!FeedError::InvalidInput("page_size".to_string()).should_retry());
        assert!(!FeedError::Unknown("?".to_string()).should_retry());
    }

    #[test]
    fn test_serde_error_maps_to_parse() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(FeedError::from(err), FeedError::Parse(_)));
    }
}
