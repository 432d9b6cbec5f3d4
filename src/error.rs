//! Error types for Uplink

use thiserror::Error;

/// Result type alias for Uplink operations
pub type Result<T> = std::result::Result<T, UplinkError>;

/// Main error type for Uplink
#[derive(Error, Debug)]
pub enum UplinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected by collector: HTTP {0}")]
    Rejected(reqwest::StatusCode),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Identity error: {0}")]
    Identity(String),
}

impl UplinkError {
    /// Check if error is a transient delivery failure (file is retained and
    /// retried on a later sweep rather than surfaced as fatal)
    pub fn is_retryable(&self) -> bool {
        matches!(self, UplinkError::Http(_) | UplinkError::Rejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_failures_are_retryable_config_errors_are_not() {
        assert!(UplinkError::Rejected(reqwest::StatusCode::BAD_GATEWAY).is_retryable());
        assert!(!UplinkError::Config("bad".into()).is_retryable());
        assert!(!UplinkError::Identity("missing".into()).is_retryable());
    }
}
