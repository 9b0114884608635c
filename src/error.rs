// src/error.rs
use thiserror::Error;

/// Errors surfaced by the sniper. Only `Configuration` is ever fatal; the
/// rest are absorbed at the component boundary and turned into "no data".
#[derive(Error, Debug)]
pub enum SniperError {
    #[error("network error: {0}")]
    TransientNetwork(String),

    #[error("malformed upstream data from {source_name}: {message}")]
    MalformedUpstream { source_name: String, message: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("chain error: {0}")]
    Chain(String),
}

impl SniperError {
    pub fn malformed(source_name: &str, message: impl Into<String>) -> Self {
        Self::MalformedUpstream {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    /// Network hiccups are worth another attempt; everything else is final.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetwork(_))
    }
}

impl From<reqwest::Error> for SniperError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::malformed("http", err.to_string())
        } else {
            Self::TransientNetwork(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SniperError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed("json", err.to_string())
    }
}

impl From<config::ConfigError> for SniperError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

pub type SniperResult<T> = std::result::Result<T, SniperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_errors_are_transient() {
        assert!(SniperError::TransientNetwork("timeout".into()).is_transient());
        assert!(!SniperError::malformed("raydium", "missing data").is_transient());
        assert!(!SniperError::Configuration("no rpc".into()).is_transient());
    }

    #[test]
    fn malformed_error_names_its_source() {
        let err = SniperError::malformed("solscan", "expected array");
        assert_eq!(
            err.to_string(),
            "malformed upstream data from solscan: expected array"
        );
    }
}
