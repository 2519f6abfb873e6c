//! Error types for formkit configuration

use std::path::PathBuf;

use formkit_common::{ErrorSeverity, Severity};
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Explicit file has an extension we cannot parse
    #[error("Unsupported configuration file format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Configuration parsing failed
    #[error("Failed to parse configuration: {source}")]
    ParseError {
        #[from]
        source: figment::Error,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for key '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl Severity for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        // Nothing works without a usable configuration.
        ErrorSeverity::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_names_the_key() {
        let err = ConfigError::invalid_value("image.max_bytes", "must be greater than zero");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for key 'image.max_bytes': must be greater than zero"
        );
        assert!(err.is_critical());
    }
}
