//! Error types for the form engine

use formkit_common::{ErrorSeverity, Severity};
use formkit_config::ConfigError;
use formkit_fields::{FieldsError, ValidationErrors};
use formkit_image::ImageError;
use formkit_store::StoreError;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by [`crate::FormEngine`]
#[derive(Debug, Error)]
pub enum EngineError {
    /// The merged descriptor set does not compile
    #[error("form configuration error: {0}")]
    Configuration(#[from] FieldsError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// One or more fields failed validation; values are kept
    #[error("{0}")]
    Invalid(ValidationErrors),

    /// The submit handler rejected the payload; values are kept
    #[error("{message}")]
    Submission { message: String },

    /// The remote metadata source failed
    #[error("failed to fetch form metadata for '{entity_type}': {message}")]
    Source {
        entity_type: String,
        message: String,
    },

    #[error("unknown field: '{0}'")]
    UnknownField(String),

    #[error("field '{0}' is not a file field")]
    NotAFileField(String),

    #[error("no submit handler configured")]
    MissingSubmitHandler,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("image normalization failed: {0}")]
    Image(#[from] ImageError),

    /// A blocking task panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Per-field errors when this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            EngineError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

impl Severity for EngineError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            EngineError::Configuration(err) => err.severity(),
            EngineError::Config(err) => err.severity(),
            EngineError::Store(err) => err.severity(),
            EngineError::Image(err) => err.severity(),
            EngineError::Invalid(_)
            | EngineError::UnknownField(_)
            | EngineError::NotAFileField(_) => ErrorSeverity::Warning,
            EngineError::Submission { .. } | EngineError::Source { .. } => ErrorSeverity::Error,
            EngineError::MissingSubmitHandler | EngineError::Task(_) | EngineError::Json(_) => {
                ErrorSeverity::Critical
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_message_is_verbatim() {
        let err = EngineError::Submission {
            message: "SKU already exists".into(),
        };
        assert_eq!(err.to_string(), "SKU already exists");
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn configuration_errors_are_critical() {
        let err = EngineError::from(FieldsError::DuplicateFieldName {
            name: "price".into(),
        });
        assert!(err.is_critical());
        assert!(err.validation_errors().is_none());
    }
}
