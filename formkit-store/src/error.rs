//! Error types for custom field storage

use formkit_common::{ErrorSeverity, Severity};
use formkit_fields::FieldsError;
use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in custom field store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// A field with this name already exists for the entity type
    #[error("custom field '{name}' already exists for entity type '{entity_type}'")]
    DuplicateField { entity_type: String, name: String },

    /// Entity type cannot be used as a storage key
    #[error("invalid entity type: '{0}'")]
    InvalidEntityType(String),

    /// Descriptor would not compile
    #[error("invalid custom field: {0}")]
    InvalidField(#[from] FieldsError),

    /// Stored value under a key is not a valid custom field list
    #[error("stored custom fields under '{key}' are corrupt: {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Severity for StoreError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            StoreError::DuplicateField { .. } => ErrorSeverity::Warning,
            StoreError::InvalidEntityType(_) => ErrorSeverity::Error,
            StoreError::InvalidField(err) => err.severity(),
            StoreError::Corrupt { .. } | StoreError::Io(_) | StoreError::Json(_) => {
                ErrorSeverity::Critical
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::DuplicateField {
            entity_type: "inventory-item".into(),
            name: "colour".into(),
        };
        assert_eq!(
            err.to_string(),
            "custom field 'colour' already exists for entity type 'inventory-item'"
        );
        assert_eq!(err.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_io_is_critical() {
        let err = StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(err.is_critical());
    }
}
