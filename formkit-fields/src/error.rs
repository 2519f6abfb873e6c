//! Error types for descriptor compilation and value validation
//!
//! [`FieldsError`] covers configuration defects that stop a schema from being
//! built. [`FieldError`] is the per-field, user-recoverable outcome of
//! validating a value, and [`ValidationErrors`] collects them for a whole form.

use formkit_common::{ErrorSeverity, Severity};
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

/// Result type for descriptor operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Configuration errors raised while loading or compiling descriptors
#[derive(Debug, Error)]
pub enum FieldsError {
    /// Two descriptors share a name
    #[error("duplicate field name: {name}")]
    DuplicateFieldName { name: String },

    /// A descriptor has an empty name
    #[error("field name cannot be empty (label: '{label}')")]
    EmptyFieldName { label: String },

    /// A serialized descriptor names a kind outside the closed set
    #[error("unknown field kind '{kind}' on field '{field}'")]
    UnknownKind { field: String, kind: String },

    /// A built-in field uses a name the submission payload reserves
    #[error("field name '{name}' is reserved")]
    ReservedFieldName { name: String },

    /// An override rule cannot be compiled
    #[error("invalid override rule on field '{field}': {message}")]
    InvalidOverride { field: String, message: String },

    /// A descriptor document has the wrong shape
    #[error("invalid descriptor document: {message}")]
    InvalidDocument { message: String },

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Severity for FieldsError {
    fn severity(&self) -> ErrorSeverity {
        // Every variant is a caller defect in the descriptor set.
        ErrorSeverity::Critical
    }
}

/// Why a file value was rejected
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum FileConstraintError {
    #[error("file type '{mime}' is not accepted (allowed: {})", .accepted.join(", "))]
    UnacceptedType { mime: String, accepted: Vec<String> },

    #[error("file is {size} bytes, over the {max_bytes} byte limit")]
    TooLarge { size: u64, max_bytes: u64 },

    #[error("file payload is malformed: {detail}")]
    Malformed { detail: String },
}

/// What went wrong with a single value
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldErrorKind {
    #[error("{message}")]
    Invalid { message: String },

    #[error(transparent)]
    File(#[from] FileConstraintError),
}

impl FieldErrorKind {
    pub fn invalid(message: impl Into<String>) -> Self {
        FieldErrorKind::Invalid {
            message: message.into(),
        }
    }

    pub fn is_file_constraint(&self) -> bool {
        matches!(self, FieldErrorKind::File(_))
    }
}

/// A validation failure attached to one field
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{field}: {kind}")]
pub struct FieldError {
    pub field: String,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn new(field: impl Into<String>, kind: FieldErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

impl Severity for FieldError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }
}

/// Per-field failures from validating a whole value map, in descriptor order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(IndexMap<String, FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, error: FieldError) {
        self.0.insert(error.field.clone(), error);
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldError> {
        self.0.shift_remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|name, _| keep(name));
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.values()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} field(s) failed validation", self.0.len())?;
        for error in self.0.values() {
            write!(f, "; {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl Severity for ValidationErrors {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FieldsError::DuplicateFieldName {
            name: "price".into(),
        };
        assert_eq!(err.to_string(), "duplicate field name: price");
        assert!(err.is_critical());
    }

    #[test]
    fn test_file_constraint_display() {
        let err = FileConstraintError::UnacceptedType {
            mime: "application/zip".into(),
            accepted: vec!["image/*".into(), ".pdf".into()],
        };
        assert_eq!(
            err.to_string(),
            "file type 'application/zip' is not accepted (allowed: image/*, .pdf)"
        );
    }

    #[test]
    fn test_validation_errors_keep_insertion_order() {
        let mut errors = ValidationErrors::new();
        errors.insert(FieldError::new("b", FieldErrorKind::invalid("is required")));
        errors.insert(FieldError::new("a", FieldErrorKind::invalid("is required")));
        let names: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(errors.to_string().starts_with("2 field(s) failed validation"));
    }

    #[test]
    fn test_field_error_serializes_reason() {
        let err = FieldError::new(
            "photo",
            FileConstraintError::TooLarge {
                size: 10,
                max_bytes: 5,
            }
            .into(),
        );
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"]["type"], "file");
        assert_eq!(json["kind"]["reason"], "too-large");
    }
}
