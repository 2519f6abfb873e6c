//! Remote form metadata
//!
//! Some deployments describe extra fields server-side. A [`CustomFormSource`]
//! supplies them per entity type; the engine merges them like stored custom
//! fields.

use std::collections::HashMap;

use async_trait::async_trait;
use formkit_fields::FieldDescriptor;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SourceError {
    pub message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Supplies additional descriptors for an entity type
#[async_trait]
pub trait CustomFormSource: Send + Sync {
    async fn descriptors(&self, entity_type: &str) -> Result<Vec<FieldDescriptor>, SourceError>;
}

/// A fixed set of descriptors per entity type, e.g. loaded from a file
#[derive(Debug, Clone, Default)]
pub struct StaticFormSource {
    forms: HashMap<String, Vec<FieldDescriptor>>,
}

impl StaticFormSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form(
        mut self,
        entity_type: impl Into<String>,
        descriptors: Vec<FieldDescriptor>,
    ) -> Self {
        self.forms.insert(entity_type.into(), descriptors);
        self
    }
}

#[async_trait]
impl CustomFormSource for StaticFormSource {
    async fn descriptors(&self, entity_type: &str) -> Result<Vec<FieldDescriptor>, SourceError> {
        Ok(self.forms.get(entity_type).cloned().unwrap_or_default())
    }
}
