//! Custom field store
//!
//! Custom fields are user-added descriptors, kept per entity type under the
//! key `customFields_<entityType>` as a JSON array. Every mutation reads the
//! current list, applies the change and persists the full list before
//! returning. Two writers racing on one entity type resolve as last writer
//! wins.

use std::path::PathBuf;

use async_trait::async_trait;
use formkit_fields::{FieldDescriptor, FieldsError, Rule};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ulid::Ulid;

use crate::backend::{FileBackend, KeyValueBackend, MemoryBackend};
use crate::error::{Result, StoreError};

/// Prefix of every storage key.
pub const KEY_PREFIX: &str = "customFields_";

/// A user-added descriptor bound to an entity type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomField {
    pub id: Ulid,
    pub entity_type: String,
    #[serde(flatten)]
    pub descriptor: FieldDescriptor,
}

impl CustomField {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Storage abstraction for custom fields, keyed by entity type
#[async_trait]
pub trait CustomFieldStore: Send + Sync {
    /// All custom fields of an entity type, in creation order
    async fn list(&self, entity_type: &str) -> Result<Vec<CustomField>>;

    /// Add a field, persist, and return the updated list
    async fn add(&self, entity_type: &str, descriptor: FieldDescriptor)
        -> Result<Vec<CustomField>>;

    /// Remove a field by name, persist, and return the updated list
    async fn remove(&self, entity_type: &str, name: &str) -> Result<Vec<CustomField>>;
}

/// Storage key for an entity type.
pub fn storage_key(entity_type: &str) -> String {
    format!("{KEY_PREFIX}{entity_type}")
}

/// Entity types end up in file names, so keep them to a safe alphabet.
pub fn validate_entity_type(entity_type: &str) -> Result<()> {
    let valid = !entity_type.is_empty()
        && !entity_type.starts_with('.')
        && entity_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidEntityType(entity_type.to_string()))
    }
}

/// [`CustomFieldStore`] over any [`KeyValueBackend`]
pub struct KeyValueCustomFieldStore<B> {
    backend: B,
}

impl KeyValueCustomFieldStore<MemoryBackend> {
    /// A store that lives only as long as this value
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }
}

impl KeyValueCustomFieldStore<FileBackend> {
    /// A store persisting one JSON file per entity type under `dir`
    pub fn in_directory(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileBackend::new(dir))
    }
}

impl<B: KeyValueBackend> KeyValueCustomFieldStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn load(&self, entity_type: &str) -> Result<Vec<CustomField>> {
        validate_entity_type(entity_type)?;
        let key = storage_key(entity_type);
        match self.backend.get(&key).await? {
            None => Ok(Vec::new()),
            Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Some(raw) => {
                serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt { key, source })
            }
        }
    }

    async fn persist(&self, entity_type: &str, fields: &[CustomField]) -> Result<()> {
        let json = serde_json::to_string(fields)?;
        self.backend.put(&storage_key(entity_type), &json).await
    }
}

#[async_trait]
impl<B: KeyValueBackend> CustomFieldStore for KeyValueCustomFieldStore<B> {
    async fn list(&self, entity_type: &str) -> Result<Vec<CustomField>> {
        self.load(entity_type).await
    }

    async fn add(
        &self,
        entity_type: &str,
        descriptor: FieldDescriptor,
    ) -> Result<Vec<CustomField>> {
        if descriptor.name.is_empty() {
            return Err(FieldsError::EmptyFieldName {
                label: descriptor.label,
            }
            .into());
        }
        // Refuse descriptors that would break schema compilation later.
        Rule::for_descriptor(&descriptor)?;

        let mut fields = self.load(entity_type).await?;
        if fields.iter().any(|f| f.name() == descriptor.name) {
            return Err(StoreError::DuplicateField {
                entity_type: entity_type.to_string(),
                name: descriptor.name,
            });
        }

        let field = CustomField {
            id: Ulid::new(),
            entity_type: entity_type.to_string(),
            descriptor: descriptor.into_custom(),
        };
        info!(entity_type, name = %field.name(), id = %field.id, "adding custom field");
        fields.push(field);
        self.persist(entity_type, &fields).await?;
        Ok(fields)
    }

    async fn remove(&self, entity_type: &str, name: &str) -> Result<Vec<CustomField>> {
        let mut fields = self.load(entity_type).await?;
        let before = fields.len();
        fields.retain(|f| f.name() != name);
        if fields.len() == before {
            debug!(entity_type, name, "no custom field to remove");
        } else {
            info!(entity_type, name, "removed custom field");
        }
        self.persist(entity_type, &fields).await?;
        Ok(fields)
    }
}
