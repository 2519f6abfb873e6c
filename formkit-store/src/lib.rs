//! Persistent custom field definitions
//!
//! Users can extend a form with their own fields. Those definitions live
//! here, one list per entity type, behind the [`CustomFieldStore`] trait.
//! [`KeyValueCustomFieldStore`] implements it over a [`KeyValueBackend`],
//! either in memory or as one JSON file per entity type.

pub mod backend;
pub mod error;
pub mod store;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use error::{Result, StoreError};
pub use store::{
    storage_key, validate_entity_type, CustomField, CustomFieldStore, KeyValueCustomFieldStore,
    KEY_PREFIX,
};
