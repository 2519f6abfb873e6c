//! Declarative field descriptors and the pure functions derived from them
//!
//! `formkit-fields` owns the descriptor model and everything that can be
//! computed from a descriptor list without I/O. It knows nothing about where
//! descriptors come from or where values go.
//!
//! # Architecture
//!
//! - **Descriptor model**: [`FieldDescriptor`] with a closed [`FieldKind`] sum type
//! - **Schema compiler**: [`compile`] turns descriptors into a [`ValidationSchema`]
//! - **Default deriver**: [`derive`] builds the baseline [`ValueMap`]
//! - **Section classifier**: [`classify`] buckets descriptors for presentation
//! - **Loader**: YAML/JSON documents into descriptor lists

pub mod defaults;
pub mod error;
pub mod file_value;
pub mod loader;
pub mod schema;
pub mod sections;
pub mod types;

pub use defaults::derive;
pub use error::{
    FieldError, FieldErrorKind, FieldsError, FileConstraintError, Result, ValidationErrors,
};
pub use file_value::{mime_accepted, DataUrl};
pub use loader::{
    descriptors_from_value, load_descriptors, load_descriptors_json, load_descriptors_yaml,
    DescriptorFormat,
};
pub use schema::{compile, Rule, ValidationSchema};
pub use sections::{classify, Sections};
pub use types::{
    ChoiceOption, FieldDescriptor, FieldKind, FieldOrigin, LayoutWidth, OverrideRule, Section,
    ValueMap, DEFAULT_FILE_MAX_BYTES,
};
