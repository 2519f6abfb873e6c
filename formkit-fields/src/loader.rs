//! Loading descriptor sets from YAML or JSON documents.
//!
//! A document is either a sequence of descriptors or a mapping with a
//! `fields` sequence. Kind tags are checked against the closed set before
//! deserializing so an unknown kind is reported with the field it sits on.

use std::path::Path;

use serde_json::Value;

use crate::error::{FieldsError, Result};
use crate::types::{FieldDescriptor, FieldKind};

/// Document formats a descriptor set can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Yaml,
    Json,
}

impl DescriptorFormat {
    /// Detect format from a file extension; anything but `.json` is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DescriptorFormat::Json,
            _ => DescriptorFormat::Yaml,
        }
    }
}

/// Parse a descriptor document in the given format.
pub fn load_descriptors(text: &str, format: DescriptorFormat) -> Result<Vec<FieldDescriptor>> {
    let document: Value = match format {
        DescriptorFormat::Yaml => serde_yaml_ng::from_str(text)?,
        DescriptorFormat::Json => serde_json::from_str(text)?,
    };
    descriptors_from_value(document)
}

pub fn load_descriptors_yaml(text: &str) -> Result<Vec<FieldDescriptor>> {
    load_descriptors(text, DescriptorFormat::Yaml)
}

pub fn load_descriptors_json(text: &str) -> Result<Vec<FieldDescriptor>> {
    load_descriptors(text, DescriptorFormat::Json)
}

/// Convert an already-parsed document into descriptors.
pub fn descriptors_from_value(document: Value) -> Result<Vec<FieldDescriptor>> {
    let entries = match document {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("fields") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(FieldsError::InvalidDocument {
                    message: "expected a `fields` sequence".into(),
                })
            }
        },
        Value::Null => Vec::new(),
        _ => {
            return Err(FieldsError::InvalidDocument {
                message: "expected a sequence of field descriptors".into(),
            })
        }
    };

    entries
        .into_iter()
        .map(|entry| {
            check_kind(&entry)?;
            Ok(serde_json::from_value(entry)?)
        })
        .collect()
}

fn check_kind(entry: &Value) -> Result<()> {
    let field = entry
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>");
    let Some(kind) = entry.pointer("/type/kind") else {
        return Err(FieldsError::InvalidDocument {
            message: format!("field '{field}' has no type.kind"),
        });
    };
    let kind = kind.as_str().map(str::to_string).unwrap_or_else(|| kind.to_string());
    if FieldKind::KIND_NAMES.contains(&kind.as_str()) {
        Ok(())
    } else {
        Err(FieldsError::UnknownKind {
            field: field.to_string(),
            kind,
        })
    }
}
