//! Submission payload and the collaborator that transports it
//!
//! Validated values are split by descriptor origin. Built-in values are
//! emitted as top-level keys; custom values travel as a `customFieldValues`
//! list keyed by the field name with the custom prefix stripped:
//!
//! ```json
//! { "sku": "SKU-1", "price": 42, "customFieldValues": [{ "fieldId": "42", "value": "y" }] }
//! ```

use async_trait::async_trait;
use formkit_config::FormConfig;
use formkit_fields::{FieldDescriptor, FieldsError, ValueMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Payload key holding the custom field values.
pub const CUSTOM_VALUES_KEY: &str = "customFieldValues";

/// One custom field value in a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldValue {
    pub field_id: String,
    pub value: Value,
}

/// What the submit handler receives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(flatten)]
    pub standard_values: ValueMap,
    #[serde(rename = "customFieldValues", default)]
    pub custom_field_values: Vec<CustomFieldValue>,
}

impl SubmissionPayload {
    /// Built-in values are flattened next to [`CUSTOM_VALUES_KEY`], so no
    /// built-in field may take that name.
    pub fn check_reserved_names(descriptors: &[FieldDescriptor]) -> Result<(), FieldsError> {
        match descriptors
            .iter()
            .find(|d| !d.is_custom() && d.name == CUSTOM_VALUES_KEY)
        {
            Some(descriptor) => Err(FieldsError::ReservedFieldName {
                name: descriptor.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Split cleaned values by the origin of their descriptor.
    ///
    /// Names without a descriptor are treated as built-in.
    pub fn partition(
        descriptors: &[FieldDescriptor],
        values: ValueMap,
        config: &FormConfig,
    ) -> Self {
        let mut payload = SubmissionPayload::default();
        for (name, value) in values {
            let is_custom = descriptors
                .iter()
                .find(|d| d.name == name)
                .is_some_and(FieldDescriptor::is_custom);
            if is_custom {
                let field_id = config.field_id(&name).to_string();
                payload
                    .custom_field_values
                    .push(CustomFieldValue { field_id, value });
            } else {
                payload.standard_values.insert(name, value);
            }
        }
        payload
    }
}

/// Why a submit handler refused a payload. The message is shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SubmitRejection {
    pub message: String,
}

impl SubmitRejection {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// External collaborator that persists a submitted form
///
/// Timeouts and cancellation are the handler's concern.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    async fn submit(&self, payload: SubmissionPayload) -> Result<Value, SubmitRejection>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use formkit_fields::FieldKind;
    use serde_json::json;

    fn descriptors() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("sku", "SKU", FieldKind::Text),
            FieldDescriptor::new("custom_42", "Colour", FieldKind::Text).into_custom(),
            // Custom origin without the prefix keeps its full name as id.
            FieldDescriptor::new("grade", "Grade", FieldKind::Text).into_custom(),
            // Prefix alone does not make a field custom.
            FieldDescriptor::new("custom_legacy", "Legacy", FieldKind::Text),
        ]
    }

    #[test]
    fn partition_by_origin() {
        let mut values = ValueMap::new();
        values.insert("sku".into(), json!("SKU-1"));
        values.insert("custom_42".into(), json!("y"));
        values.insert("grade".into(), json!("a"));
        values.insert("custom_legacy".into(), json!("old"));

        let payload = SubmissionPayload::partition(&descriptors(), values, &FormConfig::default());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "sku": "SKU-1",
                "custom_legacy": "old",
                "customFieldValues": [
                    { "fieldId": "42", "value": "y" },
                    { "fieldId": "grade", "value": "a" }
                ]
            })
        );
    }

    #[test]
    fn empty_custom_list_is_still_emitted() {
        let mut values = ValueMap::new();
        values.insert("sku".into(), json!("SKU-1"));
        let payload = SubmissionPayload::partition(&descriptors(), values, &FormConfig::default());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["customFieldValues"], json!([]));
    }

    #[test]
    fn configured_prefix_drives_field_ids() {
        let config = FormConfig {
            custom_prefix: "extra.".into(),
            ..FormConfig::default()
        };
        let descriptors =
            vec![FieldDescriptor::new("extra.batch", "Batch", FieldKind::Text).into_custom()];
        let mut values = ValueMap::new();
        values.insert("extra.batch".into(), json!("B7"));

        let payload = SubmissionPayload::partition(&descriptors, values, &config);
        assert_eq!(payload.custom_field_values[0].field_id, "batch");
    }

    #[test]
    fn builtin_field_cannot_shadow_custom_values_key() {
        let clash = vec![FieldDescriptor::new(CUSTOM_VALUES_KEY, "Oops", FieldKind::Text)];
        assert!(matches!(
            SubmissionPayload::check_reserved_names(&clash),
            Err(FieldsError::ReservedFieldName { ref name }) if name == CUSTOM_VALUES_KEY
        ));

        let custom = vec![
            FieldDescriptor::new(CUSTOM_VALUES_KEY, "Fine", FieldKind::Text).into_custom(),
        ];
        assert!(SubmissionPayload::check_reserved_names(&custom).is_ok());
    }

    #[test]
    fn payload_deserializes_back() {
        let payload: SubmissionPayload = serde_json::from_value(json!({
            "price": 3,
            "customFieldValues": [{ "fieldId": "x", "value": true }]
        }))
        .unwrap();
        assert_eq!(payload.standard_values["price"], json!(3));
        assert_eq!(payload.custom_field_values[0].field_id, "x");
    }
}
