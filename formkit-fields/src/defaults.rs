//! Default value derivation.

use tracing::trace;

use crate::types::{FieldDescriptor, ValueMap};

/// Build the baseline value map for a descriptor set.
///
/// A supplied initial value is used verbatim, even one that would fail
/// validation, so edit flows show exactly what the server holds. Otherwise
/// the kind's zero value is used; `file` fields stay absent. Initial values
/// for names without a descriptor are ignored.
pub fn derive(descriptors: &[FieldDescriptor], initial: Option<&ValueMap>) -> ValueMap {
    let mut values = ValueMap::with_capacity(descriptors.len());
    for descriptor in descriptors {
        if let Some(value) = initial.and_then(|init| init.get(&descriptor.name)) {
            values.insert(descriptor.name.clone(), value.clone());
        } else if let Some(zero) = descriptor.kind.zero_value() {
            values.insert(descriptor.name.clone(), zero);
        }
    }
    trace!(fields = values.len(), "derived default values");
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChoiceOption, FieldKind};
    use serde_json::json;

    #[test]
    fn initial_value_wins() {
        let fields = [FieldDescriptor::new("price", "Price", FieldKind::Number).required()];
        let mut initial = ValueMap::new();
        initial.insert("price".into(), json!(42));
        let values = derive(&fields, Some(&initial));
        assert_eq!(values.len(), 1);
        assert_eq!(values["price"], json!(42));
    }

    #[test]
    fn zero_value_without_initial() {
        let fields = [FieldDescriptor::new("price", "Price", FieldKind::Number).required()];
        assert_eq!(derive(&fields, None)["price"], json!(0));
    }

    #[test]
    fn initial_values_are_not_coerced() {
        let fields = [
            FieldDescriptor::new("price", "Price", FieldKind::Number),
            FieldDescriptor::new("active", "Active", FieldKind::Checkbox),
        ];
        let mut initial = ValueMap::new();
        initial.insert("price".into(), json!("not a number"));
        initial.insert("active".into(), json!(null));
        let values = derive(&fields, Some(&initial));
        assert_eq!(values["price"], json!("not a number"));
        assert_eq!(values["active"], json!(null));
    }

    #[test]
    fn zero_values_by_kind_and_file_absent() {
        let fields = [
            FieldDescriptor::new("name", "Name", FieldKind::Text),
            FieldDescriptor::new(
                "unit",
                "Unit",
                FieldKind::Select {
                    options: vec![ChoiceOption::new("kg", "Kilograms")],
                },
            ),
            FieldDescriptor::new("since", "Since", FieldKind::Date),
            FieldDescriptor::new("active", "Active", FieldKind::Checkbox),
            FieldDescriptor::new(
                "photo",
                "Photo",
                FieldKind::File {
                    accept: vec![],
                    max_bytes: 10,
                },
            ),
        ];
        let values = derive(&fields, None);
        assert_eq!(values["name"], json!(""));
        assert_eq!(values["unit"], json!(""));
        assert_eq!(values["since"], json!(""));
        assert_eq!(values["active"], json!(false));
        assert!(!values.contains_key("photo"));
    }

    #[test]
    fn unknown_initial_names_are_ignored() {
        let fields = [FieldDescriptor::new("name", "Name", FieldKind::Text)];
        let mut initial = ValueMap::new();
        initial.insert("id".into(), json!(7));
        let values = derive(&fields, Some(&initial));
        assert!(!values.contains_key("id"));
        assert_eq!(values.keys().collect::<Vec<_>>(), vec!["name"]);
    }
}
