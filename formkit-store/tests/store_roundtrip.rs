//! Custom fields survive reopening a file-backed store.

use std::sync::Arc;

use formkit_fields::{ChoiceOption, FieldDescriptor, FieldKind, Section};
use formkit_store::{CustomFieldStore, KeyValueCustomFieldStore, StoreError};
use tempfile::TempDir;

fn grade() -> FieldDescriptor {
    FieldDescriptor::new(
        "custom_grade",
        "Grade",
        FieldKind::Select {
            options: vec![ChoiceOption::new("a", "A"), ChoiceOption::new("b", "B")],
        },
    )
    .required()
}

#[tokio::test]
async fn fields_persist_across_reopen() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("custom-fields");

    {
        let store = KeyValueCustomFieldStore::in_directory(&dir);
        store.add("inventory-item", grade()).await.unwrap();
        store
            .add(
                "inventory-item",
                FieldDescriptor::new("custom_notes", "Notes", FieldKind::Text),
            )
            .await
            .unwrap();
    }

    assert!(dir.join("customFields_inventory-item.json").exists());

    let reopened = KeyValueCustomFieldStore::in_directory(&dir);
    let fields = reopened.list("inventory-item").await.unwrap();
    let names: Vec<_> = fields.iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["custom_grade", "custom_notes"]);
    assert!(fields[0].descriptor.required);
    assert_eq!(fields[0].descriptor.section, Section::Custom);
    assert_eq!(fields[0].descriptor.kind.options().len(), 2);

    let remaining = reopened.remove("inventory-item", "custom_grade").await.unwrap();
    assert_eq!(remaining.len(), 1);

    let again = KeyValueCustomFieldStore::in_directory(&dir);
    let fields = again.list("inventory-item").await.unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name(), "custom_notes");
}

#[tokio::test]
async fn store_works_behind_a_shared_trait_object() {
    let store: Arc<dyn CustomFieldStore> = Arc::new(KeyValueCustomFieldStore::in_memory());

    let worker = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.add("supplier", grade()).await })
    };
    worker.await.unwrap().unwrap();

    let err = store.add("supplier", grade()).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateField { .. }));
    assert_eq!(store.list("supplier").await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_directory_lists_empty() {
    let tmp = TempDir::new().unwrap();
    let store = KeyValueCustomFieldStore::in_directory(tmp.path().join("never-created"));
    assert!(store.list("inventory-item").await.unwrap().is_empty());
}
