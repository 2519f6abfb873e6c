//! The form engine
//!
//! One engine backs one form instance for one entity type. It owns the
//! merged descriptor set, the compiled schema, the live value map and the
//! per-field errors, and drives the `Idle -> Editing -> Submitting ->
//! Success | Failed` lifecycle. All mutation goes through `&mut self`.

use std::sync::Arc;

use formkit_common::Pretty;
use formkit_config::FormConfig;
use formkit_fields::{
    classify, compile, derive, mime_accepted, DataUrl, FieldDescriptor, FieldError,
    FieldErrorKind, FieldKind, FieldsError, FileConstraintError, Sections, ValidationErrors,
    ValidationSchema, ValueMap,
};
use formkit_image::{is_normalizable, normalize, OUTPUT_MIME};
use formkit_store::{CustomFieldStore, KeyValueCustomFieldStore};
use serde_json::Value;
use tracing::{debug, info, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{EngineError, Result};
use crate::source::CustomFormSource;
use crate::state::FormState;
use crate::submit::{SubmissionPayload, SubmitHandler};

/// Configures and builds a [`FormEngine`]
pub struct FormEngineBuilder {
    entity_type: String,
    builtin: Vec<FieldDescriptor>,
    store: Option<Arc<dyn CustomFieldStore>>,
    source: Option<Arc<dyn CustomFormSource>>,
    submitter: Option<Arc<dyn SubmitHandler>>,
    config: FormConfig,
    initial_values: Option<ValueMap>,
}

impl FormEngineBuilder {
    /// Add one built-in descriptor.
    pub fn field(mut self, descriptor: FieldDescriptor) -> Self {
        self.builtin.push(descriptor);
        self
    }

    /// Add built-in descriptors, keeping their order.
    pub fn fields(mut self, descriptors: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.builtin.extend(descriptors);
        self
    }

    /// Custom field store. Defaults to an in-memory store.
    pub fn store(mut self, store: Arc<dyn CustomFieldStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Remote metadata source merged after stored custom fields.
    pub fn source(mut self, source: Arc<dyn CustomFormSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn submit_handler(mut self, submitter: Arc<dyn SubmitHandler>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    pub fn config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    /// Values of the record being edited; preferred over zero values.
    pub fn initial_values(mut self, values: ValueMap) -> Self {
        self.initial_values = Some(values);
        self
    }

    pub async fn build(self) -> Result<FormEngine> {
        self.config.validate()?;
        let submitter = self.submitter.ok_or(EngineError::MissingSubmitHandler)?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(KeyValueCustomFieldStore::in_memory()));

        let mut engine = FormEngine {
            entity_type: self.entity_type,
            builtin: self.builtin,
            store,
            source: self.source,
            submitter,
            config: self.config,
            descriptors: Vec::new(),
            schema: ValidationSchema::default(),
            sections: Sections::default(),
            values: ValueMap::new(),
            errors: ValidationErrors::new(),
            oversized: ValidationErrors::new(),
            state: FormState::Idle,
            fingerprint: None,
            compile_count: 0,
        };

        engine.refresh().await?;
        engine.values = derive(&engine.descriptors, self.initial_values.as_ref());
        engine.transition(FormState::Editing);
        info!(
            entity_type = %engine.entity_type,
            fields = engine.descriptors.len(),
            "form engine ready"
        );
        Ok(engine)
    }
}

/// Validation, defaulting, layout and submission for one form instance
pub struct FormEngine {
    entity_type: String,
    builtin: Vec<FieldDescriptor>,
    store: Arc<dyn CustomFieldStore>,
    source: Option<Arc<dyn CustomFormSource>>,
    submitter: Arc<dyn SubmitHandler>,
    config: FormConfig,
    descriptors: Vec<FieldDescriptor>,
    schema: ValidationSchema,
    sections: Sections,
    values: ValueMap,
    errors: ValidationErrors,
    /// Normalized images still over the image byte limit; held until the
    /// field's value changes.
    oversized: ValidationErrors,
    state: FormState,
    fingerprint: Option<u64>,
    compile_count: u64,
}

impl std::fmt::Debug for FormEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormEngine")
            .field("entity_type", &self.entity_type)
            .field("state", &self.state)
            .field("fields", &self.descriptors.len())
            .field("errors", &self.errors.len())
            .finish()
    }
}

impl FormEngine {
    pub fn builder(entity_type: impl Into<String>) -> FormEngineBuilder {
        FormEngineBuilder {
            entity_type: entity_type.into(),
            builtin: Vec::new(),
            store: None,
            source: None,
            submitter: None,
            config: FormConfig::default(),
            initial_values: None,
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn sections(&self) -> &Sections {
        &self.sections
    }

    pub fn schema(&self) -> &ValidationSchema {
        &self.schema
    }

    /// Merged descriptors: built-in, then stored custom, then remote.
    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// How many times the schema has been compiled.
    pub fn compile_count(&self) -> u64 {
        self.compile_count
    }

    /// Set one field and re-validate only that field.
    ///
    /// A validation failure is recorded in [`FormEngine::errors`], not
    /// returned; only an unknown name is an error here.
    pub fn set_value(&mut self, name: &str, value: Value) -> Result<()> {
        if !self.schema.contains(name) {
            return Err(EngineError::UnknownField(name.to_string()));
        }
        self.resume_editing();
        self.oversized.remove(name);
        match self.schema.validate_field(name, Some(&value)) {
            Ok(_) => {
                self.errors.remove(name);
            }
            Err(error) => {
                debug!(field = name, error = %error.kind, "field failed validation");
                self.errors.insert(error);
            }
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Replace the value map with `values` layered over zero values.
    pub fn load_initial_values(&mut self, values: &ValueMap) {
        self.resume_editing();
        self.values = derive(&self.descriptors, Some(values));
        self.errors.clear();
        self.oversized.clear();
        debug!(fields = self.values.len(), "loaded initial values");
    }

    /// Attach raw file bytes to a `file` field.
    ///
    /// Raster images are re-encoded as bounded JPEGs on a blocking thread,
    /// unless the field does not accept JPEG. The result is stored as a data
    /// URL and validated like any other value. An image still over the
    /// tighter of the image and field byte limits at the lowest quality is
    /// kept, but records a `TooLarge` error that blocks submission until
    /// the field is set again.
    pub async fn attach_file(&mut self, name: &str, bytes: Vec<u8>, mime: &str) -> Result<()> {
        let descriptor = self
            .descriptor(name)
            .ok_or_else(|| EngineError::UnknownField(name.to_string()))?;
        let FieldKind::File { accept, max_bytes } = &descriptor.kind else {
            return Err(EngineError::NotAFileField(name.to_string()));
        };

        let mut over_limit = None;
        let url = if is_normalizable(mime) && mime_accepted(OUTPUT_MIME, accept) {
            let limits = self.config.image.with_max_bytes_at_most(*max_bytes);
            let image = tokio::task::spawn_blocking(move || normalize(&bytes, limits)).await??;
            if !image.within_limit {
                warn!(
                    field = name,
                    size = image.size(),
                    max_bytes = limits.max_bytes,
                    "normalized image still exceeds the limit"
                );
                over_limit = Some(FileConstraintError::TooLarge {
                    size: image.size(),
                    max_bytes: limits.max_bytes,
                });
            }
            DataUrl::encode(image.mime(), &image.bytes)
        } else {
            DataUrl::encode(mime, &bytes)
        };

        self.set_value(name, Value::String(url))?;
        if let Some(constraint) = over_limit {
            let error = FieldError::new(name, FieldErrorKind::File(constraint));
            self.errors.insert(error.clone());
            self.oversized.insert(error);
        }
        Ok(())
    }

    /// Persist a new custom field and merge it into the form.
    pub async fn add_custom_field(&mut self, descriptor: FieldDescriptor) -> Result<()> {
        if self.descriptor(&descriptor.name).is_some() {
            return Err(FieldsError::DuplicateFieldName {
                name: descriptor.name,
            }
            .into());
        }
        self.resume_editing();
        self.store.add(&self.entity_type, descriptor).await?;
        self.refresh().await
    }

    /// Remove a stored custom field and drop it from the form.
    pub async fn remove_custom_field(&mut self, name: &str) -> Result<()> {
        self.resume_editing();
        self.store.remove(&self.entity_type, name).await?;
        self.refresh().await
    }

    /// Re-read custom fields and recompile if the merged set changed.
    ///
    /// Values of surviving fields are kept; new fields get zero values and
    /// values of removed fields are dropped along with their errors.
    pub async fn refresh(&mut self) -> Result<()> {
        let merged = self.merged_descriptors().await?;
        let fingerprint = fingerprint(&merged)?;
        if self.fingerprint == Some(fingerprint) {
            debug!(entity_type = %self.entity_type, "descriptor set unchanged");
            return Ok(());
        }

        SubmissionPayload::check_reserved_names(&merged)?;
        let schema = compile(&merged)?;
        self.compile_count += 1;
        self.sections = classify(&merged);
        self.values = derive(&merged, Some(&self.values));
        self.errors.retain(|name| schema.contains(name));
        self.oversized.retain(|name| schema.contains(name));
        self.schema = schema;
        self.descriptors = merged;
        self.fingerprint = Some(fingerprint);
        debug!(
            entity_type = %self.entity_type,
            fields = self.descriptors.len(),
            compile_count = self.compile_count,
            "recompiled form"
        );
        Ok(())
    }

    /// Validate everything and hand the payload to the submit handler.
    ///
    /// Invalid values, including attached images left over the byte limit,
    /// keep the engine in `Editing` with per-field errors. A rejection by the
    /// submit handler returns [`EngineError::Submission`] and leaves the
    /// engine in `Failed` with every value kept; the next call on the engine
    /// (an edit or another `submit`) moves it back to `Editing`. Only an
    /// accepted submission resets values to their defaults.
    pub async fn submit(&mut self) -> Result<Value> {
        self.resume_editing();

        let (cleaned, mut errors) = match self.schema.validate(&self.values) {
            Ok(cleaned) => (cleaned, ValidationErrors::new()),
            Err(errors) => (ValueMap::new(), errors),
        };
        for error in self.oversized.iter() {
            if errors.get(&error.field).is_none() {
                errors.insert(error.clone());
            }
        }
        if !errors.is_empty() {
            info!(
                entity_type = %self.entity_type,
                failed = errors.len(),
                "submission blocked by validation"
            );
            self.errors = errors.clone();
            return Err(EngineError::Invalid(errors));
        }
        self.errors.clear();

        self.transition(FormState::Submitting);
        let payload =
            SubmissionPayload::partition(&self.descriptors, cleaned, &self.config);
        debug!("submission payload: {}", Pretty(&payload));

        match self.submitter.submit(payload).await {
            Ok(response) => {
                self.transition(FormState::Success);
                self.values = derive(&self.descriptors, None);
                Ok(response)
            }
            Err(rejection) => {
                self.transition(FormState::Failed);
                warn!(
                    entity_type = %self.entity_type,
                    reason = %rejection.message,
                    "submission rejected"
                );
                Err(EngineError::Submission {
                    message: rejection.message,
                })
            }
        }
    }

    async fn merged_descriptors(&self) -> Result<Vec<FieldDescriptor>> {
        let mut merged = self.builtin.clone();
        let stored = self.store.list(&self.entity_type).await?;
        merged.extend(stored.into_iter().map(|field| field.descriptor));

        if let Some(source) = &self.source {
            let remote = source
                .descriptors(&self.entity_type)
                .await
                .map_err(|e| EngineError::Source {
                    entity_type: self.entity_type.clone(),
                    message: e.message,
                })?;
            merged.extend(remote.into_iter().map(FieldDescriptor::into_custom));
        }
        Ok(merged)
    }

    /// Any interaction after a settled or abandoned submission resumes editing.
    fn resume_editing(&mut self) {
        if self.state != FormState::Editing && self.state != FormState::Idle {
            self.transition(FormState::Editing);
        }
    }

    fn transition(&mut self, to: FormState) {
        if self.state != to {
            info!(entity_type = %self.entity_type, from = %self.state, to = %to, "form state");
            self.state = to;
        }
    }
}

/// Stable hash of a descriptor list; equal lists hash equal.
pub fn fingerprint(descriptors: &[FieldDescriptor]) -> Result<u64> {
    let encoded = serde_json::to_vec(descriptors)?;
    Ok(xxh3_64(&encoded))
}
