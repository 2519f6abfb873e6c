//! Command implementations.
//!
//! Every command writes its result as pretty JSON to `out` and reports
//! whether the input was valid. Diagnostics go through `tracing` to stderr.

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use formkit_config::FormConfig;
use formkit_engine::{EngineError, FormEngine, SubmissionPayload, SubmitHandler, SubmitRejection};
use formkit_fields::{
    classify, compile, derive, load_descriptors, DescriptorFormat, FieldDescriptor, ValueMap,
};
use formkit_image::{normalize, ImageLimits};
use formkit_store::{CustomFieldStore, KeyValueCustomFieldStore};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::cli::{Commands, CustomAction};

/// Exit code when the input failed validation.
pub const VALIDATION_FAILED_EXIT_CODE: i32 = 2;

/// How a command that ran to completion ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Values failed validation; the errors were written instead of a result
    Invalid,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::Invalid => VALIDATION_FAILED_EXIT_CODE,
        }
    }
}

pub async fn run(command: Commands, config: &FormConfig, out: &mut dyn Write) -> Result<Outcome> {
    match command {
        Commands::Validate { form, values } => validate(&form, &values, out),
        Commands::Defaults { form, initial } => defaults(&form, initial.as_deref(), out),
        Commands::Sections { form } => sections(&form, out),
        Commands::Custom { action } => custom(action, config, out).await,
        Commands::NormalizeImage {
            input,
            output,
            max_bytes,
            max_dimension,
        } => {
            let limits = ImageLimits {
                max_bytes: max_bytes.unwrap_or(config.image.max_bytes),
                max_dimension: max_dimension.unwrap_or(config.image.max_dimension),
            };
            normalize_image(&input, &output, limits, out).await
        }
        Commands::Submit {
            form,
            entity,
            values,
        } => submit(&form, &entity, &values, config, out).await,
    }
}

fn validate(form: &Path, values: &Path, out: &mut dyn Write) -> Result<Outcome> {
    let schema = compile(&read_descriptors(form)?)?;
    match schema.validate(&read_values(values)?) {
        Ok(cleaned) => {
            write_json(out, &cleaned)?;
            Ok(Outcome::Success)
        }
        Err(errors) => {
            write_json(out, &errors)?;
            Ok(Outcome::Invalid)
        }
    }
}

fn defaults(form: &Path, initial: Option<&Path>, out: &mut dyn Write) -> Result<Outcome> {
    let descriptors = read_descriptors(form)?;
    let initial = initial.map(read_values).transpose()?;
    write_json(out, &derive(&descriptors, initial.as_ref()))?;
    Ok(Outcome::Success)
}

fn sections(form: &Path, out: &mut dyn Write) -> Result<Outcome> {
    let descriptors = read_descriptors(form)?;
    // Same checks the engine applies before laying a form out.
    compile(&descriptors)?;
    let mut grouped = serde_json::Map::new();
    for (section, fields) in classify(&descriptors).iter() {
        let names = fields.iter().map(|f| Value::from(f.name.as_str())).collect();
        grouped.insert(section.to_string(), Value::Array(names));
    }
    write_json(out, &grouped)?;
    Ok(Outcome::Success)
}

async fn custom(action: CustomAction, config: &FormConfig, out: &mut dyn Write) -> Result<Outcome> {
    let store = KeyValueCustomFieldStore::in_directory(&config.store.directory);
    debug!(directory = %config.store.directory.display(), "using custom field store");

    let fields = match action {
        CustomAction::List { entity } => store.list(&entity).await?,
        CustomAction::Add {
            entity,
            descriptors,
        } => {
            let mut fields = store.list(&entity).await?;
            for descriptor in read_descriptors(&descriptors)? {
                fields = store.add(&entity, descriptor).await?;
            }
            fields
        }
        CustomAction::Remove { entity, name } => {
            let before = store.list(&entity).await?.len();
            let fields = store.remove(&entity, &name).await?;
            if fields.len() == before {
                warn!(entity = %entity, name = %name, "no such custom field");
            }
            fields
        }
    };
    write_json(out, &fields)?;
    Ok(Outcome::Success)
}

#[derive(Serialize)]
struct NormalizeReport {
    output: String,
    width: u32,
    height: u32,
    bytes: u64,
    quality: f32,
    attempts: u8,
    within_limit: bool,
}

async fn normalize_image(
    input: &Path,
    output: &Path,
    limits: ImageLimits,
    out: &mut dyn Write,
) -> Result<Outcome> {
    let raw = tokio::fs::read(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    let image = tokio::task::spawn_blocking(move || normalize(&raw, limits)).await??;
    if !image.within_limit {
        warn!(
            size = image.size(),
            max_bytes = limits.max_bytes,
            "image exceeds the byte limit even at the lowest quality"
        );
    }
    tokio::fs::write(output, &image.bytes)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    write_json(
        out,
        &NormalizeReport {
            output: output.display().to_string(),
            width: image.width,
            height: image.height,
            bytes: image.size(),
            quality: image.quality,
            attempts: image.attempts,
            within_limit: image.within_limit,
        },
    )?;
    Ok(Outcome::Success)
}

/// Keeps the payload so the command can print it after the engine settles.
#[derive(Default)]
struct CapturingSubmitHandler {
    payload: Mutex<Option<SubmissionPayload>>,
}

#[async_trait]
impl SubmitHandler for CapturingSubmitHandler {
    async fn submit(&self, payload: SubmissionPayload) -> Result<Value, SubmitRejection> {
        let mut slot = self
            .payload
            .lock()
            .map_err(|_| SubmitRejection::new("submit handler state poisoned"))?;
        *slot = Some(payload);
        Ok(json!({ "accepted": true }))
    }
}

async fn submit(
    form: &Path,
    entity: &str,
    values: &Path,
    config: &FormConfig,
    out: &mut dyn Write,
) -> Result<Outcome> {
    let handler = Arc::new(CapturingSubmitHandler::default());
    let store = Arc::new(KeyValueCustomFieldStore::in_directory(&config.store.directory));

    let mut engine = FormEngine::builder(entity)
        .fields(read_descriptors(form)?)
        .store(store)
        .submit_handler(handler.clone())
        .config(config.clone())
        .initial_values(read_values(values)?)
        .build()
        .await?;

    match engine.submit().await {
        Ok(_) => {
            let payload = handler
                .payload
                .lock()
                .map_err(|_| anyhow::anyhow!("submit handler state poisoned"))?
                .take()
                .context("submit handler was never called")?;
            write_json(out, &payload)?;
            Ok(Outcome::Success)
        }
        Err(EngineError::Invalid(errors)) => {
            write_json(out, &errors)?;
            Ok(Outcome::Invalid)
        }
        Err(e) => Err(e.into()),
    }
}

fn read_descriptors(path: &Path) -> Result<Vec<FieldDescriptor>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    load_descriptors(&text, DescriptorFormat::from_path(path))
        .with_context(|| format!("invalid form document {}", path.display()))
}

fn read_values(path: &Path) -> Result<ValueMap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let values = match DescriptorFormat::from_path(path) {
        DescriptorFormat::Json => serde_json::from_str(&text)?,
        DescriptorFormat::Yaml => serde_yaml_ng::from_str(&text)?,
    };
    Ok(values)
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const FORM: &str = r#"
fields:
  - name: sku
    label: SKU
    type: { kind: text }
    required: true
  - name: price
    label: Price
    type: { kind: number }
    required: true
  - name: reorder
    label: Reorder level
    type: { kind: number }
    section: other
"#;

    struct Fixture {
        dir: TempDir,
        config: FormConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join("form.yaml"), FORM).unwrap();
            let mut config = FormConfig::default();
            config.store.directory = dir.path().join("custom-fields");
            Self { dir, config }
        }

        fn write(&self, name: &str, content: &str) -> std::path::PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, content).unwrap();
            path
        }

        fn form(&self) -> std::path::PathBuf {
            self.dir.path().join("form.yaml")
        }

        async fn run(&self, command: Commands) -> (Outcome, Value) {
            let mut out = Vec::new();
            let outcome = run(command, &self.config, &mut out).await.unwrap();
            (outcome, serde_json::from_slice(&out).unwrap())
        }
    }

    #[tokio::test]
    async fn validate_reports_each_failing_field() {
        let fx = Fixture::new();
        let values = fx.write("values.json", r#"{"sku": "", "price": "abc"}"#);
        let (outcome, json) = fx
            .run(Commands::Validate {
                form: fx.form(),
                values,
            })
            .await;
        assert_eq!(outcome, Outcome::Invalid);
        assert_eq!(outcome.exit_code(), 2);
        assert!(json.get("sku").is_some());
        assert!(json.get("price").is_some());
        assert!(json.get("reorder").is_none());
    }

    #[tokio::test]
    async fn validate_prints_cleaned_values() {
        let fx = Fixture::new();
        let values = fx.write("values.yaml", "sku: A1\nprice: \"7\"\n");
        let (outcome, json) = fx
            .run(Commands::Validate {
                form: fx.form(),
                values,
            })
            .await;
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(json, json!({ "sku": "A1", "price": 7 }));
    }

    #[tokio::test]
    async fn defaults_and_sections() {
        let fx = Fixture::new();
        let initial = fx.write("initial.json", r#"{"price": 42}"#);
        let (_, json) = fx
            .run(Commands::Defaults {
                form: fx.form(),
                initial: Some(initial),
            })
            .await;
        assert_eq!(json, json!({ "sku": "", "price": 42, "reorder": 0 }));

        let (_, json) = fx.run(Commands::Sections { form: fx.form() }).await;
        assert_eq!(
            json,
            json!({ "default": ["sku", "price"], "other": ["reorder"] })
        );
    }

    #[tokio::test]
    async fn custom_fields_then_submit() {
        let fx = Fixture::new();
        let extra = fx.write(
            "extra.yaml",
            "- name: custom_42\n  label: Colour\n  type: { kind: text }\n",
        );
        let (_, json) = fx
            .run(Commands::Custom {
                action: CustomAction::Add {
                    entity: "inventory-item".into(),
                    descriptors: extra,
                },
            })
            .await;
        assert_eq!(json[0]["name"], "custom_42");
        assert_eq!(json[0]["origin"], "custom");

        let values = fx.write(
            "values.json",
            r#"{"sku": "A1", "price": 3, "custom_42": "y"}"#,
        );
        let (outcome, json) = fx
            .run(Commands::Submit {
                form: fx.form(),
                entity: "inventory-item".into(),
                values,
            })
            .await;
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(
            json["customFieldValues"],
            json!([{ "fieldId": "42", "value": "y" }])
        );
        assert_eq!(json["sku"], "A1");

        let (_, json) = fx
            .run(Commands::Custom {
                action: CustomAction::Remove {
                    entity: "inventory-item".into(),
                    name: "custom_42".into(),
                },
            })
            .await;
        assert_eq!(json, json!([]));
    }

    #[tokio::test]
    async fn submit_with_invalid_values_exits_with_validation_code() {
        let fx = Fixture::new();
        let values = fx.write("values.json", r#"{"sku": "A1", "price": -4}"#);
        let (outcome, json) = fx
            .run(Commands::Submit {
                form: fx.form(),
                entity: "inventory-item".into(),
                values,
            })
            .await;
        assert_eq!(outcome, Outcome::Invalid);
        assert!(json.get("price").is_some());
    }

    #[tokio::test]
    async fn missing_form_is_an_error() {
        let fx = Fixture::new();
        let mut out = Vec::new();
        let err = run(
            Commands::Sections {
                form: fx.dir.path().join("absent.yaml"),
            },
            &fx.config,
            &mut out,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
