//! Form engine for formkit
//!
//! Merges built-in descriptors with stored and remote custom fields,
//! compiles them into a validation schema, keeps the live value map, and
//! hands validated submissions to a [`SubmitHandler`].
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use formkit_engine::{FormEngine, SubmitHandler};
//! # use formkit_fields::{FieldDescriptor, FieldKind};
//! # async fn demo(handler: Arc<dyn SubmitHandler>) -> formkit_engine::Result<()> {
//! let mut engine = FormEngine::builder("inventory-item")
//!     .field(FieldDescriptor::new("sku", "SKU", FieldKind::Text).required())
//!     .submit_handler(handler)
//!     .build()
//!     .await?;
//! engine.set_value("sku", serde_json::json!("SKU-1"))?;
//! engine.submit().await?;
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod source;
pub mod state;
pub mod submit;

pub use engine::{fingerprint, FormEngine, FormEngineBuilder};
pub use error::{EngineError, Result};
pub use source::{CustomFormSource, SourceError, StaticFormSource};
pub use state::FormState;
pub use submit::{
    CustomFieldValue, SubmissionPayload, SubmitHandler, SubmitRejection, CUSTOM_VALUES_KEY,
};
