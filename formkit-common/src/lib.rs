//! Shared building blocks for the formkit crates
//!
//! Severity classification for errors and a YAML pretty-printer for
//! structured log output.

pub mod error;
pub mod logging;

pub use error::{ErrorSeverity, Severity};
pub use logging::Pretty;
