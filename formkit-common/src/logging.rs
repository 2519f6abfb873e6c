//! Logging utilities for formkit
//!
//! This module provides utilities for formatting values inside log messages.

use serde::Serialize;
use std::fmt::Debug;

/// Wrapper for pretty-printing types in logs as YAML
///
/// ```ignore
/// use formkit_common::Pretty;
/// use tracing::debug;
///
/// debug!("submission payload: {}", Pretty(&payload));
/// ```
///
/// Outputs YAML with a leading newline. Debug is used as a fallback if YAML
/// serialization fails.
pub struct Pretty<T>(pub T);

impl<T: Serialize + Debug> std::fmt::Display for Pretty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_yaml_ng::to_string(&self.0) {
            Ok(yaml) => write!(f, "\n{}", yaml),
            Err(_) => write!(f, "\n{:#?}", self.0),
        }
    }
}

impl<T: Serialize + Debug> std::fmt::Debug for Pretty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_renders_yaml_with_leading_newline() {
        let value = serde_json::json!({ "price": 42 });
        let rendered = format!("{}", Pretty(&value));
        assert!(rendered.starts_with('\n'));
        assert!(rendered.contains("price: 42"));
    }
}
