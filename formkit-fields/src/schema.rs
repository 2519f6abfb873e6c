//! Schema compiler: descriptors in, per-field validation rules out.
//!
//! Compilation is a pure function of the descriptor list. Each descriptor
//! gets either the rule derived from its kind and required-ness, or its
//! override rule verbatim; the two are never merged.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Number, Value};
use tracing::debug;

use crate::error::{FieldError, FieldErrorKind, FieldsError, Result, ValidationErrors};
use crate::file_value::check_file_value;
use crate::types::{FieldDescriptor, FieldKind, OverrideRule, ValueMap};

/// Number of digits a phone value must carry once punctuation is stripped.
pub const PHONE_DIGITS: usize = 10;

/// A compiled validation rule for one field.
#[derive(Debug, Clone)]
pub enum Rule {
    Text { required: bool },
    Number { required: bool },
    Phone { required: bool },
    Choice { required: bool, options: Vec<String> },
    Checkbox { required: bool },
    File {
        required: bool,
        accept: Vec<String>,
        max_bytes: u64,
    },
    Date { required: bool },
    Override(CompiledOverride),
}

/// An override rule with its regex (if any) compiled up front.
#[derive(Debug, Clone)]
pub struct CompiledOverride {
    rule: OverrideRule,
    pattern: Option<Regex>,
}

impl CompiledOverride {
    fn compile(field: &str, rule: &OverrideRule) -> Result<Self> {
        let pattern = match rule {
            OverrideRule::Pattern { pattern, .. } => {
                Some(Regex::new(pattern).map_err(|e| FieldsError::InvalidOverride {
                    field: field.to_string(),
                    message: e.to_string(),
                })?)
            }
            OverrideRule::Range {
                min: Some(min),
                max: Some(max),
                ..
            } if min > max => {
                return Err(FieldsError::InvalidOverride {
                    field: field.to_string(),
                    message: format!("range min {min} is greater than max {max}"),
                })
            }
            OverrideRule::Length {
                min: Some(min),
                max: Some(max),
                ..
            } if min > max => {
                return Err(FieldsError::InvalidOverride {
                    field: field.to_string(),
                    message: format!("length min {min} is greater than max {max}"),
                })
            }
            _ => None,
        };
        Ok(Self {
            rule: rule.clone(),
            pattern,
        })
    }

    pub fn rule(&self) -> &OverrideRule {
        &self.rule
    }

    fn check(&self, value: &Value) -> std::result::Result<Value, FieldErrorKind> {
        let fail = |default: String| {
            FieldErrorKind::invalid(self.rule.message().map(str::to_string).unwrap_or(default))
        };
        match &self.rule {
            OverrideRule::Pattern { pattern, .. } => {
                let text = scalar_text(value).ok_or_else(|| fail("must be text".into()))?;
                let matches = self.pattern.as_ref().is_some_and(|re| re.is_match(&text));
                if matches {
                    Ok(value.clone())
                } else {
                    Err(fail(format!("must match {pattern}")))
                }
            }
            OverrideRule::Range { min, max, .. } => {
                let n = coerce_number(value).ok_or_else(|| fail("must be a number".into()))?;
                if min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max) {
                    return Err(fail(describe_bounds("must be", *min, *max)));
                }
                Ok(number_value(n))
            }
            OverrideRule::Length { min, max, .. } => {
                let text = value.as_str().ok_or_else(|| fail("must be text".into()))?;
                let len = text.chars().count();
                if min.is_some_and(|min| len < min) || max.is_some_and(|max| len > max) {
                    return Err(fail(describe_bounds(
                        "length must be",
                        min.map(|m| m as f64),
                        max.map(|m| m as f64),
                    )));
                }
                Ok(value.clone())
            }
            OverrideRule::OneOf { values, .. } => {
                if values.contains(value) {
                    Ok(value.clone())
                } else {
                    Err(fail("is not an allowed value".into()))
                }
            }
        }
    }
}

fn describe_bounds(prefix: &str, min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{prefix} between {min} and {max}"),
        (Some(min), None) => format!("{prefix} at least {min}"),
        (None, Some(max)) => format!("{prefix} at most {max}"),
        (None, None) => format!("{prefix} valid"),
    }
}

impl Rule {
    /// Derive the rule for a descriptor, honoring its override.
    pub fn for_descriptor(descriptor: &FieldDescriptor) -> Result<Rule> {
        if let Some(rule) = &descriptor.override_rule {
            return Ok(Rule::Override(CompiledOverride::compile(
                &descriptor.name,
                rule,
            )?));
        }
        let required = descriptor.required;
        Ok(match &descriptor.kind {
            FieldKind::Text => Rule::Text { required },
            FieldKind::Number => Rule::Number { required },
            FieldKind::Phone => Rule::Phone { required },
            FieldKind::Select { options } | FieldKind::Radio { options } => Rule::Choice {
                required,
                options: options.iter().map(|o| o.value.clone()).collect(),
            },
            FieldKind::Checkbox => Rule::Checkbox { required },
            FieldKind::File { accept, max_bytes } => Rule::File {
                required,
                accept: accept.clone(),
                max_bytes: *max_bytes,
            },
            FieldKind::Date => Rule::Date { required },
        })
    }

    pub fn is_required(&self) -> bool {
        match self {
            Rule::Text { required }
            | Rule::Number { required }
            | Rule::Phone { required }
            | Rule::Choice { required, .. }
            | Rule::Checkbox { required }
            | Rule::File { required, .. }
            | Rule::Date { required } => *required,
            Rule::Override(o) => o.rule.is_required(),
        }
    }

    /// Check one value. Returns the cleaned value to submit, `None` when the
    /// field is absent and allowed to be.
    pub fn check(&self, value: Option<&Value>) -> std::result::Result<Option<Value>, FieldErrorKind> {
        let value = match value {
            Some(v) if !is_absent(v) => v,
            _ => return self.absent(),
        };
        match self {
            Rule::Text { .. } => match value {
                Value::String(_) => Ok(Some(value.clone())),
                _ => Err(FieldErrorKind::invalid("must be text")),
            },
            Rule::Number { required } => {
                let n = coerce_number(value)
                    .ok_or_else(|| FieldErrorKind::invalid("must be a number"))?;
                if *required && n < 0.0 {
                    return Err(FieldErrorKind::invalid("must be zero or greater"));
                }
                Ok(Some(number_value(n)))
            }
            Rule::Phone { .. } => {
                let text = scalar_text(value)
                    .ok_or_else(|| FieldErrorKind::invalid("must be a phone number"))?;
                let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
                if digits == PHONE_DIGITS {
                    Ok(Some(value.clone()))
                } else {
                    Err(FieldErrorKind::invalid(format!(
                        "must contain exactly {PHONE_DIGITS} digits"
                    )))
                }
            }
            Rule::Choice { required, options } => {
                let choice = value
                    .as_str()
                    .ok_or_else(|| FieldErrorKind::invalid("must be one of the listed options"))?;
                if *required && !options.iter().any(|o| o == choice) {
                    return Err(FieldErrorKind::invalid(format!(
                        "must be one of: {}",
                        options.join(", ")
                    )));
                }
                Ok(Some(value.clone()))
            }
            Rule::Checkbox { .. } => match value {
                Value::Bool(_) => Ok(Some(value.clone())),
                _ => Err(FieldErrorKind::invalid("must be true or false")),
            },
            Rule::File {
                accept, max_bytes, ..
            } => {
                let text = value
                    .as_str()
                    .ok_or_else(|| FieldErrorKind::invalid("must be an encoded file"))?;
                check_file_value(text, accept, *max_bytes)?;
                Ok(Some(value.clone()))
            }
            Rule::Date { .. } => {
                let text = value
                    .as_str()
                    .ok_or_else(|| FieldErrorKind::invalid("must be an ISO-8601 date"))?;
                if is_iso_date(text) {
                    Ok(Some(value.clone()))
                } else {
                    Err(FieldErrorKind::invalid("must be an ISO-8601 date"))
                }
            }
            Rule::Override(o) => o.check(value).map(Some),
        }
    }

    fn absent(&self) -> std::result::Result<Option<Value>, FieldErrorKind> {
        if self.is_required() {
            let message = match self {
                Rule::Override(o) => o.rule.message().unwrap_or("is required"),
                _ => "is required",
            };
            return Err(FieldErrorKind::invalid(message));
        }
        match self {
            Rule::Checkbox { .. } => Ok(Some(Value::Bool(false))),
            _ => Ok(None),
        }
    }
}

/// Missing, `null` and `""` all count as "no value entered".
pub fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Coerce a JSON number or numeric string to `f64`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Render a coerced number, keeping integers integral.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_iso_date(text: &str) -> bool {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(text).is_ok()
}

/// Compiled rules for a descriptor set, keyed by field name in descriptor order.
#[derive(Debug, Clone, Default)]
pub struct ValidationSchema {
    rules: IndexMap<String, Rule>,
}

impl ValidationSchema {
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validate a single field.
    pub fn validate_field(
        &self,
        name: &str,
        value: Option<&Value>,
    ) -> std::result::Result<Option<Value>, FieldError> {
        let rule = self.rules.get(name).ok_or_else(|| {
            FieldError::new(name, FieldErrorKind::invalid("is not a field of this form"))
        })?;
        rule.check(value).map_err(|kind| FieldError::new(name, kind))
    }

    /// Validate every field of the schema against `values`.
    ///
    /// On success returns the cleaned values of all present fields; keys with
    /// no rule are dropped. On failure every failing field is reported.
    pub fn validate(&self, values: &ValueMap) -> std::result::Result<ValueMap, ValidationErrors> {
        let mut cleaned = ValueMap::new();
        let mut errors = ValidationErrors::new();
        for (name, rule) in &self.rules {
            match rule.check(values.get(name)) {
                Ok(Some(value)) => {
                    cleaned.insert(name.clone(), value);
                }
                Ok(None) => {}
                Err(kind) => errors.insert(FieldError::new(name.clone(), kind)),
            }
        }
        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(errors)
        }
    }
}

/// Compile a descriptor list into a validation schema.
///
/// Fails on an empty name, a duplicate name, or an override that cannot be
/// compiled. Never picks one of two colliding descriptors.
pub fn compile(descriptors: &[FieldDescriptor]) -> Result<ValidationSchema> {
    let mut seen = HashSet::new();
    let mut rules = IndexMap::with_capacity(descriptors.len());
    for descriptor in descriptors {
        if descriptor.name.is_empty() {
            return Err(FieldsError::EmptyFieldName {
                label: descriptor.label.clone(),
            });
        }
        if !seen.insert(descriptor.name.as_str()) {
            return Err(FieldsError::DuplicateFieldName {
                name: descriptor.name.clone(),
            });
        }
        rules.insert(descriptor.name.clone(), Rule::for_descriptor(descriptor)?);
    }
    debug!(fields = rules.len(), "compiled validation schema");
    Ok(ValidationSchema { rules })
}
