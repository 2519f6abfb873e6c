//! Core descriptor types for declarative forms.
//!
//! All types serialize to/from YAML and JSON via serde. A field descriptor
//! describes one named, typed input; the kind carries whatever payload the
//! kind needs (choice options, file constraints).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Live or derived form values, keyed by field name in descriptor order.
pub type ValueMap = IndexMap<String, Value>;

/// Default byte limit for `file` fields that don't declare one (5 MiB).
pub const DEFAULT_FILE_MAX_BYTES: u64 = 5 * 1024 * 1024;

fn default_file_max_bytes() -> u64 {
    DEFAULT_FILE_MAX_BYTES
}

/// A single option in a select or radio field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// The kind of a field. Determines what shape the value takes and which
/// rule the schema compiler derives for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Number,
    Phone,
    Select {
        options: Vec<ChoiceOption>,
    },
    Radio {
        options: Vec<ChoiceOption>,
    },
    Checkbox,
    File {
        /// MIME types (`image/png`), wildcards (`image/*`) or extensions (`.pdf`).
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        accept: Vec<String>,
        #[serde(default = "default_file_max_bytes")]
        max_bytes: u64,
    },
    Date,
}

impl FieldKind {
    /// Every tag a serialized descriptor may carry under `type.kind`.
    pub const KIND_NAMES: &'static [&'static str] = &[
        "text", "number", "phone", "select", "radio", "checkbox", "file", "date",
    ];

    /// The serialized tag for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Phone => "phone",
            FieldKind::Select { .. } => "select",
            FieldKind::Radio { .. } => "radio",
            FieldKind::Checkbox => "checkbox",
            FieldKind::File { .. } => "file",
            FieldKind::Date => "date",
        }
    }

    /// Zero value used when no initial value is supplied. `None` means the
    /// key is left absent.
    pub fn zero_value(&self) -> Option<Value> {
        match self {
            FieldKind::Text
            | FieldKind::Phone
            | FieldKind::Select { .. }
            | FieldKind::Radio { .. }
            | FieldKind::Date => Some(Value::String(String::new())),
            FieldKind::Number => Some(Value::from(0)),
            FieldKind::Checkbox => Some(Value::Bool(false)),
            FieldKind::File { .. } => None,
        }
    }

    /// Options for choice kinds, empty for everything else.
    pub fn options(&self) -> &[ChoiceOption] {
        match self {
            FieldKind::Select { options } | FieldKind::Radio { options } => options,
            _ => &[],
        }
    }
}

/// Presentation grouping. Carries no validation meaning.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    #[default]
    Default,
    Other,
    Custom,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Default, Section::Other, Section::Custom];
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Section::Default => write!(f, "default"),
            Section::Other => write!(f, "other"),
            Section::Custom => write!(f, "custom"),
        }
    }
}

/// Layout hint for renderers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LayoutWidth {
    #[default]
    Full,
    Half,
    Third,
}

/// Where a descriptor came from. Submission partitions values on this tag.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldOrigin {
    #[default]
    Builtin,
    Custom,
}

/// Caller-supplied rule that replaces the kind-derived rule entirely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum OverrideRule {
    /// Value must be a string matching the regular expression.
    Pattern {
        pattern: String,
        #[serde(default)]
        required: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Value must coerce to a number within the bounds (inclusive).
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default)]
        required: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// String length in characters within the bounds (inclusive).
    Length {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
        #[serde(default)]
        required: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Value must equal one of the listed values.
    OneOf {
        values: Vec<Value>,
        #[serde(default)]
        required: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl OverrideRule {
    /// Shorthand for a required pattern rule.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        OverrideRule::Pattern {
            pattern: pattern.into(),
            required: true,
            message: None,
        }
    }

    pub fn is_required(&self) -> bool {
        match self {
            OverrideRule::Pattern { required, .. }
            | OverrideRule::Range { required, .. }
            | OverrideRule::Length { required, .. }
            | OverrideRule::OneOf { required, .. } => *required,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            OverrideRule::Pattern { message, .. }
            | OverrideRule::Range { message, .. }
            | OverrideRule::Length { message, .. }
            | OverrideRule::OneOf { message, .. } => message.as_deref(),
        }
    }
}

/// A field descriptor: the complete declarative description of one input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub section: Section,
    #[serde(default)]
    pub layout_width: LayoutWidth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_rule: Option<OverrideRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default)]
    pub origin: FieldOrigin,
}

impl FieldDescriptor {
    /// An optional, built-in, full-width descriptor in the default section.
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            section: Section::Default,
            layout_width: LayoutWidth::Full,
            override_rule: None,
            help_text: None,
            origin: FieldOrigin::Builtin,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn in_section(mut self, section: Section) -> Self {
        self.section = section;
        self
    }

    pub fn width(mut self, width: LayoutWidth) -> Self {
        self.layout_width = width;
        self
    }

    pub fn with_override(mut self, rule: OverrideRule) -> Self {
        self.override_rule = Some(rule);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help_text = Some(help.into());
        self
    }

    /// Mark as a user-added field: custom origin, custom section.
    pub fn into_custom(mut self) -> Self {
        self.origin = FieldOrigin::Custom;
        self.section = Section::Custom;
        self
    }

    pub fn is_custom(&self) -> bool {
        self.origin == FieldOrigin::Custom
    }
}
