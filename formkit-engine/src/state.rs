use serde::{Deserialize, Serialize};

/// Lifecycle of a form engine
///
/// `Idle` only exists while the engine is being built. `Failed` and
/// `Success` hold until the next interaction, which moves back to `Editing`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    #[default]
    Idle,
    /// Accepting edits
    Editing,
    /// Waiting on the submit handler
    Submitting,
    /// Last submission was accepted; values were reset
    Success,
    /// Last submission was rejected; values were kept
    Failed,
}

impl std::fmt::Display for FormState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FormState::Idle => "idle",
            FormState::Editing => "editing",
            FormState::Submitting => "submitting",
            FormState::Success => "success",
            FormState::Failed => "failed",
        };
        f.write_str(name)
    }
}
