//! Capture pipeline: transcript in, records (or a conflict pick) out.

pub mod dispatcher;
pub mod feedback;
pub mod machine;
pub mod pump;

use serde::Serialize;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use feedback::VoiceFeedback;
pub use machine::CaptureController;
pub use pump::spawn_recognition_pump;

/// Where the current capture interaction stands.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureStatus {
    /// Waiting for the user.
    Idle,
    /// Recording an utterance.
    Listening,
    /// Debiting, classifying and writing records.
    Processing,
    /// Playing spoken feedback; returns to the state that started it.
    Speaking,
    /// Records were written.
    Success,
    /// The interaction failed; shown until the reset delay passes.
    Error,
    /// Waiting for the user to pick an alternative slot or cancel.
    Conflict,
}

/// Externally visible state of the capture interaction.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSnapshot {
    /// Current state.
    pub status: CaptureStatus,
    /// User-facing status line.
    pub feedback: String,
    /// Alternative slots while a conflict is pending.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}
