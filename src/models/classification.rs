//! Structured result returned by the intent classifier.

use serde::{Deserialize, Serialize};

use super::event::EventType;
use super::task::Priority;

/// Primary intent detected in a capture.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationType {
    /// A single task.
    Task,
    /// Several distinct tasks.
    MultiTask,
    /// A note.
    Note,
    /// A calendar event.
    Event,
    /// Nothing recognisable.
    #[default]
    #[serde(other)]
    Unknown,
}

/// One item extracted from the capture.
///
/// `date` and `time` stay as the classifier's strings; they are parsed when
/// the item is mapped onto a record so a bad value only loses that field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedItem {
    /// Title of a task, note, or event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body of a task or note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// `HH:MM`, 24-hour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Task urgency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Event kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    /// The requested slot collides with an existing event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<bool>,
    /// Alternative `YYYY-MM-DD HH:MM` slots offered on conflict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

impl ExtractedItem {
    /// An item carrying only `content`.
    #[must_use]
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

/// Full classifier response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ClassificationResult {
    /// Primary intent.
    #[serde(rename = "type", default)]
    pub kind: ClassificationType,
    /// Concise summary of the capture; saved as a note when non-empty.
    #[serde(default)]
    pub summary: String,
    /// Extracted items in classifier order.
    #[serde(default)]
    pub data: Vec<ExtractedItem>,
}

impl ClassificationResult {
    /// Degraded result used when the classifier cannot be reached or
    /// answers with something unparseable.
    #[must_use]
    pub fn unknown_for(transcript: &str) -> Self {
        Self {
            kind: ClassificationType::Unknown,
            summary: format!("Could not process the request: \"{transcript}\""),
            data: vec![ExtractedItem::with_content(transcript)],
        }
    }

    /// First extracted item, or an empty one.
    #[must_use]
    pub fn first_item(&self) -> ExtractedItem {
        self.data.first().cloned().unwrap_or_default()
    }
}
