//! Note model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag applied to notes generated from a capture summary.
pub const QUICK_CAPTURE_TAG: &str = "quick-capture";

/// A free-form note.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique, immutable identifier.
    pub id: String,
    /// Short heading.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub content: String,
    /// Distinct labels in insertion order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Attached image as a data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Note {
    /// Construct a new note, dropping duplicate and blank tags.
    #[must_use]
    pub fn new(title: String, content: String, tags: Vec<String>, image: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            tags: dedup_tags(tags),
            image,
        }
    }

    /// Whether `term` appears in the title, content, or any tag
    /// (case-insensitive).
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.content.to_lowercase().contains(&term)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
    }
}

/// Keep the first occurrence of every non-blank tag.
#[must_use]
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_owned();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
