//! Task model and status helpers.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Progress of a task. Any status may follow any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Captured but not started.
    #[default]
    YetToStart,
    /// Being worked on.
    InProgress,
    /// Done.
    Completed,
}

impl TaskStatus {
    /// Parse the persisted kebab-case form.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "yet-to-start" => Some(Self::YetToStart),
            "in-progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Task urgency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// No urgency set.
    #[default]
    None,
    /// Low urgency.
    Low,
    /// Medium urgency.
    Medium,
    /// High urgency.
    High,
}

impl Priority {
    /// Parse the persisted lowercase form.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "none" => Some(Self::None),
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// A to-do item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique, immutable identifier.
    pub id: String,
    /// What needs doing.
    pub content: String,
    /// Current progress.
    pub status: TaskStatus,
    /// Urgency.
    #[serde(default)]
    pub priority: Priority,
    /// Optional due date.
    #[serde(
        default,
        with = "super::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
    /// Optional due time.
    #[serde(
        default,
        with = "super::hhmm::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_time: Option<NaiveTime>,
}

impl Task {
    /// Construct a new task in the `yet-to-start` state.
    #[must_use]
    pub fn new(
        content: String,
        priority: Priority,
        due_date: Option<NaiveDate>,
        due_time: Option<NaiveTime>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content,
            status: TaskStatus::YetToStart,
            priority,
            due_date,
            due_time,
        }
    }

    /// Whether the task still needs attention.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status != TaskStatus::Completed
    }
}
