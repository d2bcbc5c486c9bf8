//! Persisted daily token allowance.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Remaining units for the day and the day they were granted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuotaState {
    /// Units left today.
    pub count: u32,
    /// Calendar day the allowance was last refilled.
    #[serde(rename = "lastReset")]
    pub last_reset_date: NaiveDate,
}

impl QuotaState {
    /// A full allowance granted on `today`.
    #[must_use]
    pub fn fresh(allowance: u32, today: NaiveDate) -> Self {
        Self {
            count: allowance,
            last_reset_date: today,
        }
    }

    /// Whether the allowance belongs to an earlier day.
    #[must_use]
    pub fn is_stale(&self, today: NaiveDate) -> bool {
        self.last_reset_date != today
    }
}
