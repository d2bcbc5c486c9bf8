//! Pending scheduling conflict awaiting a user pick.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use super::event::EventDraft;
use super::hhmm;
use crate::{AppError, Result};

/// Number of alternative slots the classifier is contracted to offer.
pub const SUGGESTION_COUNT: usize = 3;

/// A tentative event and the alternative slots offered for it.
///
/// Lives only for the duration of one capture interaction.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictInfo {
    /// Alternative `YYYY-MM-DD HH:MM` slots, in classifier order.
    pub suggestions: Vec<String>,
    /// The event as classified, before rescheduling.
    pub original_event_data: EventDraft,
}

impl ConflictInfo {
    /// Accept a conflict only when it carries exactly the contracted number
    /// of suggestions.
    #[must_use]
    pub fn from_suggestions(
        suggestions: Option<Vec<String>>,
        original_event_data: EventDraft,
    ) -> Option<Self> {
        match suggestions {
            Some(suggestions) if suggestions.len() == SUGGESTION_COUNT => Some(Self {
                suggestions,
                original_event_data,
            }),
            _ => None,
        }
    }

    /// Resolve suggestion `index` into the final draft.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` if the index is out of range or the
    /// slot string is not `YYYY-MM-DD HH:MM`.
    pub fn resolve(&self, index: usize) -> Result<EventDraft> {
        let slot = self.suggestions.get(index).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "suggestion {index} out of range (0..{})",
                self.suggestions.len()
            ))
        })?;
        let (date, time) = parse_slot(slot)?;
        Ok(self.original_event_data.clone().rescheduled(date, time))
    }
}

/// Split a `YYYY-MM-DD HH:MM` slot at its single separating space.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` if either half fails to parse.
pub fn parse_slot(slot: &str) -> Result<(NaiveDate, NaiveTime)> {
    let (date, time) = slot
        .trim()
        .split_once(' ')
        .ok_or_else(|| AppError::InvalidInput(format!("slot has no time part: {slot}")))?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|err| AppError::InvalidInput(format!("invalid slot date {date}: {err}")))?;
    let time = hhmm::parse(time)
        .ok_or_else(|| AppError::InvalidInput(format!("invalid slot time: {time}")))?;
    Ok((date, time))
}
