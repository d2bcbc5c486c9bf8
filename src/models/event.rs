//! Calendar event model, reminder due-detection, and drafts.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of calendar entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    /// Meeting with others.
    #[default]
    Meeting,
    /// Appointment.
    Appointment,
    /// Plain reminder.
    Reminder,
    /// Anything else.
    Other,
    /// Someone's birthday.
    Birthday,
    /// An anniversary.
    Anniversary,
    /// Any other date worth celebrating.
    ImportantDate,
}

impl EventType {
    /// Parse the persisted kebab-case form.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "meeting" => Some(Self::Meeting),
            "appointment" => Some(Self::Appointment),
            "reminder" => Some(Self::Reminder),
            "other" => Some(Self::Other),
            "birthday" => Some(Self::Birthday),
            "anniversary" => Some(Self::Anniversary),
            "important-date" => Some(Self::ImportantDate),
            _ => None,
        }
    }

    /// Types that come with a celebration effect.
    #[must_use]
    pub fn is_celebration(self) -> bool {
        matches!(
            self,
            Self::Birthday | Self::Anniversary | Self::ImportantDate
        )
    }

    /// Types the reminder scheduler watches.
    #[must_use]
    pub fn raises_reminder(self) -> bool {
        matches!(
            self,
            Self::Reminder | Self::Birthday | Self::Anniversary | Self::ImportantDate
        )
    }
}

/// An event that has not been given an identifier yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    /// Display title.
    pub title: String,
    /// Kind of entry.
    pub event_type: EventType,
    /// Whether the event spans the whole day.
    #[serde(default)]
    pub all_day: bool,
    /// First day of the event.
    pub start_date: NaiveDate,
    /// Start time; absent only for all-day events.
    #[serde(
        default,
        with = "super::hhmm::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<NaiveTime>,
    /// Last day of the event.
    #[serde(
        default,
        with = "super::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<NaiveDate>,
    /// End time.
    #[serde(
        default,
        with = "super::hhmm::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<NaiveTime>,
    /// Where it happens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-form details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Derived from `event_type` when the draft is built; never recomputed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub celebration: Option<bool>,
}

impl EventDraft {
    /// Build a timed, single-day draft and derive its celebration flag.
    #[must_use]
    pub fn new(
        title: String,
        event_type: EventType,
        start_date: NaiveDate,
        start_time: Option<NaiveTime>,
    ) -> Self {
        Self {
            title,
            event_type,
            all_day: false,
            start_date,
            start_time,
            end_date: None,
            end_time: None,
            location: None,
            description: None,
            celebration: Some(event_type.is_celebration()),
        }
    }

    /// Move the draft to another slot, keeping every other field.
    #[must_use]
    pub fn rescheduled(mut self, start_date: NaiveDate, start_time: NaiveTime) -> Self {
        self.start_date = start_date;
        self.start_time = Some(start_time);
        self
    }

    /// Assign a fresh identifier.
    #[must_use]
    pub fn into_event(self) -> Event {
        Event {
            id: Uuid::new_v4().to_string(),
            title: self.title,
            event_type: self.event_type,
            all_day: self.all_day,
            start_date: self.start_date,
            start_time: self.start_time,
            end_date: self.end_date,
            end_time: self.end_time,
            location: self.location,
            description: self.description,
            triggered: None,
            celebration: self.celebration,
        }
    }
}

/// A persisted calendar entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique, immutable identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Kind of entry.
    pub event_type: EventType,
    /// Whether the event spans the whole day.
    #[serde(default)]
    pub all_day: bool,
    /// First day of the event.
    pub start_date: NaiveDate,
    /// Start time; absent only for all-day events.
    #[serde(
        default,
        with = "super::hhmm::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<NaiveTime>,
    /// Last day of the event.
    #[serde(
        default,
        with = "super::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<NaiveDate>,
    /// End time.
    #[serde(
        default,
        with = "super::hhmm::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<NaiveTime>,
    /// Where it happens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-form details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set once the user has dismissed the reminder for this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered: Option<bool>,
    /// Whether the reminder comes with a celebration effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub celebration: Option<bool>,
}

impl Event {
    /// Instant the event starts. All-day events start at midnight.
    #[must_use]
    pub fn starts_at(&self) -> NaiveDateTime {
        self.start_date
            .and_time(self.start_time.unwrap_or(NaiveTime::MIN))
    }

    /// Whether the reminder for this event has already been acknowledged.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered == Some(true)
    }

    /// Whether the event's reminder should be raised at `now`.
    #[must_use]
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.event_type.raises_reminder() && !self.is_triggered() && self.starts_at() <= now
    }

    /// Whether a celebration effect accompanies the reminder.
    #[must_use]
    pub fn celebrates(&self) -> bool {
        self.celebration == Some(true)
    }
}

/// The projection of an event handed to the classifier as context.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    /// Display title.
    pub title: String,
    /// First day of the event.
    pub start_date: NaiveDate,
    /// Start time, if any.
    #[serde(with = "super::hhmm::option")]
    pub start_time: Option<NaiveTime>,
}

impl From<&Event> for CalendarEntry {
    fn from(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            start_date: event.start_date,
            start_time: event.start_time,
        }
    }
}
