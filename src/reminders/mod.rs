//! Reminder detection, presentation, and acknowledgement.
//!
//! At most one reminder is active. The poller takes the first due event in
//! store order; anything else that is due waits until the active one is
//! dismissed.

pub mod celebration;
pub mod scheduler;

use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::models::event::{Event, EventDraft, EventType};
use crate::models::hhmm;
use crate::models::task::Task;
use crate::persistence::event_repo::EventRepo;
use crate::{AppError, Result};

pub use celebration::Celebration;
pub use scheduler::spawn_reminder_scheduler;

/// How the active reminder is presented.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderView {
    /// Event being presented.
    pub event_id: String,
    /// Heading chosen by event type.
    pub title: String,
    /// Body text.
    pub body: String,
    /// `Scheduled for: HH:MM`.
    pub scheduled_for: String,
    /// Whether the celebration effect is showing.
    pub celebrating: bool,
}

impl ReminderView {
    fn new(event: &Event, celebrating: bool) -> Self {
        let title = match event.event_type {
            EventType::Birthday => format!("🎉 Happy Birthday, {}!", event.title),
            EventType::Anniversary => "💖 Happy Anniversary!".to_owned(),
            EventType::ImportantDate => format!("🌟 Important: {}", event.title),
            _ => format!("Reminder: {}", event.title),
        };
        let body = event
            .description
            .clone()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| format!("This is your scheduled reminder for \"{}\".", event.title));
        let time = event
            .start_time
            .map_or_else(|| "All day".to_owned(), |time| time.format("%H:%M").to_string());
        Self {
            event_id: event.id.clone(),
            title,
            body,
            scheduled_for: format!("Scheduled for: {time}"),
            celebrating,
        }
    }
}

/// Owner of the single active-reminder slot.
pub struct ReminderCenter {
    events: EventRepo,
    clock: Arc<dyn Clock>,
    celebration: Arc<Celebration>,
    task_lead: Duration,
    active: Mutex<Option<Event>>,
}

impl ReminderCenter {
    /// Create a center with no active reminder.
    #[must_use]
    pub fn new(
        events: EventRepo,
        clock: Arc<dyn Clock>,
        celebration: Arc<Celebration>,
        task_lead_minutes: i64,
    ) -> Self {
        Self {
            events,
            clock,
            celebration,
            task_lead: Duration::minutes(task_lead_minutes),
            active: Mutex::new(None),
        }
    }

    /// One poll: activate the first due reminder if the slot is free.
    ///
    /// Returns the newly activated event, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the event store cannot be read.
    pub async fn tick(&self) -> Result<Option<Event>> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Ok(None);
        }

        let now = self.clock.now();
        let due = self
            .events
            .list()
            .await?
            .into_iter()
            .find(|event| event.is_due(now));

        let Some(event) = due else {
            return Ok(None);
        };
        info!(event_id = %event.id, event_type = ?event.event_type, "reminder due");
        if event.celebrates() {
            self.celebration.raise();
        }
        *active = Some(event.clone());
        Ok(Some(event))
    }

    /// Acknowledge the active reminder so it never fires again.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidState` if nothing is active or
    /// `AppError::Db` if the store write fails (the reminder stays active).
    pub async fn dismiss(&self) -> Result<Event> {
        let mut active = self.active.lock().await;
        let Some(event) = active.as_ref() else {
            return Err(AppError::InvalidState("no active reminder".into()));
        };

        let dismissed = match self.events.mark_triggered(&event.id).await {
            Ok(updated) => updated,
            Err(AppError::NotFound(_)) => {
                warn!(event_id = %event.id, "active reminder was deleted before dismissal");
                event.clone()
            }
            Err(err) => return Err(err),
        };
        *active = None;
        self.celebration.clear();
        info!(event_id = %dismissed.id, "reminder dismissed");
        Ok(dismissed)
    }

    /// Presentation of the active reminder, if any.
    pub async fn active(&self) -> Option<ReminderView> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|event| ReminderView::new(event, self.celebration.is_active()))
    }

    /// Schedule a reminder for `task` a fixed lead time from now.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the event cannot be saved.
    pub async fn remind_for_task(&self, task: &Task) -> Result<Event> {
        let due = self.clock.now() + self.task_lead;
        let mut draft = EventDraft::new(
            format!("Reminder: {}", task.content),
            EventType::Reminder,
            due.date(),
            Some(hhmm::whole_minute(due.time())),
        );
        draft.description = Some(format!(
            "This is a reminder for your task: \"{}\"",
            task.content
        ));
        let event = self.events.append(draft).await?;
        info!(task_id = %task.id, event_id = %event.id, "task reminder scheduled");
        Ok(event)
    }
}
