//! Event collection repository.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::models::event::{Event, EventDraft};
use crate::{AppError, Result};

use super::collection::Collection;
use super::kv_store::KeyValueStore;

/// Store key for the event list.
pub const EVENTS_KEY: &str = "events";

/// Repository over the persisted event list.
///
/// Captured events are appended in arrival order; manually entered events
/// keep the list ordered by start date. The reminder poller relies on
/// whatever order results.
#[derive(Clone)]
pub struct EventRepo {
    events: Collection<Event>,
}

impl EventRepo {
    /// Create a new repository over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            events: Collection::new(store, EVENTS_KEY),
        }
    }

    /// All events in store order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store cannot be read.
    pub async fn list(&self) -> Result<Vec<Event>> {
        self.events.load().await
    }

    /// Look up one event.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no event has this id.
    pub async fn get(&self, id: &str) -> Result<Event> {
        self.list()
            .await?
            .into_iter()
            .find(|event| event.id == id)
            .ok_or_else(|| AppError::NotFound(format!("event {id}")))
    }

    /// Assign an id and append at the end of the list.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    pub async fn append(&self, draft: EventDraft) -> Result<Event> {
        let event = draft.into_event();
        let created = event.clone();
        self.events
            .mutate(move |items| {
                items.push(event);
                Ok(())
            })
            .await?;
        info!(event_id = %created.id, event_type = ?created.event_type, "event created");
        Ok(created)
    }

    /// Create a manually entered event and re-sort the list by start date.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` if the title is blank or a timed
    /// event has no start time.
    pub async fn create_sorted(&self, mut draft: EventDraft) -> Result<Event> {
        validate(&draft)?;
        draft.celebration = Some(draft.event_type.is_celebration());
        let event = draft.into_event();
        let created = event.clone();
        self.events
            .mutate(move |items| {
                items.push(event);
                sort_by_start_date(items);
                Ok(())
            })
            .await?;
        info!(event_id = %created.id, event_type = ?created.event_type, "event created");
        Ok(created)
    }

    /// Replace an event's fields, keeping its id, celebration flag and
    /// triggered marker.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id or
    /// `AppError::InvalidInput` for an invalid draft.
    pub async fn update(&self, id: &str, draft: EventDraft) -> Result<Event> {
        validate(&draft)?;
        self.events
            .mutate(|items| {
                let event = find_mut(items, id)?;
                event.title = draft.title;
                event.event_type = draft.event_type;
                event.all_day = draft.all_day;
                event.start_date = draft.start_date;
                event.start_time = draft.start_time;
                event.end_date = draft.end_date;
                event.end_time = draft.end_time;
                event.location = draft.location;
                event.description = draft.description;
                let updated = event.clone();
                sort_by_start_date(items);
                Ok(updated)
            })
            .await
    }

    /// Remove an event.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.events
            .mutate(|items| {
                let before = items.len();
                items.retain(|event| event.id != id);
                if items.len() == before {
                    return Err(AppError::NotFound(format!("event {id}")));
                }
                Ok(())
            })
            .await?;
        info!(event_id = id, "event deleted");
        Ok(())
    }

    /// Permanently mark an event's reminder as acknowledged.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the event no longer exists.
    pub async fn mark_triggered(&self, id: &str) -> Result<Event> {
        self.events
            .mutate(|items| {
                let event = find_mut(items, id)?;
                event.triggered = Some(true);
                Ok(event.clone())
            })
            .await
    }

    /// Events starting on `date`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store cannot be read.
    pub async fn on_date(&self, date: NaiveDate) -> Result<Vec<Event>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|event| event.start_date == date)
            .collect())
    }

    /// Events whose title contains `term`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store cannot be read.
    pub async fn search(&self, term: &str) -> Result<Vec<Event>> {
        let term = term.to_lowercase();
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|event| event.title.to_lowercase().contains(&term))
            .collect())
    }
}

fn validate(draft: &EventDraft) -> Result<()> {
    if draft.title.trim().is_empty() {
        return Err(AppError::InvalidInput("event title is empty".into()));
    }
    if !draft.all_day && draft.start_time.is_none() {
        return Err(AppError::InvalidInput(
            "timed event needs a start time".into(),
        ));
    }
    Ok(())
}

// Stable, so same-day events keep their relative order.
fn sort_by_start_date(items: &mut [Event]) {
    items.sort_by_key(|event| event.start_date);
}

fn find_mut<'a>(items: &'a mut [Event], id: &str) -> Result<&'a mut Event> {
    items
        .iter_mut()
        .find(|event| event.id == id)
        .ok_or_else(|| AppError::NotFound(format!("event {id}")))
}
