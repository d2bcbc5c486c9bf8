//! Once-a-day overview of open tasks and today's events.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::clock::Clock;
use crate::models::event::Event;
use crate::models::task::Task;
use crate::persistence::event_repo::EventRepo;
use crate::persistence::settings_repo::SettingsRepo;
use crate::persistence::task_repo::TaskRepo;
use crate::Result;

/// What needs attention today.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyDigest {
    /// Day the digest covers.
    pub date: NaiveDate,
    /// Tasks not yet completed.
    pub open_tasks: Vec<Task>,
    /// Events starting today.
    pub todays_events: Vec<Event>,
}

/// Produces the digest at most once per calendar day.
pub struct DigestService {
    tasks: TaskRepo,
    events: EventRepo,
    settings: SettingsRepo,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl DigestService {
    /// Create a digest service.
    #[must_use]
    pub fn new(
        tasks: TaskRepo,
        events: EventRepo,
        settings: SettingsRepo,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tasks,
            events,
            settings,
            clock,
            lock: Mutex::new(()),
        }
    }

    /// Today's digest, unless one was already produced today or there is
    /// nothing to report.
    ///
    /// Producing a digest records today as shown; an empty day does not.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if a store read or the marker write fails.
    pub async fn check(&self) -> Result<Option<DailyDigest>> {
        let _guard = self.lock.lock().await;
        let today = self.clock.today();
        if self.settings.last_digest_date().await? == Some(today) {
            return Ok(None);
        }

        let open_tasks = self.tasks.open_tasks().await?;
        let todays_events = self.events.on_date(today).await?;
        if open_tasks.is_empty() && todays_events.is_empty() {
            return Ok(None);
        }

        self.settings.set_last_digest_date(today).await?;
        info!(
            %today,
            open_tasks = open_tasks.len(),
            events = todays_events.len(),
            "daily digest produced"
        );
        Ok(Some(DailyDigest {
            date: today,
            open_tasks,
            todays_events,
        }))
    }
}
