//! Maps classifier output onto record-store mutations.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{info, warn};

use crate::assistant::AssistantService;
use crate::clock::Clock;
use crate::models::classification::{ClassificationResult, ClassificationType, ExtractedItem};
use crate::models::conflict::ConflictInfo;
use crate::models::event::{CalendarEntry, Event, EventDraft};
use crate::models::hhmm;
use crate::models::note::{Note, QUICK_CAPTURE_TAG};
use crate::models::task::Task;
use crate::persistence::event_repo::EventRepo;
use crate::persistence::note_repo::NoteRepo;
use crate::persistence::task_repo::TaskRepo;
use crate::Result;

/// Title of the note saved from a capture summary.
pub const SUMMARY_NOTE_TITLE: &str = "Summary of capture";

const DEFAULT_TASK_CONTENT: &str = "New Task";
const DEFAULT_NOTE_TITLE: &str = "New Note";
const DEFAULT_EVENT_TITLE: &str = "New Event";
const UNCLASSIFIED_FEEDBACK: &str = "Could not classify intent";

/// What applying a classification produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Records were written; `feedback` describes them.
    Completed {
        /// User-facing summary such as `Task created!`.
        feedback: String,
    },
    /// An event collided with the calendar and awaits a slot pick.
    Conflict(ConflictInfo),
}

/// Classifier wrapper plus the mapping onto tasks, notes and events.
#[derive(Clone)]
pub struct Dispatcher {
    service: Arc<dyn AssistantService>,
    clock: Arc<dyn Clock>,
    tasks: TaskRepo,
    notes: NoteRepo,
    events: EventRepo,
}

impl Dispatcher {
    /// Create a dispatcher writing to the given repositories.
    #[must_use]
    pub fn new(
        service: Arc<dyn AssistantService>,
        clock: Arc<dyn Clock>,
        tasks: TaskRepo,
        notes: NoteRepo,
        events: EventRepo,
    ) -> Self {
        Self {
            service,
            clock,
            tasks,
            notes,
            events,
        }
    }

    /// Classify a transcript with the current calendar as context.
    ///
    /// Never fails: an unreachable or confused classifier yields an
    /// `unknown` result carrying the transcript.
    pub async fn classify(&self, transcript: &str) -> ClassificationResult {
        let calendar: Vec<CalendarEntry> = match self.events.list().await {
            Ok(events) => events.iter().map(CalendarEntry::from).collect(),
            Err(err) => {
                warn!(%err, "could not load calendar context");
                Vec::new()
            }
        };

        match self
            .service
            .classify(transcript, &calendar, self.clock.today())
            .await
        {
            Ok(result) => {
                info!(kind = ?result.kind, items = result.data.len(), "capture classified");
                result
            }
            Err(err) => {
                warn!(%err, "classification failed, treating as unknown");
                ClassificationResult::unknown_for(transcript)
            }
        }
    }

    /// Apply a classification to the stores.
    ///
    /// # Errors
    ///
    /// Returns a store error if a write fails. Records written before the
    /// failing one are kept.
    pub async fn apply(&self, result: &ClassificationResult) -> Result<DispatchOutcome> {
        let mut messages: Vec<String> = Vec::new();

        if !result.summary.trim().is_empty() {
            let note = Note::new(
                SUMMARY_NOTE_TITLE.to_owned(),
                result.summary.clone(),
                vec![QUICK_CAPTURE_TAG.to_owned()],
                None,
            );
            self.notes.prepend(note).await?;
            messages.push("Summary saved to notes".to_owned());
        }

        match result.kind {
            ClassificationType::Task => {
                self.tasks.create(task_from(&result.first_item())).await?;
                messages.push("Task created".to_owned());
            }
            ClassificationType::MultiTask => {
                let mut tasks: Vec<Task> = result.data.iter().map(task_from).collect();
                if tasks.is_empty() {
                    tasks.push(task_from(&result.first_item()));
                }
                let created = self.tasks.prepend_many(tasks).await?;
                messages.push(match created.len() {
                    1 => "Task created".to_owned(),
                    n => format!("{n} tasks created"),
                });
            }
            ClassificationType::Note => {
                let item = result.first_item();
                let note = Note::new(
                    non_blank(item.title).unwrap_or_else(|| DEFAULT_NOTE_TITLE.to_owned()),
                    item.content.unwrap_or_default(),
                    Vec::new(),
                    None,
                );
                self.notes.prepend(note).await?;
                messages.push("Note created".to_owned());
            }
            ClassificationType::Event => {
                let item = result.first_item();
                let draft = self.event_draft_from(&item);
                if item.conflict == Some(true) {
                    if let Some(conflict) = ConflictInfo::from_suggestions(item.suggestions, draft.clone()) {
                        info!(title = %draft.title, "scheduling conflict reported");
                        return Ok(DispatchOutcome::Conflict(conflict));
                    }
                    warn!(title = %draft.title, "conflict reported without three suggestions, scheduling as requested");
                }
                self.events.append(draft).await?;
                messages.push("Event created".to_owned());
            }
            ClassificationType::Unknown => {
                messages.push(UNCLASSIFIED_FEEDBACK.to_owned());
            }
        }

        Ok(DispatchOutcome::Completed {
            feedback: format!("{}!", messages.join(" & ")),
        })
    }

    /// Persist an event resolved from a conflict.
    ///
    /// # Errors
    ///
    /// Returns a store error if the write fails.
    pub async fn persist_event(&self, draft: EventDraft) -> Result<Event> {
        self.events.append(draft).await
    }

    fn event_draft_from(&self, item: &ExtractedItem) -> EventDraft {
        let start_date = item
            .date
            .as_deref()
            .and_then(parse_date)
            .unwrap_or_else(|| self.clock.today());
        let start_time = item
            .time
            .as_deref()
            .and_then(hhmm::parse)
            .unwrap_or(NOON);
        EventDraft::new(
            non_blank(item.title.clone()).unwrap_or_else(|| DEFAULT_EVENT_TITLE.to_owned()),
            item.event_type.unwrap_or_default(),
            start_date,
            Some(start_time),
        )
    }
}

const NOON: NaiveTime = match NaiveTime::from_hms_opt(12, 0, 0) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

fn task_from(item: &ExtractedItem) -> Task {
    let content = non_blank(item.content.clone())
        .or_else(|| non_blank(item.title.clone()))
        .unwrap_or_else(|| DEFAULT_TASK_CONTENT.to_owned());
    Task::new(
        content,
        item.priority.unwrap_or_default(),
        item.date.as_deref().and_then(parse_date),
        item.time.as_deref().and_then(hhmm::parse),
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let parsed = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok();
    if parsed.is_none() && !raw.trim().is_empty() {
        warn!(raw, "ignoring unparseable date from classifier");
    }
    parsed
}
