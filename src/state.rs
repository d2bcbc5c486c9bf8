//! Explicitly owned application context.
//!
//! Every component receives its collaborators from here at construction;
//! nothing reaches for a global.

use std::sync::Arc;

use crate::assistant::chat::ChatSession;
use crate::assistant::helpers::AssistantHelpers;
use crate::assistant::AssistantService;
use crate::capture::{CaptureController, Dispatcher, VoiceFeedback};
use crate::clock::Clock;
use crate::digest::DigestService;
use crate::models::task::TaskStatus;
use crate::persistence::event_repo::EventRepo;
use crate::persistence::kv_store::KeyValueStore;
use crate::persistence::note_repo::NoteRepo;
use crate::persistence::settings_repo::SettingsRepo;
use crate::persistence::task_repo::{StatusChange, TaskRepo};
use crate::quota::QuotaLedger;
use crate::reminders::{Celebration, ReminderCenter};
use crate::speech::{AudioSink, ManualRecognizer};
use crate::{GlobalConfig, Result};

/// External collaborators the core is built around.
pub struct Collaborators {
    /// Persisted key-value store.
    pub store: Arc<dyn KeyValueStore>,
    /// Generative model.
    pub assistant: Arc<dyn AssistantService>,
    /// Speech-to-text engine.
    pub recognizer: Arc<ManualRecognizer>,
    /// Speech output.
    pub sink: Arc<dyn AudioSink>,
    /// Wall clock.
    pub clock: Arc<dyn Clock>,
}

/// Shared application state handed to the control surface and tasks.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// Wall clock.
    pub clock: Arc<dyn Clock>,
    /// Daily token ledger.
    pub ledger: Arc<QuotaLedger>,
    /// Task store.
    pub tasks: TaskRepo,
    /// Note store.
    pub notes: NoteRepo,
    /// Event store.
    pub events: EventRepo,
    /// Settings store.
    pub settings: SettingsRepo,
    /// Speech-to-text engine fed by the control surface.
    pub recognizer: Arc<ManualRecognizer>,
    /// Capture interaction controller.
    pub capture: CaptureController,
    /// Active reminder slot.
    pub reminders: Arc<ReminderCenter>,
    /// Celebration effect shared by reminders and task completion.
    pub celebration: Arc<Celebration>,
    /// Quota-gated text helpers.
    pub helpers: AssistantHelpers,
    /// Persona chat.
    pub chat: ChatSession,
    /// Daily digest.
    pub digest: DigestService,
}

impl AppState {
    /// Wire every component from configuration and collaborators.
    #[must_use]
    pub fn assemble(config: Arc<GlobalConfig>, parts: Collaborators) -> Self {
        let Collaborators {
            store,
            assistant,
            recognizer,
            sink,
            clock,
        } = parts;

        let ledger = Arc::new(QuotaLedger::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.quota.clone(),
        ));
        let tasks = TaskRepo::new(Arc::clone(&store));
        let notes = NoteRepo::new(Arc::clone(&store));
        let events = EventRepo::new(Arc::clone(&store));
        let settings = SettingsRepo::new(Arc::clone(&store));
        let celebration = Arc::new(Celebration::new(config.celebration_duration()));

        let dispatcher = Dispatcher::new(
            Arc::clone(&assistant),
            Arc::clone(&clock),
            tasks.clone(),
            notes.clone(),
            events.clone(),
        );
        let voice = VoiceFeedback::new(
            Arc::clone(&assistant),
            Arc::clone(&ledger),
            settings.clone(),
            sink,
        );
        let capture = CaptureController::new(
            dispatcher,
            Arc::clone(&ledger),
            voice,
            Arc::clone(&recognizer) as Arc<dyn crate::speech::SpeechRecognizer>,
            config.capture.reset_delay(),
        );
        let reminders = Arc::new(ReminderCenter::new(
            events.clone(),
            Arc::clone(&clock),
            Arc::clone(&celebration),
            config.reminders.task_reminder_lead_minutes,
        ));
        let helpers = AssistantHelpers::new(Arc::clone(&assistant), Arc::clone(&ledger));
        let chat = ChatSession::new(assistant, Arc::clone(&ledger));
        let digest = DigestService::new(
            tasks.clone(),
            events.clone(),
            settings.clone(),
            Arc::clone(&clock),
        );

        Self {
            config,
            clock,
            ledger,
            tasks,
            notes,
            events,
            settings,
            recognizer,
            capture,
            reminders,
            celebration,
            helpers,
            chat,
            digest,
        }
    }

    /// Change a task's status, celebrating when it becomes completed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown task.
    pub async fn set_task_status(&self, id: &str, status: TaskStatus) -> Result<StatusChange> {
        let change = self.tasks.set_status(id, status).await?;
        if change.just_completed {
            self.celebration.raise();
        }
        Ok(change)
    }
}
