//! Capture interaction state machine.
//!
//! One interaction runs at a time. The state lock is only held for
//! bookkeeping and never across classification or speech playback, so
//! status queries are not blocked by a capture in flight. The reminder
//! poller shares nothing with this module.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::models::conflict::ConflictInfo;
use crate::models::event::Event;
use crate::quota::QuotaLedger;
use crate::speech::{RecognitionEvent, SpeechRecognizer};
use crate::{AppError, Result};

use super::dispatcher::{DispatchOutcome, Dispatcher};
use super::feedback::VoiceFeedback;
use super::{CaptureSnapshot, CaptureStatus};

/// Status line while idle.
pub const IDLE_PROMPT: &str =
    "Tap the mic and speak your thoughts. I'll help organize them intelligently.";
/// Status line while recording.
pub const LISTENING_PROMPT: &str = "I'm listening...";
/// Status line while classifying.
pub const THINKING_PROMPT: &str = "Thinking...";
/// Shown when a capture cannot start for lack of tokens.
pub const START_NO_TOKENS: &str = "You don't have enough tokens for Quick Capture today.";
/// Shown when the classification debit is refused.
pub const PROCESS_NO_TOKENS: &str = "You don't have enough tokens to process that request.";
/// Shown when the pipeline fails after classification.
pub const CLASSIFY_FAILED: &str = "An error occurred during classification.";
/// Spoken when the classifier reports a scheduling conflict.
pub const CONFLICT_PROMPT: &str = "This time is busy. How about one of these instead?";
/// Spoken after an alternative slot is booked.
pub const RESCHEDULED: &str = "Great, event scheduled for the new time!";
/// Shown when the rescheduled event cannot be saved.
pub const RESCHEDULE_FAILED: &str = "Sorry, the event could not be saved.";
/// Shown when the host has no recognition engine.
pub const ENGINE_UNAVAILABLE: &str = "Sorry, speech recognition is not available on this device.";

struct Interaction {
    status: CaptureStatus,
    feedback: String,
    conflict: Option<ConflictInfo>,
    /// Bumped whenever a new interaction begins; pending resets compare it.
    generation: u64,
}

impl Interaction {
    fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            status: self.status,
            feedback: self.feedback.clone(),
            suggestions: self
                .conflict
                .as_ref()
                .map(|conflict| conflict.suggestions.clone())
                .unwrap_or_default(),
        }
    }

    fn set(&mut self, status: CaptureStatus, feedback: &str) {
        self.status = status;
        self.feedback = feedback.to_owned();
    }

    fn reset(&mut self) {
        self.set(CaptureStatus::Idle, IDLE_PROMPT);
        self.conflict = None;
    }

    fn can_start(&self) -> bool {
        matches!(
            self.status,
            CaptureStatus::Idle | CaptureStatus::Error | CaptureStatus::Success
        )
    }
}

struct Inner {
    state: Mutex<Interaction>,
    dispatcher: Dispatcher,
    ledger: Arc<QuotaLedger>,
    voice: VoiceFeedback,
    recognizer: Arc<dyn SpeechRecognizer>,
    reset_delay: Duration,
}

/// Drives one capture interaction at a time from input to idle.
#[derive(Clone)]
pub struct CaptureController {
    inner: Arc<Inner>,
}

impl CaptureController {
    /// Create an idle controller.
    #[must_use]
    pub fn new(
        dispatcher: Dispatcher,
        ledger: Arc<QuotaLedger>,
        voice: VoiceFeedback,
        recognizer: Arc<dyn SpeechRecognizer>,
        reset_delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(Interaction {
                    status: CaptureStatus::Idle,
                    feedback: IDLE_PROMPT.to_owned(),
                    conflict: None,
                    generation: 0,
                }),
                dispatcher,
                ledger,
                voice,
                recognizer,
                reset_delay,
            }),
        }
    }

    /// Current state of the interaction.
    pub async fn snapshot(&self) -> CaptureSnapshot {
        self.lock().await.snapshot()
    }

    /// The microphone button: start listening, or stop if already listening.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EngineUnavailable` when there is no recognizer,
    /// `AppError::InvalidState` while an interaction is being processed or
    /// awaits a conflict pick, or `AppError::Db` if the ledger cannot be read.
    pub async fn toggle(&self) -> Result<CaptureSnapshot> {
        if !self.inner.recognizer.is_available() {
            let mut state = self.lock().await;
            // A capture already in flight keeps its status.
            if state.can_start() {
                state.set(CaptureStatus::Error, ENGINE_UNAVAILABLE);
            }
            return Err(AppError::EngineUnavailable(ENGINE_UNAVAILABLE.into()));
        }

        let mut state = self.lock().await;
        if state.status == CaptureStatus::Listening {
            drop(state);
            self.inner.recognizer.stop()?;
            return Ok(self.snapshot().await);
        }
        if !state.can_start() {
            return Err(AppError::InvalidState(
                "a capture is already in progress".into(),
            ));
        }

        let cost = self.inner.ledger.costs().capture_cost;
        let remaining = self.inner.ledger.remaining().await?;
        state.generation += 1;
        state.conflict = None;
        if remaining < cost {
            info!(remaining, cost, "capture refused, not enough tokens");
            state.set(CaptureStatus::Error, START_NO_TOKENS);
            let generation = state.generation;
            let snapshot = state.snapshot();
            drop(state);
            self.schedule_reset(generation);
            return Ok(snapshot);
        }

        self.inner.recognizer.start()?;
        state.set(CaptureStatus::Listening, LISTENING_PROMPT);
        debug!(generation = state.generation, "capture listening");
        Ok(state.snapshot())
    }

    /// Run the pipeline on typed text, bypassing the recognizer.
    ///
    /// Resolves once the interaction has reached `success`, `error`, or
    /// `conflict`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` for blank text or
    /// `AppError::InvalidState` if another interaction is active.
    pub async fn capture_text(&self, text: &str) -> Result<CaptureSnapshot> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput("capture text is empty".into()));
        }
        {
            let mut state = self.lock().await;
            if !state.can_start() {
                return Err(AppError::InvalidState(
                    "a capture is already in progress".into(),
                ));
            }
            state.generation += 1;
            state.conflict = None;
            state.set(CaptureStatus::Processing, THINKING_PROMPT);
        }
        self.process(text).await;
        Ok(self.snapshot().await)
    }

    /// React to the recognizer. Events that arrive outside `listening`
    /// are stale and ignored.
    pub async fn handle_recognition(&self, event: RecognitionEvent) {
        let mut state = self.lock().await;
        if state.status != CaptureStatus::Listening {
            debug!(?event, status = ?state.status, "ignoring stale recognition event");
            return;
        }

        match event {
            RecognitionEvent::Transcript(text) if !text.trim().is_empty() => {
                state.set(CaptureStatus::Processing, THINKING_PROMPT);
                drop(state);
                self.process(&text).await;
            }
            RecognitionEvent::Transcript(_) | RecognitionEvent::Ended => {
                state.reset();
            }
            RecognitionEvent::Error(code) if code.is_capability_error() => {
                warn!(%code, "speech recognition unavailable");
                state.set(CaptureStatus::Error, &code.user_message());
                let generation = state.generation;
                drop(state);
                self.schedule_reset(generation);
            }
            RecognitionEvent::Error(code) => {
                info!(%code, "speech recognition ended without a result");
                state.reset();
            }
        }
    }

    /// Book suggestion `index` of the pending conflict.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidState` if no conflict is pending,
    /// `AppError::InvalidInput` for a bad index or slot (the conflict stays
    /// pending), or the store error if the event cannot be saved.
    pub async fn select_suggestion(&self, index: usize) -> Result<Event> {
        let draft = {
            let mut state = self.lock().await;
            let conflict = match (&state.status, &state.conflict) {
                (CaptureStatus::Conflict, Some(conflict)) => conflict,
                _ => {
                    return Err(AppError::InvalidState(
                        "no scheduling conflict is pending".into(),
                    ))
                }
            };
            let draft = conflict.resolve(index)?;
            state.conflict = None;
            state.set(CaptureStatus::Processing, THINKING_PROMPT);
            draft
        };

        match self.inner.dispatcher.persist_event(draft).await {
            Ok(event) => {
                info!(event_id = %event.id, "conflict resolved");
                self.finish(CaptureStatus::Success, RESCHEDULED).await;
                Ok(event)
            }
            Err(err) => {
                error!(%err, "failed to save rescheduled event");
                self.finish(CaptureStatus::Error, RESCHEDULE_FAILED).await;
                Err(err)
            }
        }
    }

    /// Abandon the pending conflict and return to idle.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidState` if no conflict is pending.
    pub async fn cancel_conflict(&self) -> Result<CaptureSnapshot> {
        let mut state = self.lock().await;
        if state.status != CaptureStatus::Conflict {
            return Err(AppError::InvalidState(
                "no scheduling conflict is pending".into(),
            ));
        }
        state.generation += 1;
        state.reset();
        info!("conflict cancelled");
        Ok(state.snapshot())
    }

    /// Debit, classify, apply, and report. Expects `processing`.
    async fn process(&self, text: &str) {
        let cost = self.inner.ledger.costs().capture_cost;
        match self.inner.ledger.try_consume(cost).await {
            Ok(true) => {}
            Ok(false) => {
                info!(cost, "classification refused, not enough tokens");
                self.finish(CaptureStatus::Error, PROCESS_NO_TOKENS).await;
                return;
            }
            Err(err) => {
                error!(%err, "quota ledger unavailable");
                self.finish(CaptureStatus::Error, CLASSIFY_FAILED).await;
                return;
            }
        }

        let result = self.inner.dispatcher.classify(text).await;
        match self.inner.dispatcher.apply(&result).await {
            Ok(DispatchOutcome::Completed { feedback }) => {
                self.finish(CaptureStatus::Success, &feedback).await;
            }
            Ok(DispatchOutcome::Conflict(conflict)) => {
                {
                    let mut state = self.lock().await;
                    state.feedback = CONFLICT_PROMPT.to_owned();
                    state.conflict = Some(conflict);
                }
                self.speak_then(CONFLICT_PROMPT, CaptureStatus::Conflict)
                    .await;
            }
            Err(err) => {
                error!(%err, "failed to apply classification");
                self.finish(CaptureStatus::Error, CLASSIFY_FAILED).await;
            }
        }
    }

    /// Show `feedback`, speak it, settle on `status`, and schedule the
    /// return to idle.
    async fn finish(&self, status: CaptureStatus, feedback: &str) {
        self.lock().await.feedback = feedback.to_owned();
        let generation = self.speak_then(feedback, status).await;
        self.schedule_reset(generation);
    }

    /// Speak `text` under the `speaking` overlay, then settle on `then`.
    ///
    /// Returns the interaction generation observed when settling.
    async fn speak_then(&self, text: &str, then: CaptureStatus) -> u64 {
        if self.inner.voice.charge(text).await {
            self.lock().await.status = CaptureStatus::Speaking;
            self.inner.voice.play(text).await;
        }
        let mut state = self.lock().await;
        state.status = then;
        state.generation
    }

    fn schedule_reset(&self, generation: u64) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.reset_delay).await;
            let mut state = inner.state.lock().await;
            let settled = matches!(state.status, CaptureStatus::Success | CaptureStatus::Error);
            if state.generation == generation && settled {
                state.reset();
                debug!(generation, "capture returned to idle");
            }
        });
    }

    async fn lock(&self) -> MutexGuard<'_, Interaction> {
        self.inner.state.lock().await
    }
}
