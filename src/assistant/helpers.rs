//! Quota-gated text helpers for notes and conversation recording.
//!
//! Every helper debits the ledger before calling the model. A refused
//! debit is an error; a failed model call hands back the caller's own
//! text instead.

use std::sync::Arc;

use tracing::warn;

use crate::models::note::Note;
use crate::persistence::note_repo::{NoteDraft, NoteRepo};
use crate::quota::QuotaLedger;
use crate::{AppError, Result};

use super::{prompts, AssistantService};

/// Title of a note holding a conversation summary.
pub const CONVERSATION_SUMMARY_TITLE: &str = "Conversation Summary";

/// Title of a note holding an unsummarized conversation.
pub const CONVERSATION_TRANSCRIPT_TITLE: &str = "Conversation Transcript";

/// Outcome of summarizing a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationSummary {
    /// The model produced a summary.
    Summarized(String),
    /// The model call failed; the transcript is returned as-is.
    Unsummarized(String),
}

/// Text helpers sharing the ledger with every other AI feature.
#[derive(Clone)]
pub struct AssistantHelpers {
    service: Arc<dyn AssistantService>,
    ledger: Arc<QuotaLedger>,
}

impl AssistantHelpers {
    /// Create helpers over `service`, charging `ledger`.
    #[must_use]
    pub fn new(service: Arc<dyn AssistantService>, ledger: Arc<QuotaLedger>) -> Self {
        Self { service, ledger }
    }

    /// Correct spelling and grammar.
    ///
    /// # Errors
    ///
    /// Returns `AppError::QuotaExhausted` if the balance is too low.
    pub async fn improve_grammar(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        let cost = self.ledger.costs().note_action_cost;
        self.ledger.consume(cost, "grammar improvement").await?;
        Ok(self.generate_or_original(prompts::improve_grammar(text), text).await)
    }

    /// Summarize concisely.
    ///
    /// # Errors
    ///
    /// Returns `AppError::QuotaExhausted` if the balance is too low.
    pub async fn summarize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        let cost = self.ledger.costs().note_action_cost;
        self.ledger.consume(cost, "summarize").await?;
        Ok(self.generate_or_original(prompts::summarize(text), text).await)
    }

    /// Produce a meeting-style summary of a transcript.
    ///
    /// # Errors
    ///
    /// Returns `AppError::QuotaExhausted` if the balance is too low.
    pub async fn summarize_conversation(&self, transcript: &str) -> Result<ConversationSummary> {
        if transcript.trim().is_empty() {
            return Ok(ConversationSummary::Summarized(String::new()));
        }
        let cost = self.ledger.costs().conversation_cost;
        self.ledger.consume(cost, "conversation summary").await?;
        match self
            .service
            .generate(prompts::summarize_conversation(transcript))
            .await
        {
            Ok(summary) => Ok(ConversationSummary::Summarized(summary.trim().to_owned())),
            Err(err) => {
                warn!(%err, "conversation summary failed, keeping transcript");
                Ok(ConversationSummary::Unsummarized(transcript.to_owned()))
            }
        }
    }

    /// Summarize a recorded conversation and file it as a note.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` for an empty transcript,
    /// `AppError::QuotaExhausted` if the balance is too low, or a store
    /// error if the note cannot be saved.
    pub async fn record_conversation(&self, transcript: &str, notes: &NoteRepo) -> Result<Note> {
        if transcript.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "conversation transcript is empty".into(),
            ));
        }
        let draft = match self.summarize_conversation(transcript).await? {
            ConversationSummary::Summarized(summary) => NoteDraft {
                title: CONVERSATION_SUMMARY_TITLE.into(),
                content: summary,
                ..NoteDraft::default()
            },
            ConversationSummary::Unsummarized(raw) => NoteDraft {
                title: CONVERSATION_TRANSCRIPT_TITLE.into(),
                content: format!("Failed to summarize. Raw transcript:\n\n{raw}"),
                ..NoteDraft::default()
            },
        };
        notes.create(draft).await
    }

    async fn generate_or_original(&self, prompt: String, original: &str) -> String {
        match self.service.generate(prompt).await {
            Ok(reply) => reply.trim().to_owned(),
            Err(err) => {
                warn!(%err, "assistant helper failed, returning input unchanged");
                original.to_owned()
            }
        }
    }
}
