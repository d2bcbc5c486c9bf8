//! Persona chat session.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::models::chat::ChatMessage;
use crate::quota::QuotaLedger;
use crate::{AppError, Result};

use super::{prompts, AssistantService};

/// Reply shown when the balance cannot cover a message.
pub const NO_TOKENS_REPLY: &str = "Sorry, you don't have enough tokens for this action.";

/// Reply shown when the model call fails.
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Default)]
struct Conversation {
    /// Everything shown to the user, greeting included.
    transcript: Vec<ChatMessage>,
    /// Successful exchanges only; sent back to the model as context.
    context: Vec<ChatMessage>,
}

/// One in-memory conversation with the assistant.
///
/// Messages are handled one at a time; a second `send` waits for the first.
pub struct ChatSession {
    service: Arc<dyn AssistantService>,
    ledger: Arc<QuotaLedger>,
    conversation: Mutex<Conversation>,
}

impl ChatSession {
    /// Open a session that starts with the persona's greeting.
    #[must_use]
    pub fn new(service: Arc<dyn AssistantService>, ledger: Arc<QuotaLedger>) -> Self {
        Self {
            service,
            ledger,
            conversation: Mutex::new(Conversation {
                transcript: vec![ChatMessage::model(prompts::GREETING)],
                context: Vec::new(),
            }),
        }
    }

    /// Send a user message and return the assistant's reply.
    ///
    /// Quota refusal and model failure both produce an apologetic reply
    /// rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` for a blank message or
    /// `AppError::Db` if the ledger cannot be read.
    pub async fn send(&self, message: &str) -> Result<ChatMessage> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::InvalidInput("chat message is empty".into()));
        }

        let mut conversation = self.conversation.lock().await;
        conversation.transcript.push(ChatMessage::user(message));

        let cost = self.ledger.costs().chat_cost;
        if !self.ledger.try_consume(cost).await? {
            let reply = ChatMessage::model(NO_TOKENS_REPLY);
            conversation.transcript.push(reply.clone());
            return Ok(reply);
        }

        let reply = match self.service.chat(&conversation.context, message).await {
            Ok(text) => {
                let reply = ChatMessage::model(text.trim());
                conversation.context.push(ChatMessage::user(message));
                conversation.context.push(reply.clone());
                reply
            }
            Err(err) => {
                warn!(%err, "chat request failed");
                ChatMessage::model(ERROR_REPLY)
            }
        };
        conversation.transcript.push(reply.clone());
        Ok(reply)
    }

    /// Everything shown so far, oldest first.
    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.conversation.lock().await.transcript.clone()
    }
}
