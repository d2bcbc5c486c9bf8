//! Natural-language assistant boundary.
//!
//! [`AssistantService`] is the seam to the remote generative model. The
//! daemon talks to it through [`gemini::GeminiClient`]; tests substitute
//! scripted fakes. Quota gating and fallback-to-input behavior live in
//! [`helpers`] and [`chat`], never in the service itself.

pub mod chat;
pub mod gemini;
pub mod helpers;
pub mod prompts;

use std::future::Future;
use std::pin::Pin;

use chrono::NaiveDate;

use crate::models::chat::ChatMessage;
use crate::models::classification::ClassificationResult;
use crate::models::event::CalendarEntry;
use crate::Result;

/// Boxed future returned by [`AssistantService`] methods.
pub type AssistantFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Request/response access to the generative model.
///
/// Every method may fail with `AppError::ExternalService` (transport,
/// status, timeout) or `AppError::MalformedData` (unparseable payload).
pub trait AssistantService: Send + Sync {
    /// Classify a capture against the user's calendar.
    fn classify<'a>(
        &'a self,
        text: &'a str,
        calendar: &'a [CalendarEntry],
        today: NaiveDate,
    ) -> AssistantFuture<'a, ClassificationResult>;

    /// Run a single free-text prompt and return the model's reply.
    fn generate<'a>(&'a self, prompt: String) -> AssistantFuture<'a, String>;

    /// Continue a persona chat. `history` excludes `message`.
    fn chat<'a>(
        &'a self,
        history: &'a [ChatMessage],
        message: &'a str,
    ) -> AssistantFuture<'a, String>;

    /// Synthesize speech as raw 16-bit little-endian mono PCM.
    ///
    /// `Ok(None)` means the model answered without audio.
    fn synthesize<'a>(&'a self, text: &'a str) -> AssistantFuture<'a, Option<Vec<u8>>>;
}
