//! Speech-to-text engine contract and the manual engine used by the daemon.

use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::{AppError, Result};

/// Error code reported by a recognition engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecognitionErrorCode {
    /// Microphone access was refused.
    NotAllowed,
    /// The recognition service is blocked on this host.
    ServiceNotAllowed,
    /// No audio input device could be opened.
    AudioCapture,
    /// Nothing was heard.
    NoSpeech,
    /// Listening was cancelled.
    Aborted,
    /// The engine's backend could not be reached.
    Network,
    /// Any other engine-specific code.
    Other(String),
}

impl RecognitionErrorCode {
    /// Whether the engine cannot be used at all until the user acts.
    #[must_use]
    pub fn is_capability_error(&self) -> bool {
        matches!(
            self,
            Self::NotAllowed | Self::ServiceNotAllowed | Self::AudioCapture
        )
    }

    /// Text shown to the user for this code.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAllowed => "Error: Permission denied".to_owned(),
            other => format!("Error: {other}"),
        }
    }
}

impl Display for RecognitionErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Self::NotAllowed => "not-allowed",
            Self::ServiceNotAllowed => "service-not-allowed",
            Self::AudioCapture => "audio-capture",
            Self::NoSpeech => "no-speech",
            Self::Aborted => "aborted",
            Self::Network => "network",
            Self::Other(code) => code,
        };
        f.write_str(code)
    }
}

impl From<String> for RecognitionErrorCode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "not-allowed" | "permission-denied" => Self::NotAllowed,
            "service-not-allowed" => Self::ServiceNotAllowed,
            "audio-capture" => Self::AudioCapture,
            "no-speech" => Self::NoSpeech,
            "aborted" => Self::Aborted,
            "network" => Self::Network,
            _ => Self::Other(raw),
        }
    }
}

impl From<RecognitionErrorCode> for String {
    fn from(code: RecognitionErrorCode) -> Self {
        code.to_string()
    }
}

/// Something the recognition engine reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Final transcript of the utterance.
    Transcript(String),
    /// Recognition failed.
    Error(RecognitionErrorCode),
    /// The engine stopped listening without a result.
    Ended,
}

/// A start/stop speech-to-text capability.
///
/// Results arrive as [`RecognitionEvent`]s on the channel handed out when
/// the engine was built.
pub trait SpeechRecognizer: Send + Sync {
    /// Whether the engine exists on this host.
    fn is_available(&self) -> bool;

    /// Begin listening.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EngineUnavailable` if the engine is absent.
    fn start(&self) -> Result<()>;

    /// Stop listening; the engine reports `Ended` if nothing was heard.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EngineUnavailable` if the engine is absent.
    fn stop(&self) -> Result<()>;
}

/// Engine fed by forwarded transcripts instead of a microphone.
///
/// The control surface delivers what the user said (or a relay's error
/// code) while the engine is listening.
pub struct ManualRecognizer {
    available: bool,
    listening: AtomicBool,
    events: mpsc::UnboundedSender<RecognitionEvent>,
}

impl ManualRecognizer {
    /// Build the engine and the receiving end of its event channel.
    #[must_use]
    pub fn new(available: bool) -> (Self, mpsc::UnboundedReceiver<RecognitionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                available,
                listening: AtomicBool::new(false),
                events,
            },
            rx,
        )
    }

    /// Deliver the final transcript of the current utterance.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidState` if the engine is not listening.
    pub fn submit_transcript(&self, text: &str) -> Result<()> {
        self.finish(RecognitionEvent::Transcript(text.to_owned()))
    }

    /// Report a failure for the current utterance.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidState` if the engine is not listening.
    pub fn report_error(&self, code: RecognitionErrorCode) -> Result<()> {
        self.finish(RecognitionEvent::Error(code))
    }

    /// Whether an utterance is in progress.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    fn finish(&self, event: RecognitionEvent) -> Result<()> {
        if !self.listening.swap(false, Ordering::SeqCst) {
            return Err(AppError::InvalidState("recognizer is not listening".into()));
        }
        self.send(event)
    }

    fn send(&self, event: RecognitionEvent) -> Result<()> {
        debug!(?event, "recognition event");
        self.events
            .send(event)
            .map_err(|_| AppError::InvalidState("recognition channel closed".into()))
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(AppError::EngineUnavailable(
                "speech recognition is not available on this device".into(),
            ))
        }
    }
}

impl SpeechRecognizer for ManualRecognizer {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start(&self) -> Result<()> {
        self.ensure_available()?;
        self.listening.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.ensure_available()?;
        if self.listening.swap(false, Ordering::SeqCst) {
            self.send(RecognitionEvent::Ended)?;
        }
        Ok(())
    }
}
