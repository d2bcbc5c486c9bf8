//! Speech engines at their boundary.
//!
//! Recognition is a start/stop capability that reports through a channel;
//! synthesis output is handed to an [`AudioSink`] that resolves once the
//! clip has finished playing.

pub mod output;
pub mod recognizer;

pub use output::{AudioSink, PacedSink};
pub use recognizer::{ManualRecognizer, RecognitionErrorCode, RecognitionEvent, SpeechRecognizer};
