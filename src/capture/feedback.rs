//! Optional spoken feedback.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::assistant::AssistantService;
use crate::persistence::settings_repo::SettingsRepo;
use crate::quota::QuotaLedger;
use crate::speech::AudioSink;

/// Text-to-speech feedback gated by the user setting and the ledger.
///
/// Nothing here ever fails its caller: a disabled setting, a refused debit,
/// or a synthesis error all just mean silence.
#[derive(Clone)]
pub struct VoiceFeedback {
    service: Arc<dyn AssistantService>,
    ledger: Arc<QuotaLedger>,
    settings: SettingsRepo,
    sink: Arc<dyn AudioSink>,
}

impl VoiceFeedback {
    /// Create a feedback speaker.
    #[must_use]
    pub fn new(
        service: Arc<dyn AssistantService>,
        ledger: Arc<QuotaLedger>,
        settings: SettingsRepo,
        sink: Arc<dyn AudioSink>,
    ) -> Self {
        Self {
            service,
            ledger,
            settings,
            sink,
        }
    }

    /// Decide whether `text` will be spoken, paying for it if so.
    ///
    /// Returns `false` when feedback is off, the text is blank, or the
    /// balance is too low.
    pub async fn charge(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        match self.settings.voice_feedback().await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(err) => {
                warn!(%err, "could not read voice feedback setting");
                return false;
            }
        }

        let cost = self.ledger.costs().voice_feedback_cost;
        match self.ledger.try_consume(cost).await {
            Ok(true) => true,
            Ok(false) => {
                warn!("not enough tokens for voice feedback");
                false
            }
            Err(err) => {
                warn!(%err, "voice feedback debit failed");
                false
            }
        }
    }

    /// Synthesize and play `text`, waiting for playback to finish.
    ///
    /// Call only after [`charge`](Self::charge) returned `true`.
    pub async fn play(&self, text: &str) {
        match self.service.synthesize(text).await {
            Ok(Some(pcm)) => {
                if let Err(err) = self.sink.play(&pcm).await {
                    warn!(%err, "speech playback failed");
                }
            }
            Ok(None) => debug!("speech synthesis returned no audio"),
            Err(err) => warn!(%err, "speech synthesis failed"),
        }
    }
}
