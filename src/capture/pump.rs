//! Forwards recognizer events into the capture controller.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

use crate::speech::RecognitionEvent;

use super::CaptureController;

/// Spawn the task that feeds recognition events to `controller`.
///
/// A transcript runs the whole capture pipeline before the next event is
/// read, so one utterance is fully handled before another is considered.
#[must_use]
pub fn spawn_recognition_pump(
    controller: CaptureController,
    mut events: mpsc::UnboundedReceiver<RecognitionEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        info!("recognition pump shutting down");
                        break;
                    }
                    event = events.recv() => {
                        let Some(event) = event else {
                            info!("recognizer closed");
                            break;
                        };
                        controller.handle_recognition(event).await;
                    }
                }
            }
        }
        .instrument(info_span!("recognition_pump")),
    )
}
