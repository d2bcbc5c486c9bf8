//! Fixed-interval reminder poller.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

use super::ReminderCenter;

/// Spawn the reminder poller.
///
/// Every `period` the center scans the event store for the first due,
/// unacknowledged reminder. The loop never touches capture state.
#[must_use]
pub fn spawn_reminder_scheduler(
    center: Arc<ReminderCenter>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        info!("reminder scheduler shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(err) = center.tick().await {
                            error!(?err, "reminder poll failed");
                        }
                    }
                }
            }
        }
        .instrument(info_span!("reminder_scheduler")),
    )
}
