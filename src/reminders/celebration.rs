//! Time-boxed celebration effect.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// A flag that stays raised for a fixed duration.
#[derive(Debug)]
pub struct Celebration {
    duration: Duration,
    until: Mutex<Option<Instant>>,
}

impl Celebration {
    /// Create a lowered flag that stays up for `duration` once raised.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            until: Mutex::new(None),
        }
    }

    /// Raise (or re-raise) the flag.
    pub fn raise(&self) {
        if let Ok(mut until) = self.until.lock() {
            *until = Some(Instant::now() + self.duration);
        }
    }

    /// Lower the flag early.
    pub fn clear(&self) {
        if let Ok(mut until) = self.until.lock() {
            *until = None;
        }
    }

    /// Whether the effect is showing.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.until
            .lock()
            .map(|until| until.is_some_and(|deadline| Instant::now() < deadline))
            .unwrap_or(false)
    }
}
