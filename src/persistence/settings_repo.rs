//! User preferences and one-off markers.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::Result;

use super::kv_store::{self, KeyValueStore};

/// Store key for the voice feedback toggle.
pub const VOICE_FEEDBACK_KEY: &str = "voiceFeedback";

/// Store key for the day the digest was last produced.
pub const LAST_DIGEST_KEY: &str = "lastDigestDate";

/// Repository for scalar settings.
#[derive(Clone)]
pub struct SettingsRepo {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsRepo {
    /// Create a new repository over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Whether spoken feedback is enabled. Defaults to on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store cannot be read.
    pub async fn voice_feedback(&self) -> Result<bool> {
        kv_store::load_or(self.store.as_ref(), VOICE_FEEDBACK_KEY, || true).await
    }

    /// Toggle spoken feedback.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    pub async fn set_voice_feedback(&self, enabled: bool) -> Result<()> {
        kv_store::save(self.store.as_ref(), VOICE_FEEDBACK_KEY, &enabled).await
    }

    /// Day the digest was last produced, if ever.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store cannot be read.
    pub async fn last_digest_date(&self) -> Result<Option<NaiveDate>> {
        kv_store::load_or(self.store.as_ref(), LAST_DIGEST_KEY, || None).await
    }

    /// Record that the digest was produced on `date`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    pub async fn set_last_digest_date(&self, date: NaiveDate) -> Result<()> {
        kv_store::save(self.store.as_ref(), LAST_DIGEST_KEY, &date).await
    }
}
