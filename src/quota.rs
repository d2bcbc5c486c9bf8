//! Daily token ledger shared by every AI-backed feature.
//!
//! Each check-and-debit runs under one async mutex, so concurrent callers
//! (capture, voice feedback, note helpers, chat) never observe or write a
//! half-applied balance.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::QuotaConfig;
use crate::models::quota::QuotaState;
use crate::persistence::kv_store::{self, KeyValueStore};
use crate::{AppError, Result};

/// Store key for the persisted ledger.
pub const QUOTA_KEY: &str = "dailyTokens";

/// Remaining balance plus the thresholds each feature needs.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuotaSnapshot {
    /// Units left today.
    pub remaining: u32,
    /// Full daily allowance.
    pub allowance: u32,
    /// Minimum balance to start a capture.
    pub capture: u32,
    /// Minimum balance to send a chat message.
    pub chat: u32,
    /// Minimum balance for a note grammar/summarize action.
    pub note_action: u32,
    /// Minimum balance to record a conversation.
    pub conversation: u32,
}

/// Persisted daily allowance with all-or-nothing debits.
pub struct QuotaLedger {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    costs: QuotaConfig,
    lock: Mutex<()>,
}

impl QuotaLedger {
    /// Create a ledger over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, costs: QuotaConfig) -> Self {
        Self {
            store,
            clock,
            costs,
            lock: Mutex::new(()),
        }
    }

    /// Per-feature costs this ledger was built with.
    #[must_use]
    pub fn costs(&self) -> &QuotaConfig {
        &self.costs
    }

    /// Debit `amount` if the balance covers it.
    ///
    /// Returns `false` without touching the balance when it does not. A
    /// balance left over from an earlier day is refilled first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` for a zero amount or `AppError::Db`
    /// if the store fails.
    pub async fn try_consume(&self, amount: u32) -> Result<bool> {
        if amount == 0 {
            return Err(AppError::InvalidInput(
                "quota debit must be positive".into(),
            ));
        }

        let _guard = self.lock.lock().await;
        let mut state = self.refreshed().await?;
        if state.count < amount {
            debug!(amount, remaining = state.count, "quota debit refused");
            return Ok(false);
        }

        state.count -= amount;
        kv_store::save(self.store.as_ref(), QUOTA_KEY, &state).await?;
        debug!(amount, remaining = state.count, "quota debited");
        Ok(true)
    }

    /// Debit `amount`, turning a refusal into an error naming `feature`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::QuotaExhausted` when the balance is too low.
    pub async fn consume(&self, amount: u32, feature: &str) -> Result<()> {
        if self.try_consume(amount).await? {
            Ok(())
        } else {
            Err(AppError::QuotaExhausted(format!(
                "{feature} needs {amount} tokens"
            )))
        }
    }

    /// Units left today.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store fails.
    pub async fn remaining(&self) -> Result<u32> {
        let _guard = self.lock.lock().await;
        Ok(self.refreshed().await?.count)
    }

    /// Balance and feature thresholds for display.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store fails.
    pub async fn snapshot(&self) -> Result<QuotaSnapshot> {
        let remaining = self.remaining().await?;
        Ok(QuotaSnapshot {
            remaining,
            allowance: self.costs.daily_allowance,
            capture: self.costs.capture_cost,
            chat: self.costs.chat_cost,
            note_action: self.costs.note_action_cost,
            conversation: self.costs.conversation_cost,
        })
    }

    /// Current state, refilled and persisted if it belongs to another day.
    ///
    /// Callers must hold `lock`. Refilling twice on the same day is a no-op
    /// because the second call sees today's date.
    async fn refreshed(&self) -> Result<QuotaState> {
        let today = self.clock.today();
        let allowance = self.costs.daily_allowance;
        let state = kv_store::load_or(self.store.as_ref(), QUOTA_KEY, || {
            QuotaState::fresh(allowance, today)
        })
        .await?;

        if !state.is_stale(today) {
            return Ok(state);
        }

        let fresh = QuotaState::fresh(allowance, today);
        kv_store::save(self.store.as_ref(), QUOTA_KEY, &fresh).await?;
        info!(allowance, %today, "daily quota refilled");
        Ok(fresh)
    }
}
