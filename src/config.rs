//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Token costs for every AI-backed feature.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct QuotaConfig {
    /// Units granted at the start of each calendar day.
    #[serde(default = "default_daily_allowance")]
    pub daily_allowance: u32,
    /// Cost of one capture classification.
    #[serde(default = "default_capture_cost")]
    pub capture_cost: u32,
    /// Cost of one spoken feedback clip.
    #[serde(default = "default_voice_feedback_cost")]
    pub voice_feedback_cost: u32,
    /// Cost of one chat message.
    #[serde(default = "default_chat_cost")]
    pub chat_cost: u32,
    /// Cost of a grammar or summarize action on a note.
    #[serde(default = "default_note_action_cost")]
    pub note_action_cost: u32,
    /// Cost of recording and summarizing a conversation.
    #[serde(default = "default_conversation_cost")]
    pub conversation_cost: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_allowance: default_daily_allowance(),
            capture_cost: default_capture_cost(),
            voice_feedback_cost: default_voice_feedback_cost(),
            chat_cost: default_chat_cost(),
            note_action_cost: default_note_action_cost(),
            conversation_cost: default_conversation_cost(),
        }
    }
}

fn default_daily_allowance() -> u32 {
    1000
}

fn default_capture_cost() -> u32 {
    100
}

fn default_voice_feedback_cost() -> u32 {
    10
}

fn default_chat_cost() -> u32 {
    25
}

fn default_note_action_cost() -> u32 {
    50
}

fn default_conversation_cost() -> u32 {
    150
}

/// Capture interaction timing.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CaptureConfig {
    /// Delay before a finished interaction returns to idle.
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            reset_delay_ms: default_reset_delay_ms(),
        }
    }
}

impl CaptureConfig {
    /// Reset delay as a [`Duration`].
    #[must_use]
    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }
}

fn default_reset_delay_ms() -> u64 {
    3000
}

/// Reminder polling configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ReminderConfig {
    /// Seconds between scans of the event store.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Seconds a celebration effect stays visible.
    #[serde(default = "default_celebration_seconds")]
    pub celebration_seconds: u64,
    /// Minutes ahead a task reminder is scheduled.
    #[serde(default = "default_task_reminder_lead")]
    pub task_reminder_lead_minutes: i64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            celebration_seconds: default_celebration_seconds(),
            task_reminder_lead_minutes: default_task_reminder_lead(),
        }
    }
}

fn default_poll_interval() -> u64 {
    10
}

fn default_celebration_seconds() -> u64 {
    5
}

fn default_task_reminder_lead() -> i64 {
    60
}

/// Classification and generation service endpoint settings.
///
/// The API key is loaded at runtime via OS keychain or environment
/// variable, never from the TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AssistantConfig {
    /// Base URL of the generative language API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Text model used for classification and helpers.
    #[serde(default = "default_model")]
    pub model: String,
    /// Model used for speech synthesis.
    #[serde(default = "default_speech_model")]
    pub speech_model: String,
    /// Prebuilt voice name for synthesis.
    #[serde(default = "default_voice")]
    pub voice: String,
    /// Per-request timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// API key (populated at runtime).
    #[serde(skip)]
    pub api_key: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            speech_model: default_speech_model(),
            voice: default_voice(),
            timeout_seconds: default_timeout_seconds(),
            api_key: String::new(),
        }
    }
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}

fn default_speech_model() -> String {
    "gemini-2.5-flash-preview-tts".into()
}

fn default_voice() -> String {
    "Kore".into()
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Speech engine settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SpeechConfig {
    /// Whether a speech recognizer is present on this host.
    #[serde(default = "default_true")]
    pub recognition_available: bool,
    /// Sample rate of synthesized PCM audio.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            recognition_available: true,
            sample_rate: default_sample_rate(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sample_rate() -> u32 {
    24_000
}

fn default_ipc_name() -> String {
    "besto".into()
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Directory holding the persisted store.
    pub data_dir: PathBuf,
    /// Named pipe / Unix socket identifier.
    #[serde(default = "default_ipc_name")]
    pub ipc_name: String,
    /// Token allowance and per-feature costs.
    #[serde(default)]
    pub quota: QuotaConfig,
    /// Capture interaction timing.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Reminder polling.
    #[serde(default)]
    pub reminders: ReminderConfig,
    /// Classification service endpoint.
    #[serde(default)]
    pub assistant: AssistantConfig,
    /// Speech engines.
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and normalize paths.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the assistant API key from OS keychain with env-var fallback.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if neither keychain nor env var provide
    /// the key.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.assistant.api_key = load_credential("gemini_api_key", "GEMINI_API_KEY").await?;
        Ok(())
    }

    /// Path of the `SQLite` store file.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("besto.db")
    }

    /// Reminder poll period as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.reminders.poll_interval_seconds)
    }

    /// Celebration effect length as a [`Duration`].
    #[must_use]
    pub fn celebration_duration(&self) -> Duration {
        Duration::from_secs(self.reminders.celebration_seconds)
    }

    fn validate(&mut self) -> Result<()> {
        if self.quota.daily_allowance == 0 {
            return Err(AppError::Config(
                "quota.daily_allowance must be greater than zero".into(),
            ));
        }

        let costs = [
            ("capture_cost", self.quota.capture_cost),
            ("voice_feedback_cost", self.quota.voice_feedback_cost),
            ("chat_cost", self.quota.chat_cost),
            ("note_action_cost", self.quota.note_action_cost),
            ("conversation_cost", self.quota.conversation_cost),
        ];
        for (name, cost) in costs {
            if cost == 0 {
                return Err(AppError::Config(format!(
                    "quota.{name} must be greater than zero"
                )));
            }
        }

        if self.reminders.poll_interval_seconds == 0 {
            return Err(AppError::Config(
                "reminders.poll_interval_seconds must be greater than zero".into(),
            ));
        }

        let canonical_dir = self
            .data_dir
            .canonicalize()
            .map_err(|err| AppError::Config(format!("data_dir invalid: {err}")))?;
        self.data_dir = canonical_dir;

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new("besto", &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    env::var(env_key).map_err(|_| {
        AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))
    })
}
