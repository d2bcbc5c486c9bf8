#![forbid(unsafe_code)]

//! `besto`: capture-and-scheduling assistant daemon.
//!
//! Bootstraps configuration and the persisted store, starts the reminder
//! poller and the recognition pump, and serves the local IPC surface for
//! `besto-ctl`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use besto::assistant::gemini::GeminiClient;
use besto::capture::spawn_recognition_pump;
use besto::clock::SystemClock;
use besto::config::GlobalConfig;
use besto::ipc::server::spawn_ipc_server;
use besto::persistence::db;
use besto::persistence::kv_store::{KeyValueStore, MemoryKvStore, SqliteKvStore};
use besto::reminders::spawn_reminder_scheduler;
use besto::speech::{ManualRecognizer, PacedSink};
use besto::{AppError, AppState, Collaborators, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "besto", about = "Voice capture and scheduling assistant", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Keep all records in memory; nothing survives a restart.
    #[arg(long)]
    ephemeral: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("besto bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    if let Err(err) = config.load_credentials().await {
        warn!(%err, "assistant api key missing; AI features will report failures");
    }
    let config = Arc::new(config);
    info!("configuration loaded");

    // ── Open the store ──────────────────────────────────
    let store: Arc<dyn KeyValueStore> = if args.ephemeral {
        info!("ephemeral mode; records are kept in memory");
        Arc::new(MemoryKvStore::new())
    } else {
        let pool = db::connect(&config).await?;
        Arc::new(SqliteKvStore::new(Arc::new(pool)))
    };

    // ── Build shared application state ──────────────────
    let assistant = Arc::new(GeminiClient::new(config.assistant.clone())?);
    let (recognizer, recognition_events) =
        ManualRecognizer::new(config.speech.recognition_available);
    let state = Arc::new(AppState::assemble(
        Arc::clone(&config),
        Collaborators {
            store,
            assistant,
            recognizer: Arc::new(recognizer),
            sink: Arc::new(PacedSink::new(config.speech.sample_rate)),
            clock: Arc::new(SystemClock),
        },
    ));

    match state.digest.check().await {
        Ok(Some(digest)) => info!(
            open_tasks = digest.open_tasks.len(),
            events = digest.todays_events.len(),
            "today's digest is ready"
        ),
        Ok(None) => {}
        Err(err) => warn!(%err, "digest check failed"),
    }

    // ── Start background tasks ──────────────────────────
    let ct = CancellationToken::new();
    let reminder_handle = spawn_reminder_scheduler(
        Arc::clone(&state.reminders),
        config.poll_interval(),
        ct.clone(),
    );
    let pump_handle =
        spawn_recognition_pump(state.capture.clone(), recognition_events, ct.clone());
    let ipc_handle = spawn_ipc_server(Arc::clone(&state), ct.clone())?;

    info!("besto ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    let _ = tokio::join!(reminder_handle, pump_handle, ipc_handle);
    info!("besto shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
