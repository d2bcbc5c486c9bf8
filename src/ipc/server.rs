//! Local IPC server for `besto-ctl` commands.
//!
//! Listens on a named pipe (Windows) or Unix domain socket (Linux/macOS)
//! using the `interprocess` crate. Accepts line-delimited JSON commands and
//! routes them to the capture controller, reminder center, stores, and
//! assistant helpers.
//!
//! ## Protocol
//!
//! Request (one JSON object per line):
//! ```json
//! {"command": "status"}
//! {"command": "type", "text": "call the dentist tomorrow at 9"}
//! {"command": "pick", "index": 1}
//! {"command": "task_status", "id": "…", "status": "completed"}
//! ```
//!
//! Response (one JSON object per line):
//! ```json
//! {"ok": true, "data": { ... } }
//! {"ok": false, "error": "invalid state: no active reminder"}
//! ```

use std::sync::Arc;

use interprocess::local_socket::{tokio::prelude::*, GenericNamespaced, ListenerOptions};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::models::event::{Event, EventDraft};
use crate::models::note::Note;
use crate::models::task::{Task, TaskStatus};
use crate::persistence::note_repo::NoteDraft;
use crate::persistence::task_repo::TaskEdit;
use crate::speech::{RecognitionErrorCode, SpeechRecognizer};
use crate::{AppError, AppState, Result};

/// Inbound IPC request.
#[derive(Debug, Default, Deserialize)]
pub struct IpcRequest {
    /// Command verb.
    pub command: String,
    /// Record identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Free text: capture input, transcript, chat message, helper input,
    /// or search term.
    #[serde(default)]
    pub text: Option<String>,
    /// Recognition error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Conflict suggestion index, zero-based.
    #[serde(default)]
    pub index: Option<usize>,
    /// Task status (`yet-to-start`, `in-progress`, `completed`).
    #[serde(default)]
    pub status: Option<String>,
    /// Voice feedback toggle.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Task fields for `task_add` / `task_update`.
    #[serde(default)]
    pub task: Option<TaskEdit>,
    /// Note fields for `note_add` / `note_update`.
    #[serde(default)]
    pub note: Option<NoteDraft>,
    /// Event fields for `event_add` / `event_update`.
    #[serde(default)]
    pub event: Option<EventDraft>,
}

/// Outbound IPC response.
#[derive(Debug, Serialize)]
pub struct IpcResponse {
    /// Whether the command succeeded.
    pub ok: bool,
    /// Payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IpcResponse {
    fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }

    fn from_result<T: Serialize>(result: Result<T>) -> Self {
        match result.and_then(|data| serde_json::to_value(data).map_err(AppError::from)) {
            Ok(data) => Self::success(data),
            Err(err) => Self::error(err.to_string()),
        }
    }
}

/// Spawn the IPC server task.
///
/// # Errors
///
/// Returns `AppError::Ipc` if the listener cannot be created.
pub fn spawn_ipc_server(
    state: Arc<AppState>,
    ct: CancellationToken,
) -> Result<tokio::task::JoinHandle<()>> {
    let name = state.config.ipc_name.clone();

    let listener_name = name
        .clone()
        .to_ns_name::<GenericNamespaced>()
        .map_err(|err| AppError::Ipc(format!("invalid ipc socket name '{name}': {err}")))?;

    let listener = ListenerOptions::new()
        .name(listener_name)
        .create_tokio()
        .map_err(|err| AppError::Ipc(format!("failed to create ipc listener: {err}")))?;

    info!(ipc_name = %name, "IPC server listening");

    let handle = tokio::spawn(async move {
        let span = info_span!("ipc_server", name = %name);
        async move {
            loop {
                tokio::select! {
                    () = ct.cancelled() => {
                        info!("IPC server shutting down");
                        break;
                    }
                    accept_result = listener.accept() => {
                        match accept_result {
                            Ok(stream) => {
                                let state = Arc::clone(&state);
                                tokio::spawn(handle_connection(stream, state));
                            }
                            Err(err) => {
                                warn!(%err, "IPC accept failed");
                            }
                        }
                    }
                }
            }
        }
        .instrument(span)
        .await;
    });

    Ok(handle)
}

/// Handle a single IPC client connection.
async fn handle_connection(
    stream: interprocess::local_socket::tokio::Stream,
    state: Arc<AppState>,
) {
    let span = info_span!("ipc_conn");
    async move {
        let (reader, mut writer) = stream.split();
        let mut buf_reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();
            match buf_reader.read_line(&mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let response = match serde_json::from_str::<IpcRequest>(trimmed) {
                        Ok(request) => dispatch_command(&request, &state).await,
                        Err(err) => IpcResponse::error(format!("invalid json: {err}")),
                    };

                    let mut response_line = serde_json::to_string(&response).unwrap_or_else(|_| {
                        r#"{"ok":false,"error":"serialization failed"}"#.to_owned()
                    });
                    response_line.push('\n');

                    if let Err(err) = writer.write_all(response_line.as_bytes()).await {
                        warn!(%err, "failed to write ipc response");
                        break;
                    }
                }
                Err(err) => {
                    warn!(%err, "ipc read error");
                    break;
                }
            }
        }

        info!("IPC connection closed");
    }
    .instrument(span)
    .await;
}

/// Route an IPC command to the appropriate handler.
pub async fn dispatch_command(request: &IpcRequest, state: &AppState) -> IpcResponse {
    let span = info_span!("ipc_command", command = %request.command);
    async move {
        match request.command.as_str() {
            "status" => IpcResponse::from_result(status(state).await),
            "capture" => IpcResponse::from_result(state.capture.toggle().await),
            "type" => match text(request) {
                Ok(text) => IpcResponse::from_result(state.capture.capture_text(text).await),
                Err(err) => IpcResponse::error(err.to_string()),
            },
            "transcript" => IpcResponse::from_result(
                text(request).and_then(|text| state.recognizer.submit_transcript(text)),
            ),
            "recognition_error" => IpcResponse::from_result(recognition_error(request, state)),
            "recognition_end" => IpcResponse::from_result(state.recognizer.stop()),
            "pick" => match request.index {
                Some(index) => {
                    IpcResponse::from_result(state.capture.select_suggestion(index).await)
                }
                None => IpcResponse::error("missing required 'index' field"),
            },
            "cancel" => IpcResponse::from_result(state.capture.cancel_conflict().await),
            "dismiss" => IpcResponse::from_result(state.reminders.dismiss().await),
            "tasks" => IpcResponse::from_result(match request.text.as_deref() {
                Some(term) => state.tasks.search(term).await,
                None => state.tasks.list().await,
            }),
            "task_add" => IpcResponse::from_result(task_add(request, state).await),
            "task_update" => IpcResponse::from_result(task_update(request, state).await),
            "task_status" => IpcResponse::from_result(task_status(request, state).await),
            "task_delete" => IpcResponse::from_result(match id(request) {
                Ok(id) => state.tasks.delete(id).await,
                Err(err) => Err(err),
            }),
            "remind" => IpcResponse::from_result(remind(request, state).await),
            "notes" => IpcResponse::from_result(match request.text.as_deref() {
                Some(term) => state.notes.search(term).await,
                None => state.notes.list().await,
            }),
            "note_add" => IpcResponse::from_result(match &request.note {
                Some(note) => state.notes.create(note.clone()).await,
                None => Err(missing("note")),
            }),
            "note_update" => IpcResponse::from_result(note_update(request, state).await),
            "note_delete" => IpcResponse::from_result(match id(request) {
                Ok(id) => state.notes.delete(id).await,
                Err(err) => Err(err),
            }),
            "events" => IpcResponse::from_result(match request.text.as_deref() {
                Some(term) => state.events.search(term).await,
                None => state.events.list().await,
            }),
            "event_add" => IpcResponse::from_result(match &request.event {
                Some(event) => state.events.create_sorted(event.clone()).await,
                None => Err(missing("event")),
            }),
            "event_update" => IpcResponse::from_result(event_update(request, state).await),
            "event_delete" => IpcResponse::from_result(match id(request) {
                Ok(id) => state.events.delete(id).await,
                Err(err) => Err(err),
            }),
            "grammar" => IpcResponse::from_result(match text(request) {
                Ok(text) => state.helpers.improve_grammar(text).await,
                Err(err) => Err(err),
            }),
            "summarize" => IpcResponse::from_result(match text(request) {
                Ok(text) => state.helpers.summarize(text).await,
                Err(err) => Err(err),
            }),
            "conversation" => IpcResponse::from_result(match text(request) {
                Ok(text) => state.helpers.record_conversation(text, &state.notes).await,
                Err(err) => Err(err),
            }),
            "chat" => IpcResponse::from_result(match text(request) {
                Ok(text) => state.chat.send(text).await,
                Err(err) => Err(err),
            }),
            "chat_history" => IpcResponse::success(json!(state.chat.transcript().await)),
            "digest" => IpcResponse::from_result(state.digest.check().await),
            "voice" => IpcResponse::from_result(voice(request, state).await),
            other => IpcResponse::error(format!("unknown command: {other}")),
        }
    }
    .instrument(span)
    .await
}

async fn status(state: &AppState) -> Result<Value> {
    Ok(json!({
        "capture": state.capture.snapshot().await,
        "quota": state.ledger.snapshot().await?,
        "reminder": state.reminders.active().await,
        "celebrating": state.celebration.is_active(),
        "voiceFeedback": state.settings.voice_feedback().await?,
    }))
}

fn recognition_error(request: &IpcRequest, state: &AppState) -> Result<()> {
    let code = request
        .code
        .clone()
        .ok_or_else(|| missing("code"))?;
    state
        .recognizer
        .report_error(RecognitionErrorCode::from(code))
}

async fn task_add(request: &IpcRequest, state: &AppState) -> Result<Task> {
    let edit = request.task.clone().ok_or_else(|| missing("task"))?;
    let task = Task::new(edit.content, edit.priority, edit.due_date, edit.due_time);
    state.tasks.create(task).await
}

async fn task_update(request: &IpcRequest, state: &AppState) -> Result<Task> {
    let id = id(request)?;
    let edit = request.task.clone().ok_or_else(|| missing("task"))?;
    state.tasks.update(id, edit).await
}

async fn task_status(request: &IpcRequest, state: &AppState) -> Result<Value> {
    let id = id(request)?;
    let raw = request.status.as_deref().ok_or_else(|| missing("status"))?;
    let status = TaskStatus::parse(raw)
        .ok_or_else(|| AppError::InvalidInput(format!("invalid task status: {raw}")))?;
    let change = state.set_task_status(id, status).await?;
    Ok(json!({
        "task": change.task,
        "celebrate": change.just_completed,
    }))
}

async fn remind(request: &IpcRequest, state: &AppState) -> Result<Event> {
    let task = state.tasks.get(id(request)?).await?;
    state.reminders.remind_for_task(&task).await
}

async fn note_update(request: &IpcRequest, state: &AppState) -> Result<Note> {
    let id = id(request)?;
    let note = request.note.clone().ok_or_else(|| missing("note"))?;
    state.notes.update(id, note).await
}

async fn event_update(request: &IpcRequest, state: &AppState) -> Result<Event> {
    let id = id(request)?;
    let event = request.event.clone().ok_or_else(|| missing("event"))?;
    state.events.update(id, event).await
}

async fn voice(request: &IpcRequest, state: &AppState) -> Result<Value> {
    if let Some(enabled) = request.enabled {
        state.settings.set_voice_feedback(enabled).await?;
        info!(enabled, "voice feedback toggled");
    }
    Ok(json!({ "voiceFeedback": state.settings.voice_feedback().await? }))
}

fn id(request: &IpcRequest) -> Result<&str> {
    request.id.as_deref().ok_or_else(|| missing("id"))
}

fn text(request: &IpcRequest) -> Result<&str> {
    request.text.as_deref().ok_or_else(|| missing("text"))
}

fn missing(field: &str) -> AppError {
    AppError::InvalidInput(format!("missing required '{field}' field"))
}
