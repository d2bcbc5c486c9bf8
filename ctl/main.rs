#![forbid(unsafe_code)]

//! `besto-ctl`: local CLI companion for `besto`.
//!
//! Connects to the IPC socket and sends JSON commands to the daemon.

use std::io::{BufRead, BufReader, Write};

use clap::{Parser, Subcommand};
use interprocess::local_socket::{traits::Stream as _, GenericNamespaced, Stream, ToNsName};
use serde_json::{json, Value};

#[derive(Debug, Parser)]
#[command(
    name = "besto-ctl",
    about = "Local CLI for the besto daemon",
    version,
    long_about = None
)]
struct Cli {
    /// IPC socket name (must match the daemon's `ipc_name` config).
    #[arg(long, default_value = "besto")]
    ipc_name: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show capture state, quota, and any active reminder.
    Status,

    /// Toggle listening on the speech recognizer.
    Capture,

    /// Capture typed text instead of speech.
    Type {
        /// Text to classify.
        text: String,
    },

    /// Feed a recognized transcript to a listening capture.
    Say {
        /// Recognized speech.
        text: String,
    },

    /// Report a recognition error code (e.g. `not-allowed`, `no-speech`).
    Fail {
        /// Engine error code.
        code: String,
    },

    /// Pick one of the offered conflict suggestions (0-based).
    Pick {
        /// Suggestion index.
        index: usize,
    },

    /// Abandon a pending conflict.
    Cancel,

    /// Dismiss the active reminder.
    Dismiss,

    /// List tasks, optionally filtered.
    Tasks {
        /// Case-insensitive search text.
        #[arg(long)]
        search: Option<String>,
    },

    /// Add a task.
    TaskAdd {
        /// Task content.
        content: String,
        /// Priority: none, low, medium, or high.
        #[arg(long)]
        priority: Option<String>,
        /// Due date (YYYY-MM-DD).
        #[arg(long)]
        due: Option<String>,
        /// Due time (HH:MM).
        #[arg(long)]
        at: Option<String>,
    },

    /// Set a task's status: yet-to-start, in-progress, or completed.
    TaskStatus {
        /// Task id.
        id: String,
        /// Target status.
        status: String,
    },

    /// Delete a task.
    TaskDelete {
        /// Task id.
        id: String,
    },

    /// Schedule a reminder for a task.
    Remind {
        /// Task id.
        id: String,
    },

    /// List notes, optionally filtered.
    Notes {
        /// Case-insensitive search text.
        #[arg(long)]
        search: Option<String>,
    },

    /// Add a note.
    NoteAdd {
        /// Note body.
        content: String,
        /// Note title.
        #[arg(long)]
        title: Option<String>,
        /// Tags, repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Delete a note.
    NoteDelete {
        /// Note id.
        id: String,
    },

    /// List events, optionally filtered by title.
    Events {
        /// Case-insensitive search text.
        #[arg(long)]
        search: Option<String>,
    },

    /// Delete an event.
    EventDelete {
        /// Event id.
        id: String,
    },

    /// Correct the grammar of a text.
    Grammar {
        /// Text to correct.
        text: String,
    },

    /// Summarize a text.
    Summarize {
        /// Text to summarize.
        text: String,
    },

    /// Summarize a conversation transcript into a note.
    Conversation {
        /// Raw transcript.
        text: String,
    },

    /// Send a chat message.
    Chat {
        /// Message text.
        text: String,
    },

    /// Show the chat transcript.
    ChatHistory,

    /// Show today's digest if it has not been shown yet.
    Digest,

    /// Enable or disable spoken feedback.
    Voice {
        /// `on` or `off`.
        #[arg(value_parser = parse_toggle)]
        enabled: bool,
    },
}

fn parse_toggle(raw: &str) -> Result<bool, String> {
    match raw {
        "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        other => Err(format!("expected on or off, got {other}")),
    }
}

fn build_request(command: &Command) -> Value {
    match command {
        Command::Status => json!({ "command": "status" }),
        Command::Capture => json!({ "command": "capture" }),
        Command::Type { text } => json!({ "command": "type", "text": text }),
        Command::Say { text } => json!({ "command": "transcript", "text": text }),
        Command::Fail { code } => json!({ "command": "recognition_error", "code": code }),
        Command::Pick { index } => json!({ "command": "pick", "index": index }),
        Command::Cancel => json!({ "command": "cancel" }),
        Command::Dismiss => json!({ "command": "dismiss" }),
        Command::Tasks { search } => with_text(json!({ "command": "tasks" }), search.as_ref()),
        Command::TaskAdd {
            content,
            priority,
            due,
            at,
        } => {
            let mut task = json!({ "content": content });
            if let Some(priority) = priority {
                task["priority"] = Value::String(priority.clone());
            }
            if let Some(due) = due {
                task["dueDate"] = Value::String(due.clone());
            }
            if let Some(at) = at {
                task["dueTime"] = Value::String(at.clone());
            }
            json!({ "command": "task_add", "task": task })
        }
        Command::TaskStatus { id, status } => {
            json!({ "command": "task_status", "id": id, "status": status })
        }
        Command::TaskDelete { id } => json!({ "command": "task_delete", "id": id }),
        Command::Remind { id } => json!({ "command": "remind", "id": id }),
        Command::Notes { search } => with_text(json!({ "command": "notes" }), search.as_ref()),
        Command::NoteAdd {
            content,
            title,
            tags,
        } => json!({
            "command": "note_add",
            "note": {
                "title": title.clone().unwrap_or_default(),
                "content": content,
                "tags": tags,
            }
        }),
        Command::NoteDelete { id } => json!({ "command": "note_delete", "id": id }),
        Command::Events { search } => with_text(json!({ "command": "events" }), search.as_ref()),
        Command::EventDelete { id } => json!({ "command": "event_delete", "id": id }),
        Command::Grammar { text } => json!({ "command": "grammar", "text": text }),
        Command::Summarize { text } => json!({ "command": "summarize", "text": text }),
        Command::Conversation { text } => json!({ "command": "conversation", "text": text }),
        Command::Chat { text } => json!({ "command": "chat", "text": text }),
        Command::ChatHistory => json!({ "command": "chat_history" }),
        Command::Digest => json!({ "command": "digest" }),
        Command::Voice { enabled } => json!({ "command": "voice", "enabled": enabled }),
    }
}

fn with_text(mut request: Value, text: Option<&String>) -> Value {
    if let Some(text) = text {
        request["text"] = Value::String(text.clone());
    }
    request
}

fn main() {
    let args = Cli::parse();
    let request = build_request(&args.command);

    match send_ipc_command(&args.ipc_name, &request) {
        Ok(response) => {
            let ok = response.get("ok").and_then(Value::as_bool).unwrap_or(false);
            if ok {
                match response.get("data") {
                    Some(data) if !data.is_null() => {
                        println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
                    }
                    _ => println!("OK"),
                }
            } else {
                let err_msg = response
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                eprintln!("Error: {err_msg}");
                std::process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("Failed to connect to daemon: {err}");
            eprintln!("Is besto running with ipc_name '{}'?", args.ipc_name);
            std::process::exit(1);
        }
    }
}

/// Connect to the IPC socket, send one JSON line, and read one back.
fn send_ipc_command(
    ipc_name: &str,
    request: &Value,
) -> std::result::Result<Value, Box<dyn std::error::Error>> {
    let name = ipc_name.to_ns_name::<GenericNamespaced>()?;
    let mut stream = Stream::connect(name)?;

    let mut request_line = serde_json::to_string(request)?;
    request_line.push('\n');
    stream.write_all(request_line.as_bytes())?;
    stream.flush()?;

    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader.read_line(&mut response_line)?;

    Ok(serde_json::from_str(response_line.trim())?)
}
