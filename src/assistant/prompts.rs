//! Prompt text and response schemas sent to the model.

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::models::event::CalendarEntry;

/// System instruction for the chat persona.
pub const PERSONA: &str =
    "You are a helpful and friendly productivity assistant named Besto. Keep your responses concise and helpful.";

/// First line shown when a chat session opens. Never sent to the model.
pub const GREETING: &str = "Hello! I'm Besto. How can I help you be more productive today?";

/// Build the classification prompt for `text`.
#[must_use]
pub fn classification(text: &str, calendar: &[CalendarEntry], today: NaiveDate) -> String {
    let mut context = String::new();
    for entry in calendar {
        let _ = write!(context, "- {} on {}", entry.title, entry.start_date);
        if let Some(time) = entry.start_time {
            let _ = write!(context, " at {}", time.format("%H:%M"));
        }
        context.push('\n');
    }
    if context.is_empty() {
        context.push_str("The calendar is empty.\n");
    }

    format!(
        "You are an intelligent scheduling and task management assistant. Analyze the user's \
command, check for calendar conflicts, and provide suggestions if necessary. Today's date is {today}.

User's current calendar:
{context}
User's command: \"{text}\"

Instructions:
1. ALWAYS generate a concise summary of the user's command. This will be saved as a note.
2. Classify the primary intent. If the user lists multiple distinct tasks, classify the type as \
'multi_task'. Otherwise, classify as 'task', 'note', or 'event'.
3. ALWAYS return the 'data' field as an array. For single items, it will be an array with one object.
4. For 'multi_task', create a separate object for each task in the 'data' array.
5. If the intent is a single 'task' and the user implies urgency, set 'priority' to \"high\" and \
set a 'date' for 2 days from today. Otherwise, priority is \"none\".
6. If it is an 'event', extract the title, date (YYYY-MM-DD), and time (HH:MM, 24-hour).
7. Identify the event type ('reminder', 'birthday', 'meeting', etc.).
8. A conflict exists if another event is within an hour of the requested time.
9. If a conflict exists: set 'conflict' to true and suggest exactly 3 alternative open slots \
formatted \"YYYY-MM-DD HH:MM\".
10. If no conflict, set 'conflict' to false.
11. Return the full response in the required JSON format."
    )
}

/// Response schema constraining the classification reply.
#[must_use]
pub fn classification_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "type": {
                "type": "STRING",
                "enum": ["task", "multi_task", "note", "event", "unknown"],
            },
            "summary": { "type": "STRING" },
            "data": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "content": { "type": "STRING" },
                        "date": { "type": "STRING" },
                        "time": { "type": "STRING" },
                        "priority": {
                            "type": "STRING",
                            "enum": ["none", "low", "medium", "high"],
                        },
                        "eventType": {
                            "type": "STRING",
                            "enum": [
                                "meeting", "appointment", "reminder", "other",
                                "birthday", "anniversary", "important-date",
                            ],
                        },
                        "conflict": { "type": "BOOLEAN" },
                        "suggestions": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                        },
                    },
                },
            },
        },
        "required": ["type", "summary", "data"],
    })
}

/// Spelling and grammar correction.
#[must_use]
pub fn improve_grammar(text: &str) -> String {
    format!("Correct any spelling and grammar mistakes in the following text:\n\n\"{text}\"")
}

/// Concise summary.
#[must_use]
pub fn summarize(text: &str) -> String {
    format!("Summarize the following text concisely:\n\n\"{text}\"")
}

/// Meeting-style summary of a recorded conversation.
#[must_use]
pub fn summarize_conversation(transcript: &str) -> String {
    format!(
        "You are an expert meeting summarizer. Take the following conversation transcript and \
provide a concise summary. Structure the summary with sections for 'Key Points', 'Decisions \
Made', and 'Action Items'. If any section is not applicable, omit it. Format the output using \
Markdown.

Transcript:
\"{transcript}\""
    )
}
