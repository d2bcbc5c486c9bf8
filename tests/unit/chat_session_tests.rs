use std::sync::Arc;

use besto::assistant::chat::{ChatSession, ERROR_REPLY, NO_TOKENS_REPLY};
use besto::assistant::prompts::GREETING;
use besto::assistant::AssistantService;
use besto::models::chat::{ChatMessage, ChatRole};
use besto::quota::QuotaLedger;
use besto::AppError;

use crate::common::{clock_at, count, ledger, memory_store, monday_morning, FakeAssistant};

fn session() -> (ChatSession, Arc<FakeAssistant>, Arc<QuotaLedger>) {
    let store = memory_store();
    let assistant = Arc::new(FakeAssistant::default());
    let ledger = ledger(&store, &clock_at(monday_morning()));
    let chat = ChatSession::new(
        Arc::clone(&assistant) as Arc<dyn AssistantService>,
        Arc::clone(&ledger),
    );
    (chat, assistant, ledger)
}

#[tokio::test]
async fn session_opens_with_greeting() {
    let (chat, _, _) = session();
    assert_eq!(chat.transcript().await, vec![ChatMessage::model(GREETING)]);
}

#[tokio::test]
async fn reply_is_charged_and_recorded() {
    let (chat, assistant, ledger) = session();
    assistant.set_reply(Some("Try time-blocking."));

    let reply = chat.send("how do I focus?").await.expect("send");
    assert_eq!(reply, ChatMessage::model("Try time-blocking."));
    assert_eq!(ledger.remaining().await.expect("remaining"), 975);

    let transcript = chat.transcript().await;
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[1], ChatMessage::user("how do I focus?"));
}

#[tokio::test]
async fn greeting_and_failures_stay_out_of_model_context() {
    let (chat, assistant, _) = session();

    assistant.set_reply(None);
    let failed = chat.send("first").await.expect("send");
    assert_eq!(failed.content, ERROR_REPLY);
    assert!(assistant.history_seen().is_empty());

    assistant.set_reply(Some("answer"));
    chat.send("second").await.expect("send");
    assert!(assistant.history_seen().is_empty());

    chat.send("third").await.expect("send");
    let history = assistant.history_seen();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], ChatMessage::user("second"));
    assert_eq!(history[1].role, ChatRole::Model);
}

#[tokio::test]
async fn low_balance_gets_apology_without_model_call() {
    let (chat, assistant, ledger) = session();
    ledger.try_consume(990).await.expect("drain");

    let reply = chat.send("hello").await.expect("send");
    assert_eq!(reply.content, NO_TOKENS_REPLY);
    assert_eq!(count(&assistant.chat_calls), 0);
    assert_eq!(ledger.remaining().await.expect("remaining"), 10);
    assert_eq!(chat.transcript().await.len(), 3);
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let (chat, _, ledger) = session();
    assert!(matches!(chat.send("  ").await, Err(AppError::InvalidInput(_))));
    assert_eq!(ledger.remaining().await.expect("remaining"), 1000);
}
