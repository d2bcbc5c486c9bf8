use besto::assistant::gemini::GeminiClient;
use besto::assistant::prompts::PERSONA;
use besto::assistant::AssistantService;
use besto::config::AssistantConfig;
use besto::models::chat::ChatMessage;
use besto::models::classification::ClassificationType;
use besto::AppError;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::date;

const TEXT_PATH: &str = "/models/gemini-2.5-flash:generateContent";
const SPEECH_PATH: &str = "/models/gemini-2.5-flash-preview-tts:generateContent";

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new(AssistantConfig {
        api_base: server.uri(),
        api_key: "test-key".into(),
        timeout_seconds: 5,
        ..AssistantConfig::default()
    })
    .expect("client builds")
}

fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    }))
}

async fn last_request_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.expect("recording enabled");
    let last = requests.last().expect("one request");
    serde_json::from_slice(&last.body).expect("json body")
}

#[tokio::test]
async fn classify_requests_json_and_parses_reply() {
    let server = MockServer::start().await;
    let reply = json!({
        "type": "task",
        "summary": "Buy milk",
        "data": [{ "content": "buy milk", "priority": "none" }]
    })
    .to_string();
    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(text_response(&reply))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .classify("buy milk", &[], date(2025, 3, 10))
        .await
        .expect("classify");
    assert_eq!(result.kind, ClassificationType::Task);
    assert_eq!(result.summary, "Buy milk");
    assert_eq!(result.data[0].content.as_deref(), Some("buy milk"));

    let body = last_request_body(&server).await;
    assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text");
    assert!(prompt.contains("buy milk"));
}

#[tokio::test]
async fn classify_rejects_non_json_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(text_response("Sure! Here's your task."))
        .mount(&server)
        .await;

    let err = client(&server)
        .classify("x", &[], date(2025, 3, 10))
        .await
        .expect_err("malformed");
    assert!(matches!(err, AppError::MalformedData(_)));
}

#[tokio::test]
async fn http_error_becomes_external_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate("hi".into())
        .await
        .expect_err("server error");
    assert!(
        matches!(&err, AppError::ExternalService(msg) if msg.contains("500") && msg.contains("boom")),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn empty_candidates_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate("hi".into())
        .await
        .expect_err("no candidates");
    assert!(matches!(err, AppError::ExternalService(_)));
}

#[tokio::test]
async fn generate_joins_parts_and_trims() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": " Hello, " }, { "text": "world. " }] } }]
        })))
        .mount(&server)
        .await;

    let reply = client(&server).generate("greet".into()).await.expect("generate");
    assert_eq!(reply, "Hello, world.");
}

#[tokio::test]
async fn chat_sends_persona_and_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [{ "text": PERSONA }] }
        })))
        .respond_with(text_response("Sure."))
        .expect(1)
        .mount(&server)
        .await;

    let history = vec![ChatMessage::user("hi"), ChatMessage::model("hello")];
    let reply = client(&server)
        .chat(&history, "help me plan")
        .await
        .expect("chat");
    assert_eq!(reply, "Sure.");

    let body = last_request_body(&server).await;
    let roles: Vec<&str> = body["contents"]
        .as_array()
        .expect("contents")
        .iter()
        .filter_map(|c| c["role"].as_str())
        .collect();
    assert_eq!(roles, vec!["user", "model", "user"]);
    assert_eq!(body["contents"][2]["parts"][0]["text"], "help me plan");
}

#[tokio::test]
async fn synthesize_decodes_inline_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SPEECH_PATH))
        .and(body_partial_json(json!({
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": { "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": "Kore" } } }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{
                "inlineData": { "mimeType": "audio/L16;rate=24000", "data": "AQACAA==" }
            }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let audio = client(&server).synthesize("Task created!").await.expect("synthesize");
    assert_eq!(audio, Some(vec![1, 0, 2, 0]));
}

#[tokio::test]
async fn synthesize_without_audio_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SPEECH_PATH))
        .respond_with(text_response("no audio today"))
        .mount(&server)
        .await;

    let audio = client(&server).synthesize("hi").await.expect("synthesize");
    assert!(audio.is_none());
}

#[tokio::test]
async fn invalid_audio_payload_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SPEECH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": { "data": "@@not base64@@" } }] } }]
        })))
        .mount(&server)
        .await;

    let err = client(&server).synthesize("hi").await.expect_err("bad audio");
    assert!(matches!(err, AppError::MalformedData(_)));
}
