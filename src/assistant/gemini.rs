//! Google Gemini `generateContent` client.

use std::time::Duration;

use base64::Engine as _;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::AssistantConfig;
use crate::models::chat::{ChatMessage, ChatRole};
use crate::models::classification::ClassificationResult;
use crate::models::event::CalendarEntry;
use crate::{AppError, Result};

use super::{prompts, AssistantFuture, AssistantService};

/// HTTP client for the generative language API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    config: AssistantConfig,
}

impl GeminiClient {
    /// Build a client with the configured per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn new(config: AssistantConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|err| AppError::Config(format!("failed to build http client: {err}")))?;
        Ok(Self { client, config })
    }

    async fn generate_content(&self, model: &str, request: &GeminiRequest) -> Result<GeminiResponse> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.api_base.trim_end_matches('/'),
            model,
            self.config.api_key
        );

        let resp = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            warn!(%status, model, "gemini request rejected");
            return Err(AppError::ExternalService(format!(
                "gemini api error ({status}): {text}"
            )));
        }

        let body = resp.text().await?;
        serde_json::from_str(&body)
            .map_err(|err| AppError::MalformedData(format!("invalid gemini response: {err}")))
    }

    async fn text_reply(&self, request: &GeminiRequest) -> Result<String> {
        let response = self.generate_content(&self.config.model, request).await?;
        let text = response.first_text()?;
        Ok(text.trim().to_owned())
    }
}

impl AssistantService for GeminiClient {
    fn classify<'a>(
        &'a self,
        text: &'a str,
        calendar: &'a [CalendarEntry],
        today: NaiveDate,
    ) -> AssistantFuture<'a, ClassificationResult> {
        Box::pin(async move {
            let request = GeminiRequest {
                contents: vec![Content::user(prompts::classification(text, calendar, today))],
                system_instruction: None,
                generation_config: Some(GenerationConfig {
                    response_mime_type: Some("application/json".into()),
                    response_schema: Some(prompts::classification_schema()),
                    ..GenerationConfig::default()
                }),
            };
            let raw = self.text_reply(&request).await?;
            debug!(bytes = raw.len(), "classification received");
            serde_json::from_str(&raw).map_err(|err| {
                AppError::MalformedData(format!("classification is not valid json: {err}"))
            })
        })
    }

    fn generate<'a>(&'a self, prompt: String) -> AssistantFuture<'a, String> {
        Box::pin(async move {
            let request = GeminiRequest {
                contents: vec![Content::user(prompt)],
                system_instruction: None,
                generation_config: None,
            };
            self.text_reply(&request).await
        })
    }

    fn chat<'a>(
        &'a self,
        history: &'a [ChatMessage],
        message: &'a str,
    ) -> AssistantFuture<'a, String> {
        Box::pin(async move {
            let mut contents: Vec<Content> = history.iter().map(Content::from).collect();
            contents.push(Content::user(message.to_owned()));
            let request = GeminiRequest {
                contents,
                system_instruction: Some(Content::user(prompts::PERSONA.to_owned())),
                generation_config: None,
            };
            self.text_reply(&request).await
        })
    }

    fn synthesize<'a>(&'a self, text: &'a str) -> AssistantFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            let request = GeminiRequest {
                contents: vec![Content::user(text.to_owned())],
                system_instruction: None,
                generation_config: Some(GenerationConfig {
                    response_modalities: Some(vec!["AUDIO".into()]),
                    speech_config: Some(json!({
                        "voiceConfig": {
                            "prebuiltVoiceConfig": { "voiceName": self.config.voice },
                        },
                    })),
                    ..GenerationConfig::default()
                }),
            };
            let response = self
                .generate_content(&self.config.speech_model, &request)
                .await?;

            let Some(encoded) = response.first_inline_data() else {
                return Ok(None);
            };
            let pcm = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|err| AppError::MalformedData(format!("invalid audio payload: {err}")))?;
            Ok(Some(pcm))
        })
    }
}

// ============================================================
// Wire types
// ============================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<RequestPart>,
}

impl Content {
    fn user(text: String) -> Self {
        Self {
            role: "user",
            parts: vec![RequestPart { text }],
        }
    }
}

impl From<&ChatMessage> for Content {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        };
        Self {
            role,
            parts: vec![RequestPart {
                text: message.content.clone(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GeminiResponse {
    fn parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or_default()
    }

    fn first_text(&self) -> Result<String> {
        if self.candidates.is_empty() {
            return Err(AppError::ExternalService(
                "gemini api error: empty candidates".into(),
            ));
        }
        let text: String = self
            .parts()
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        Ok(text)
    }

    fn first_inline_data(&self) -> Option<&str> {
        self.parts()
            .iter()
            .find_map(|part| part.inline_data.as_ref())
            .map(|data| data.data.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Deserialize)]
struct InlineData {
    data: String,
}
