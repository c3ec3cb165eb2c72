//! # Chat Completions Backend
//!
//! OpenAI-style `POST {base}/chat/completions` with a system and a user
//! message. Serves two families:
//! - `openai` - the assistant message's `content` must be a string
//! - `gemini-compat` - Gemini's OpenAI-compatible endpoint; the assistant
//!   message object goes through [`extract_text`]

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::{BackendError, ConfigError};
use crate::models::{BackendKind, GenerationOptions};

use super::extract::extract_text;
use super::http;
use super::{Backend, GenerationRequest};

/// How the reply text is read from the first choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    /// `choices[0].message.content` as a string
    MessageContent,
    /// `choices[0].message` resolved with the ordered extraction strategy
    Extracted,
}

pub struct ChatCompletionsBackend {
    client: reqwest::Client,
    kind: BackendKind,
    shape: ReplyShape,
}

impl ChatCompletionsBackend {
    /// OpenAI chat completions
    pub fn openai() -> Result<Self, ConfigError> {
        Ok(Self {
            client: http::client()?,
            kind: BackendKind::OpenAI,
            shape: ReplyShape::MessageContent,
        })
    }

    /// Gemini through its OpenAI-compatible endpoint
    pub fn gemini_compat() -> Result<Self, ConfigError> {
        Ok(Self {
            client: http::client()?,
            kind: BackendKind::GeminiCompat,
            shape: ReplyShape::Extracted,
        })
    }

    fn read_reply(&self, body: Value) -> Result<String, BackendError> {
        let message = body
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .ok_or_else(|| {
                BackendError::MalformedResponse("response has no choices[0].message".to_string())
            })?;

        match self.shape {
            ReplyShape::MessageContent => match message.get("content") {
                Some(Value::String(text)) => Ok(text.clone()),
                Some(other) => Err(BackendError::MalformedResponse(format!(
                    "message content is not text: {}",
                    other
                ))),
                None => Err(BackendError::MalformedResponse(
                    "message has no content".to_string(),
                )),
            },
            ReplyShape::Extracted => {
                // A chat message always carries its text under `content`
                if message.is_object() && message.get("content").is_none() {
                    return Err(BackendError::MalformedResponse(
                        "message has no content".to_string(),
                    ));
                }
                let extracted = extract_text(message)?;
                tracing::trace!(?extracted, "Extracted chat reply");
                Ok(extracted.into_text())
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[async_trait]
impl Backend for ChatCompletionsBackend {
    fn name(&self) -> &'static str {
        self.kind.id()
    }

    async fn generate(
        &self,
        request: GenerationRequest<'_>,
        options: &GenerationOptions,
    ) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", options.endpoint(self.kind));

        let body = ChatRequest {
            model: &options.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: request.user_task,
                },
            ],
            temperature: options.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(options.api_key.expose())
            .timeout(options.timeout)
            .json(&body)
            .send()
            .await
            .map_err(http::classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(http::classify_status(status, &body));
        }

        let body: Value = response.json().await.map_err(http::classify_request_error)?;
        self.read_reply(body)
    }
}
