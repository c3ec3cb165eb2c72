//! # Gemini Backend
//!
//! Calls Gemini `models/{model}:generateContent` directly. Two prompt styles:
//! the instruction inlined in front of the task, or sent separately as the
//! request's `systemInstruction`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, ConfigError};
use crate::models::{BackendKind, GenerationOptions};

use super::http;
use super::{Backend, GenerationRequest};

/// How the role instruction reaches the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// One user prompt: `{instruction}\n\nTask: {task}`
    Inline,
    /// `systemInstruction` + a user message holding the task
    SystemInstruction,
}

pub struct GeminiBackend {
    client: reqwest::Client,
    style: PromptStyle,
}

impl GeminiBackend {
    pub fn new(style: PromptStyle) -> Result<Self, ConfigError> {
        Ok(Self {
            client: http::client()?,
            style,
        })
    }

    fn kind(&self) -> BackendKind {
        match self.style {
            PromptStyle::Inline => BackendKind::Gemini,
            PromptStyle::SystemInstruction => BackendKind::GeminiChat,
        }
    }

    fn build_body(
        &self,
        request: &GenerationRequest<'_>,
        options: &GenerationOptions,
    ) -> GenerateContentRequest {
        let generation_config = GenerationConfig {
            temperature: options.temperature,
        };
        match self.style {
            PromptStyle::Inline => GenerateContentRequest {
                system_instruction: None,
                contents: vec![Content::user(format!(
                    "{}\n\nTask: {}",
                    request.system_instruction, request.user_task
                ))],
                generation_config,
            },
            PromptStyle::SystemInstruction => GenerateContentRequest {
                system_instruction: Some(Content {
                    role: None,
                    parts: vec![Part {
                        text: request.system_instruction.to_string(),
                    }],
                }),
                contents: vec![Content::user(request.user_task.to_string())],
                generation_config,
            },
        }
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    fn name(&self) -> &'static str {
        self.kind().id()
    }

    async fn generate(
        &self,
        request: GenerationRequest<'_>,
        options: &GenerationOptions,
    ) -> Result<String, BackendError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            options.endpoint(self.kind()),
            options.model
        );
        let body = self.build_body(&request, options);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", options.api_key.expose())
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

        let parsed: GenerateContentResponse =
            response.json().await.map_err(http::classify_request_error)?;
        parsed.into_text()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(text: String) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn into_text(self) -> Result<String, BackendError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(BackendError::MalformedResponse(format!(
                "Gemini returned no text ({})",
                reason
            )));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(BackendError::MalformedResponse(format!(
                "Gemini candidate has no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }
}
