//! # Radkit Backend
//!
//! Runs each stage as a radkit `LlmFunction` that fills in a structured
//! [`TaskReport`]. The report is resolved to text with [`extract_text`],
//! the same way any other structured reply is.
//!
//! The Gemini client is built per call from the [`GenerationOptions`] it is
//! handed: key, model, temperature and endpoint all come from there.

use async_trait::async_trait;
use radkit::agent::LlmFunction;
use radkit::errors::AgentError as RadkitError;
use radkit::macros::LLMOutput;
use radkit::models::providers::GeminiLlm;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::models::{BackendKind, GenerationOptions};

use super::extract::extract_text;
use super::{Backend, GenerationRequest};

/// Output of one task
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, LLMOutput)]
pub struct TaskReport {
    /// The complete text produced for the task, with no commentary about it
    pub raw: String,
}

#[derive(Debug, Default)]
pub struct RadkitBackend;

impl RadkitBackend {
    pub fn new() -> Self {
        Self
    }
}

/// radkit joins `models/...` straight onto its base URL
fn gemini_llm(options: &GenerationOptions) -> GeminiLlm {
    GeminiLlm::new(options.model.as_str(), options.api_key.expose())
        .with_temperature(options.temperature)
        .with_base_url(format!("{}/v1beta/", options.endpoint(BackendKind::Radkit)))
}

#[async_trait]
impl Backend for RadkitBackend {
    fn name(&self) -> &'static str {
        "radkit"
    }

    async fn generate(
        &self,
        request: GenerationRequest<'_>,
        options: &GenerationOptions,
    ) -> Result<String, BackendError> {
        let func = LlmFunction::<TaskReport>::new_with_system_instructions(
            gemini_llm(options),
            request.system_instruction.to_string(),
        );

        let report = match tokio::time::timeout(
            options.timeout,
            func.run(request.user_task.to_string()),
        )
        .await
        {
            Ok(result) => result.map_err(|e| classify_error(&e))?,
            Err(_) => {
                return Err(BackendError::Transport(format!(
                    "radkit call timed out after {}s",
                    options.timeout.as_secs_f32()
                )))
            }
        };

        let value = serde_json::to_value(&report)
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
        Ok(extract_text(&value)?.into_text())
    }
}

fn classify_error(err: &RadkitError) -> BackendError {
    let message = err.to_string();
    match err {
        RadkitError::LlmAuthentication { .. }
        | RadkitError::InvalidCredentials { .. }
        | RadkitError::MissingConfiguration { .. }
        | RadkitError::InvalidConfiguration { .. } => BackendError::Authentication(message),
        RadkitError::LlmRateLimit { .. } | RadkitError::ResourceExhausted { .. } => {
            BackendError::RateLimit(message)
        }
        RadkitError::Serialization { .. }
        | RadkitError::Validation { .. }
        | RadkitError::ContentFiltered { .. } => BackendError::MalformedResponse(message),
        // Gemini reports a bad key as 400 INVALID_ARGUMENT
        RadkitError::LlmProvider { message: detail, .. }
            if detail.contains("API key not valid") || detail.contains("API_KEY_INVALID") =>
        {
            BackendError::Authentication(message)
        }
        RadkitError::LlmProvider { message: detail, .. }
            if detail.contains("RESOURCE_EXHAUSTED") =>
        {
            BackendError::RateLimit(message)
        }
        RadkitError::LlmProvider { message: detail, .. }
            if detail.contains("candidates") || detail.contains("content.parts") =>
        {
            BackendError::MalformedResponse(message)
        }
        _ => BackendError::Transport(message),
    }
}
