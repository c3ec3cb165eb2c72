//! # Generation Backends
//!
//! One adapter per backend family, all behind the [`Backend`] trait. The
//! pipeline only ever sees `Arc<dyn Backend>`.
//!
//! | id | adapter |
//! |---|---|
//! | `gemini` | [`GeminiBackend`] with [`PromptStyle::Inline`] |
//! | `gemini-chat` | [`GeminiBackend`] with [`PromptStyle::SystemInstruction`] |
//! | `openai` | [`ChatCompletionsBackend`] reading `message.content` |
//! | `gemini-compat` | [`ChatCompletionsBackend`] extracting from the message object |
//! | `radkit` | [`RadkitBackend`] extracting from a structured task report |

pub mod extract;
pub mod gemini;
mod http;
pub mod openai;
pub mod radkit_backend;

use async_trait::async_trait;
use std::sync::Arc;

use crate::agents::AgentRole;
use crate::config::ResolvedConfig;
use crate::error::{BackendError, ConfigError};
use crate::models::{BackendKind, GenerationOptions};

pub use extract::{extract_text, ExtractedText};
pub use gemini::{GeminiBackend, PromptStyle};
pub use openai::{ChatCompletionsBackend, ReplyShape};
pub use radkit_backend::RadkitBackend;

/// A single generation request
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Role issuing the call (logging only)
    pub role: AgentRole,
    pub system_instruction: &'a str,
    pub user_task: &'a str,
}

/// Capability: given an instruction and a task, return generated text.
///
/// Implementations are stateless per call and shared across concurrent runs.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    async fn generate(
        &self,
        request: GenerationRequest<'_>,
        options: &GenerationOptions,
    ) -> Result<String, BackendError>;
}

/// Build the adapter for a resolved configuration
pub fn build_backend(config: &ResolvedConfig) -> Result<Arc<dyn Backend>, ConfigError> {
    let backend: Arc<dyn Backend> = match config.backend {
        BackendKind::Gemini => Arc::new(GeminiBackend::new(PromptStyle::Inline)?),
        BackendKind::GeminiChat => Arc::new(GeminiBackend::new(PromptStyle::SystemInstruction)?),
        BackendKind::OpenAI => Arc::new(ChatCompletionsBackend::openai()?),
        BackendKind::GeminiCompat => Arc::new(ChatCompletionsBackend::gemini_compat()?),
        BackendKind::Radkit => Arc::new(RadkitBackend::new()),
    };
    tracing::info!(
        backend = backend.name(),
        model = %config.options.model,
        temperature = config.options.temperature,
        "Backend ready"
    );
    Ok(backend)
}
