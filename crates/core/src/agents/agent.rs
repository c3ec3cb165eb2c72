//! # Agent
//!
//! Binds a role's fixed instruction to a backend. Stateless: every call is
//! an independent generation request, nothing is remembered between calls.

use std::sync::Arc;

use crate::backends::{Backend, GenerationRequest};
use crate::error::{AgentError, BackendError};
use crate::models::GenerationOptions;

use super::{prompts, AgentRole};

/// A role bound to an instruction and a backend
#[derive(Clone)]
pub struct Agent {
    role: AgentRole,
    instruction: &'static str,
    backend: Arc<dyn Backend>,
    options: Arc<GenerationOptions>,
}

impl Agent {
    /// Create an agent with the role's bundled instruction
    pub fn new(role: AgentRole, backend: Arc<dyn Backend>, options: Arc<GenerationOptions>) -> Self {
        Self {
            role,
            instruction: prompts::default_instruction(role),
            backend,
            options,
        }
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn instruction(&self) -> &str {
        self.instruction
    }

    /// Run one generation for `task`.
    ///
    /// Returns the backend's text unmodified. Backend errors are propagated
    /// as-is; an empty reply is reported as a malformed response so callers
    /// never see blank output.
    pub async fn execute(&self, task: &str) -> Result<String, AgentError> {
        if task.trim().is_empty() {
            return Err(AgentError::EmptyTask { role: self.role });
        }

        let request = GenerationRequest {
            role: self.role,
            system_instruction: self.instruction,
            user_task: task,
        };

        tracing::debug!(
            role = %self.role,
            backend = self.backend.name(),
            model = %self.options.model,
            task_chars = task.len(),
            "Agent call"
        );

        let text = self.backend.generate(request, &self.options).await?;
        if text.trim().is_empty() {
            return Err(BackendError::MalformedResponse(format!(
                "{} backend returned empty text",
                self.backend.name()
            ))
            .into());
        }

        Ok(text)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("role", &self.role)
            .field("backend", &self.backend.name())
            .field("model", &self.options.model)
            .finish()
    }
}
