//! # Errors
//!
//! Typed failures for startup configuration, backend calls and pipeline runs.

use std::path::PathBuf;

use crate::agents::AgentRole;
use crate::pipeline::{PipelineRun, RunState, Stage};

/// Fatal startup conditions. The process refuses to start on any of these.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} not found in environment or .env file")]
    MissingCredential { var: &'static str },

    #[error("temperature must be within [0, 1], got {0}")]
    InvalidTemperature(f32),

    #[error("unknown backend '{0}' (expected one of: gemini, gemini-chat, openai, gemini-compat, radkit)")]
    UnknownBackend(String),

    #[error("failed to read config file {}: {reason}", path.display())]
    InvalidConfigFile { path: PathBuf, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Failure of a single generation call. Fatal for the current run, never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited: {0}")]
    RateLimit(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl BackendError {
    /// Machine-readable category
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Authentication(_) => "authentication",
            BackendError::Transport(_) => "transport",
            BackendError::RateLimit(_) => "rate_limit",
            BackendError::MalformedResponse(_) => "malformed_response",
        }
    }

    /// One human-readable line per category, for the operator
    pub fn user_message(&self) -> &'static str {
        match self {
            BackendError::Authentication(_) => {
                "The backend rejected the API key. Check your credentials and try again."
            }
            BackendError::Transport(_) => {
                "Could not reach the backend (network error or timeout). Try again."
            }
            BackendError::RateLimit(_) => {
                "The backend is rate limiting requests. Wait a moment and try again."
            }
            BackendError::MalformedResponse(_) => {
                "The backend returned a response that could not be read. Try again."
            }
        }
    }
}

/// Failure of an agent call
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("{role} received an empty task")]
    EmptyTask { role: AgentRole },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Failure of a pipeline run. No partial result bundle is ever produced.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),

    #[error("{stage} stage failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: BackendError,
        /// The aborted run, kept for diagnostics only
        partial: Box<PipelineRun>,
    },

    #[error("{attempted} stage recorded out of order (run is at {current})")]
    OutOfOrder { attempted: Stage, current: RunState },
}

impl PipelineError {
    /// Machine-readable category
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::StageFailed { source, .. } => source.kind(),
            PipelineError::OutOfOrder { .. } => "internal",
        }
    }

    /// Stage that failed, if the run got past validation
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::StageFailed { stage, .. } => Some(*stage),
            PipelineError::OutOfOrder { attempted, .. } => Some(*attempted),
            PipelineError::Validation(_) => None,
        }
    }

    /// Message shown inline to the operator
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Validation(reason) => reason.clone(),
            PipelineError::StageFailed { stage, source, .. } => {
                format!("{} failed. {}", stage.title(), source.user_message())
            }
            PipelineError::OutOfOrder { .. } => {
                "The pipeline hit an internal error. Try again.".to_string()
            }
        }
    }
}
