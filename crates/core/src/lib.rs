//! # Scribe Core
//!
//! The "Pipeline" of the Scribe system - agent roles, generation backends
//! and the four-stage content pipeline.
//!
//! ## Architecture
//!
//! - `agents/` - Role-bound agents (Researcher, Writer, Proofreader, Summarizer)
//! - `backends/` - One adapter per generation backend family
//! - `pipeline/` - Run state machine, orchestrator and result bundle
//! - `models` - Backend families and generation options
//! - `config` - Startup configuration and credential resolution
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scribe_core::backends::build_backend;
//! use scribe_core::config::ScribeConfig;
//! use scribe_core::pipeline::ContentPipeline;
//!
//! let resolved = ScribeConfig::load().await?.resolve()?;
//! let backend = build_backend(&resolved)?;
//! let pipeline = ContentPipeline::new(backend, resolved.options);
//! let bundle = pipeline.run("solar energy").await?;
//! ```

pub mod agents;
pub mod backends;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;

pub use error::{AgentError, BackendError, ConfigError, PipelineError};
