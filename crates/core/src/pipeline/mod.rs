//! # Content Pipeline
//!
//! ```text
//! Topic → Researcher → Writer → Proofreader → Summarizer → ResultBundle
//! ```
//!
//! `START → RESEARCHED → DRAFTED → REFINED → SUMMARIZED`, or `FAILED` on the
//! first stage error. There is no partial success.

pub mod bundle;
pub mod events;
pub mod orchestrator;
pub mod run;
pub mod stage;

pub use bundle::ResultBundle;
pub use events::{PipelineEvent, PipelineEventKind};
pub use orchestrator::{ContentPipeline, EMPTY_TOPIC_MESSAGE};
pub use run::PipelineRun;
pub use stage::{RunState, Stage};
