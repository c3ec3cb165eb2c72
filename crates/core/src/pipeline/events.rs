//! # Pipeline Events
//!
//! Progress events emitted while a run executes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::Stage;

/// Kind of pipeline event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineEventKind {
    /// Topic accepted, first stage about to run
    RunStarted,
    /// Agent started working on a stage
    StageStarted,
    /// Stage output recorded
    StageCompleted,
    /// Stage failed, run aborts
    StageFailed,
    /// All four outputs recorded
    RunCompleted,
    /// Run aborted
    RunFailed,
}

/// An event in a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// Unique event ID
    pub id: String,
    /// Run this event belongs to
    pub run_id: String,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Kind of event
    pub kind: PipelineEventKind,
    /// Stage, for stage-level events
    #[serde(default)]
    pub stage: Option<Stage>,
    /// Associated data (JSON)
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl PipelineEvent {
    /// Create a new event
    pub fn new(kind: PipelineEventKind, run_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            run_id: run_id.to_string(),
            timestamp: Utc::now(),
            kind,
            stage: None,
            data: None,
        }
    }

    /// Attach the stage
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Add data to the event
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
