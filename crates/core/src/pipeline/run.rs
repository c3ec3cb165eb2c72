//! # Pipeline Run
//!
//! Per-invocation record. Owned by the call that created it; fields fill in
//! stage order and are write-once.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::PipelineError;

use super::bundle::ResultBundle;
use super::stage::{RunState, Stage};

#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    id: String,
    topic: String,
    started_at: DateTime<Utc>,
    state: RunState,
    research: Option<String>,
    article: Option<String>,
    refined: Option<String>,
    summary: Option<String>,
}

impl PipelineRun {
    pub fn new(topic: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4(), topic)
    }

    /// Start a run under a caller-chosen id
    pub fn with_id(id: uuid::Uuid, topic: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            topic: topic.into(),
            started_at: Utc::now(),
            state: RunState::Start,
            research: None,
            article: None,
            refined: None,
            summary: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn research(&self) -> Option<&str> {
        self.research.as_deref()
    }

    pub fn article(&self) -> Option<&str> {
        self.article.as_deref()
    }

    pub fn refined(&self) -> Option<&str> {
        self.refined.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Stage to run next, `None` once terminal
    pub fn next_stage(&self) -> Option<Stage> {
        self.state.next_stage()
    }

    /// Input for `stage`: the topic, then each previous stage's output
    pub fn input_for(&self, stage: Stage) -> Option<&str> {
        match stage {
            Stage::Research => Some(&self.topic),
            Stage::Write => self.research(),
            Stage::Proofread => self.article(),
            Stage::Summarize => self.refined(),
        }
    }

    /// Output recorded for `stage`, if any
    pub fn output_of(&self, stage: Stage) -> Option<&str> {
        match stage {
            Stage::Research => self.research(),
            Stage::Write => self.article(),
            Stage::Proofread => self.refined(),
            Stage::Summarize => self.summary(),
        }
    }

    /// Record `stage`'s output and advance.
    ///
    /// Rejected unless `stage` is the one the run is waiting on and its
    /// field is still empty.
    pub fn record(&mut self, stage: Stage, output: String) -> Result<(), PipelineError> {
        let out_of_order = PipelineError::OutOfOrder {
            attempted: stage,
            current: self.state,
        };
        if self.state.next_stage() != Some(stage) {
            return Err(out_of_order);
        }

        let slot = match stage {
            Stage::Research => &mut self.research,
            Stage::Write => &mut self.article,
            Stage::Proofread => &mut self.refined,
            Stage::Summarize => &mut self.summary,
        };
        if slot.is_some() {
            return Err(out_of_order);
        }
        *slot = Some(output);

        self.state.advance();
        Ok(())
    }

    /// Mark the run failed. Recorded outputs stay for diagnostics.
    pub fn fail(&mut self) {
        self.state.fail();
    }

    /// The result bundle, only for a run that reached SUMMARIZED
    pub fn into_bundle(self) -> Option<ResultBundle> {
        if !self.state.is_success() {
            return None;
        }
        Some(ResultBundle::new(
            self.research?,
            self.article?,
            self.refined?,
            self.summary?,
        ))
    }
}
