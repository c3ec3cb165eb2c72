//! # Pipeline Stages
//!
//! Defines the four stages and the run state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agents::AgentRole;

/// One of the four fixed pipeline steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Researcher gathers facts about the topic
    Research,
    /// Writer drafts the article
    Write,
    /// Proofreader polishes the draft
    Proofread,
    /// Summarizer condenses the refined article
    Summarize,
}

impl Stage {
    /// All stages in execution order
    pub const ALL: [Stage; 4] = [Stage::Research, Stage::Write, Stage::Proofread, Stage::Summarize];

    /// Agent that runs this stage
    pub fn role(&self) -> AgentRole {
        match self {
            Stage::Research => AgentRole::Researcher,
            Stage::Write => AgentRole::Writer,
            Stage::Proofread => AgentRole::Proofreader,
            Stage::Summarize => AgentRole::Summarizer,
        }
    }

    /// Name of the run field this stage fills
    pub fn output_field(&self) -> &'static str {
        match self {
            Stage::Research => "research",
            Stage::Write => "article",
            Stage::Proofread => "refined",
            Stage::Summarize => "summary",
        }
    }

    /// Section heading for this stage's output
    pub fn title(&self) -> &'static str {
        match self {
            Stage::Research => "Research",
            Stage::Write => "Article",
            Stage::Proofread => "Refined",
            Stage::Summarize => "Summary",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Research => "research",
            Stage::Write => "write",
            Stage::Proofread => "proofread",
            Stage::Summarize => "summarize",
        };
        f.write_str(name)
    }
}

/// Where a run is. Each transition is one blocking stage; no branches, no re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Start,
    Researched,
    Drafted,
    Refined,
    /// Terminal, all four outputs present
    Summarized,
    /// Terminal, a stage failed
    Failed,
}

impl RunState {
    /// Stage that runs from this state, `None` once terminal
    pub fn next_stage(&self) -> Option<Stage> {
        match self {
            RunState::Start => Some(Stage::Research),
            RunState::Researched => Some(Stage::Write),
            RunState::Drafted => Some(Stage::Proofread),
            RunState::Refined => Some(Stage::Summarize),
            RunState::Summarized | RunState::Failed => None,
        }
    }

    /// Advance past the current stage
    pub fn advance(&mut self) {
        *self = match self {
            RunState::Start => RunState::Researched,
            RunState::Researched => RunState::Drafted,
            RunState::Drafted => RunState::Refined,
            RunState::Refined => RunState::Summarized,
            RunState::Summarized => RunState::Summarized,
            RunState::Failed => RunState::Failed,
        };
    }

    /// Fail the run
    pub fn fail(&mut self) {
        *self = RunState::Failed;
    }

    /// Check if the run reached a terminal state
    pub fn is_complete(&self) -> bool {
        matches!(self, RunState::Summarized | RunState::Failed)
    }

    /// Check if the run succeeded
    pub fn is_success(&self) -> bool {
        *self == RunState::Summarized
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Start => "START",
            RunState::Researched => "RESEARCHED",
            RunState::Drafted => "DRAFTED",
            RunState::Refined => "REFINED",
            RunState::Summarized => "SUMMARIZED",
            RunState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_advance() {
        let mut state = RunState::default();
        assert_eq!(state, RunState::Start);

        let mut visited = Vec::new();
        while let Some(stage) = state.next_stage() {
            visited.push(stage);
            state.advance();
        }

        assert_eq!(visited, Stage::ALL.to_vec());
        assert_eq!(state, RunState::Summarized);
        assert!(state.is_complete());
        assert!(state.is_success());
    }

    #[test]
    fn test_terminal_states_do_not_move() {
        let mut state = RunState::Summarized;
        state.advance();
        assert_eq!(state, RunState::Summarized);

        let mut state = RunState::Drafted;
        state.fail();
        state.advance();
        assert_eq!(state, RunState::Failed);
        assert!(state.is_complete());
        assert!(!state.is_success());
        assert_eq!(state.next_stage(), None);
    }

    #[test]
    fn test_stage_roles_follow_pipeline_order() {
        let roles: Vec<_> = Stage::ALL.iter().map(Stage::role).collect();
        assert_eq!(roles, AgentRole::ALL.to_vec());
    }
}
