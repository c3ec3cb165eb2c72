//! # Scribe Agents
//!
//! Role-specialized agents for the content pipeline.
//!
//! ```text
//! Agent (role + fixed instruction)
//!   └── Backend (generate(instruction, task, options))
//! ```
//!
//! - `Researcher` - gathers facts about the topic
//! - `Writer` - drafts an article from the research
//! - `Proofreader` - polishes the draft
//! - `Summarizer` - condenses the refined article

pub mod agent;
pub mod prompts;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use agent::Agent;

/// The four fixed roles, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Researcher,
    Writer,
    Proofreader,
    Summarizer,
}

impl AgentRole {
    /// All roles in pipeline order
    pub const ALL: [AgentRole; 4] = [
        AgentRole::Researcher,
        AgentRole::Writer,
        AgentRole::Proofreader,
        AgentRole::Summarizer,
    ];

    /// Display name, used for logging and events
    pub fn name(&self) -> &'static str {
        match self {
            AgentRole::Researcher => "Researcher",
            AgentRole::Writer => "Writer",
            AgentRole::Proofreader => "Proofreader",
            AgentRole::Summarizer => "Summarizer",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
