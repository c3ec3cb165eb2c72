//! Default role instructions bundled at compile time.
//!
//! Each instruction carries the role's framing, so the backend receives the
//! previous stage's output verbatim as the user task.

use super::AgentRole;

/// Researcher - collects facts, benefits and challenges about a topic
pub const RESEARCHER: &str = include_str!("defaults/researcher.md");

/// Writer - turns research notes into an article
pub const WRITER: &str = include_str!("defaults/writer.md");

/// Proofreader - polishes the article without changing its meaning
pub const PROOFREADER: &str = include_str!("defaults/proofreader.md");

/// Summarizer - condenses the refined article
pub const SUMMARIZER: &str = include_str!("defaults/summarizer.md");

/// Bundled instruction for a role
pub fn default_instruction(role: AgentRole) -> &'static str {
    match role {
        AgentRole::Researcher => RESEARCHER,
        AgentRole::Writer => WRITER,
        AgentRole::Proofreader => PROOFREADER,
        AgentRole::Summarizer => SUMMARIZER,
    }
}

/// All default instructions with their slugs
pub fn all_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("researcher", RESEARCHER),
        ("writer", WRITER),
        ("proofreader", PROOFREADER),
        ("summarizer", SUMMARIZER),
    ]
}
