//! # Result Bundle
//!
//! Immutable snapshot of a completed run, handed to the presentation layer.

use serde::Serialize;

use super::stage::Stage;

/// The four outputs of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultBundle {
    research: String,
    article: String,
    refined: String,
    summary: String,
}

impl ResultBundle {
    pub(crate) fn new(research: String, article: String, refined: String, summary: String) -> Self {
        Self {
            research,
            article,
            refined,
            summary,
        }
    }

    pub fn research(&self) -> &str {
        &self.research
    }

    pub fn article(&self) -> &str {
        &self.article
    }

    pub fn refined(&self) -> &str {
        &self.refined
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Labelled sections in display order: Research, Article, Refined, Summary
    pub fn sections(&self) -> [(&'static str, &str); 4] {
        Stage::ALL.map(|stage| (stage.title(), self.output_of(stage)))
    }

    fn output_of(&self, stage: Stage) -> &str {
        match stage {
            Stage::Research => &self.research,
            Stage::Write => &self.article,
            Stage::Proofread => &self.refined,
            Stage::Summarize => &self.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_are_in_fixed_order() {
        let bundle = ResultBundle::new("r".into(), "a".into(), "p".into(), "s".into());
        let sections = bundle.sections();
        assert_eq!(
            sections,
            [
                ("Research", "r"),
                ("Article", "a"),
                ("Refined", "p"),
                ("Summary", "s")
            ]
        );
    }

    #[test]
    fn test_serialized_field_names() {
        let bundle = ResultBundle::new("r".into(), "a".into(), "p".into(), "s".into());
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["research"], "r");
        assert_eq!(json["article"], "a");
        assert_eq!(json["refined"], "p");
        assert_eq!(json["summary"], "s");
    }
}
