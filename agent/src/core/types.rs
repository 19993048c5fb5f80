//! Shared data types and fixed decision thresholds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::shape::TargetShape;

/// Minimum critique score for a candidate answer to be accepted.
pub const CRITIQUE_THRESHOLD: f64 = 0.9;
/// Minimum confidence score for a search result to count as verified.
pub const RELEVANCE_THRESHOLD: f64 = 0.7;
/// Upper bound on judgments returned by one relevance selection.
pub const MAX_JUDGMENTS: usize = 5;

/// One ranked snippet returned by the search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// A search result together with the rendered text of its page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContent {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub content: String,
}

/// Model-emitted relevance score for one pooled result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceJudgment {
    pub id: usize,
    pub confidence_score: f64,
}

impl RelevanceJudgment {
    pub fn list_shape() -> TargetShape {
        TargetShape::array(TargetShape::object([
            ("id", TargetShape::Integer),
            ("confidenceScore", TargetShape::unit_score()),
        ]))
        .with_max_items(MAX_JUDGMENTS)
    }

    pub fn is_verified(&self) -> bool {
        self.confidence_score >= RELEVANCE_THRESHOLD
    }
}

/// Scored judgment of a candidate answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    pub feedback: String,
    pub score: f64,
}

impl Critique {
    pub fn shape() -> TargetShape {
        TargetShape::object([
            ("feedback", TargetShape::String),
            ("score", TargetShape::unit_score()),
        ])
    }

    pub fn is_accepted(&self) -> bool {
        self.score >= CRITIQUE_THRESHOLD
    }
}

/// How strictly a domain answer must stick to the supplied search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Only the supplied results may be used.
    Strict,
    /// Results are optional context; general knowledge is allowed.
    Relaxed,
}

impl PromptMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Relaxed => "relaxed",
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "relaxed" => Ok(Self::Relaxed),
            other => Err(format!("unknown prompt mode '{other}' (expected strict|relaxed)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critique_threshold_is_inclusive() {
        let critique = |score| Critique {
            feedback: String::new(),
            score,
        };
        assert!(critique(0.9).is_accepted());
        assert!(critique(1.0).is_accepted());
        assert!(!critique(0.89999).is_accepted());
        assert!(!critique(0.0).is_accepted());
    }

    #[test]
    fn relevance_threshold_is_inclusive() {
        let judgment = |confidence_score| RelevanceJudgment {
            id: 0,
            confidence_score,
        };
        assert!(judgment(0.7).is_verified());
        assert!(!judgment(0.69999).is_verified());
    }

    #[test]
    fn judgments_use_camel_case_fields() {
        let judgment: RelevanceJudgment =
            serde_json::from_str(r#"{"id": 3, "confidenceScore": 0.75}"#).expect("parse");
        assert_eq!(judgment.id, 3);
        assert!(judgment.is_verified());
    }

    #[test]
    fn prompt_mode_parses_case_insensitively() {
        assert_eq!("Strict".parse::<PromptMode>(), Ok(PromptMode::Strict));
        assert_eq!(" relaxed ".parse::<PromptMode>(), Ok(PromptMode::Relaxed));
        assert!("loose".parse::<PromptMode>().is_err());
    }
}
