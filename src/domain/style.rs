use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineError;

/// Which kinds of answers the pipeline should ask about.
///
/// Parsed from the caller-facing strings `"all"`, `"sentences"`
/// and `"multiple_choice"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStyle {
    /// Sentence answers plus multiple-choice spans
    All,
    /// Full sentences (and clauses of long sentences) as answers
    Sentences,
    /// Short spans with distractor options
    MultipleChoice,
}

impl AnswerStyle {
    pub const ALL_STYLES: [AnswerStyle; 3] = [
        AnswerStyle::All,
        AnswerStyle::Sentences,
        AnswerStyle::MultipleChoice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerStyle::All            => "all",
            AnswerStyle::Sentences      => "sentences",
            AnswerStyle::MultipleChoice => "multiple_choice",
        }
    }

    /// Whether sentence-level candidates are extracted
    pub fn wants_sentences(&self) -> bool {
        matches!(self, AnswerStyle::All | AnswerStyle::Sentences)
    }

    /// Whether short multiple-choice spans are extracted
    pub fn wants_spans(&self) -> bool {
        matches!(self, AnswerStyle::All | AnswerStyle::MultipleChoice)
    }
}

impl fmt::Display for AnswerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerStyle {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnswerStyle::ALL_STYLES
            .into_iter()
            .find(|style| style.as_str() == s.trim())
            .ok_or_else(|| {
                PipelineError::Configuration(format!(
                    "unrecognised answer_style '{s}'; expected one of all, sentences, multiple_choice"
                ))
            })
    }
}
