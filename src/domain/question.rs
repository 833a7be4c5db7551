// ============================================================
// Layer 3 - Generated Questions and Ranked Results
// ============================================================
// GeneratedQuestion is produced one-to-one from an
// AnswerCandidate. The Selector (ranking layer) turns a list
// of them into a RankedResult, which is what the pipeline
// hands back. Callers only ever see the flattened QaRecord.

use serde::{Deserialize, Serialize};

use crate::domain::candidate::{AnswerCandidate, CandidateStyle};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question_text: String,

    pub answer: AnswerCandidate,

    /// Evaluator score in [0, 1]; None when evaluation is disabled
    pub model_score: Option<f32>,

    /// Index of the source candidate in extraction order
    pub position: usize,
}

impl GeneratedQuestion {
    pub fn new(question_text: impl Into<String>, answer: AnswerCandidate, position: usize) -> Self {
        Self {
            question_text: question_text.into(),
            answer,
            model_score: None,
            position,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.model_score = Some(score);
        self
    }

    /// Lowercased, whitespace-collapsed question text.
    /// Two questions with the same normalised text are duplicates.
    pub fn normalized_question(&self) -> String {
        self.question_text
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A selected question plus its multiple-choice distractors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedQuestion {
    pub question: GeneratedQuestion,
    pub distractors: Vec<String>,
}

/// Final ordered output of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub items: Vec<RankedQuestion>,
}

impl RankedResult {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedQuestion> {
        self.items.iter()
    }

    /// Flatten into caller-facing records, dropping extraction details
    pub fn into_records(self) -> Vec<QaRecord> {
        self.items.into_iter().map(QaRecord::from).collect()
    }
}

/// What external callers receive for each question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distractors: Option<Vec<String>>,
}

impl From<RankedQuestion> for QaRecord {
    fn from(item: RankedQuestion) -> Self {
        let is_choice = item.question.answer.style == CandidateStyle::MultipleChoiceSource;
        QaRecord {
            question:    item.question.question_text,
            answer:      item.question.answer.answer_span,
            distractors: is_choice.then_some(item.distractors),
        }
    }
}
