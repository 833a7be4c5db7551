// ============================================================
// Selector
// ============================================================
// Reduces the generated questions to at most `num_questions`:
//
//   Step 1: deduplicate on normalised question text, keeping
//           the higher-scoring copy (earliest on a tie or
//           when nothing is scored)
//   Step 2: if any question is scored, sort by descending
//           score; ties keep extraction order
//   Step 3: truncate (never pad)
//   Step 4: attach distractors to multiple-choice answers,
//           unless the style is `sentences`
//
// Questions are held in a Vec in extraction order throughout,
// so ordering is reproducible for a given input.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::domain::{
    AnswerCandidate, AnswerStyle, CandidateStyle, GeneratedQuestion, RankedQuestion, RankedResult,
};
use crate::ranking::distractors::DistractorSampler;

pub struct Selector {
    sampler: DistractorSampler,
}

impl Selector {
    pub fn new(sampler: DistractorSampler) -> Self {
        Self { sampler }
    }

    /// Select from `candidates`, drawing distractors from their own answers
    pub fn select(
        &self,
        candidates:    Vec<GeneratedQuestion>,
        num_questions: usize,
        style:         AnswerStyle,
    ) -> RankedResult {
        let pool: Vec<AnswerCandidate> = candidates.iter().map(|q| q.answer.clone()).collect();
        self.select_with_pool(candidates, num_questions, style, &pool)
    }

    /// Select from `candidates`, drawing distractors from `pool`
    /// (normally every span extracted from the source text)
    pub fn select_with_pool(
        &self,
        candidates:    Vec<GeneratedQuestion>,
        num_questions: usize,
        style:         AnswerStyle,
        pool:          &[AnswerCandidate],
    ) -> RankedResult {
        let total    = candidates.len();
        let mut kept = dedup(candidates);
        let unique   = kept.len();

        if kept.iter().any(|q| q.model_score.is_some()) {
            kept.sort_by(|a, b| compare_scores(b.model_score, a.model_score)
                .then(a.position.cmp(&b.position)));
        }
        kept.truncate(num_questions);

        tracing::debug!(
            "Selected {} of {} questions ({} after dedup)",
            kept.len(),
            total,
            unique
        );

        let items = kept
            .into_iter()
            .map(|question| {
                let distractors = if style != AnswerStyle::Sentences
                    && question.answer.style == CandidateStyle::MultipleChoiceSource
                {
                    self.sampler.sample(&question.answer, pool, question.position as u64)
                } else {
                    Vec::new()
                };
                RankedQuestion { question, distractors }
            })
            .collect();

        RankedResult { items }
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new(DistractorSampler::default())
    }
}

/// Unscored questions rank below every scored one
fn compare_scores(a: Option<f32>, b: Option<f32>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None)    => Ordering::Greater,
        (None, Some(_))    => Ordering::Less,
        (None, None)       => Ordering::Equal,
    }
}

fn dedup(candidates: Vec<GeneratedQuestion>) -> Vec<GeneratedQuestion> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<GeneratedQuestion> = Vec::with_capacity(candidates.len());

    for question in candidates {
        let key = question.normalized_question();
        match index.get(&key) {
            Some(&slot) => {
                if compare_scores(question.model_score, kept[slot].model_score) == Ordering::Greater {
                    kept[slot] = question;
                }
            }
            None => {
                index.insert(key, kept.len());
                kept.push(question);
            }
        }
    }
    kept
}
