// ============================================================
// Distractor Sampler
// ============================================================
// Picks wrong-answer options for a multiple-choice question
// from the other answer spans harvested from the same text.
//
// Preference order:
//   1. spans of the same SpanKind (a year for a year, a name
//      for a name)
//   2. spans whose word count is closest to the answer's
//
// Options are shuffled with a seeded StdRng before the stable
// preference sort, so equally good options are sampled rather
// than always taken in text order, while a given seed keeps
// runs reproducible.
//
// Invariants: options are distinct from each other and from
// the correct answer, compared case-insensitively. If fewer
// than `count` qualify, fewer are returned; nothing is ever
// invented.

use std::collections::HashSet;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::{AnswerCandidate, CandidateStyle};

#[derive(Debug, Clone)]
pub struct DistractorSampler {
    count: usize,
    seed:  u64,
}

impl DistractorSampler {
    pub fn new(count: usize, seed: u64) -> Self {
        Self { count, seed }
    }

    /// Sample up to `count` distractors for `answer` from `pool`.
    /// `salt` varies the shuffle between questions of one run.
    pub fn sample(&self, answer: &AnswerCandidate, pool: &[AnswerCandidate], salt: u64) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(normalise(&answer.answer_span));

        let mut options: Vec<&AnswerCandidate> = pool
            .iter()
            .filter(|c| c.style == CandidateStyle::MultipleChoiceSource)
            .filter(|c| seen.insert(normalise(&c.answer_span)))
            .collect();

        let mut rng = StdRng::seed_from_u64(self.seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        options.shuffle(&mut rng);

        let words = answer.word_count();
        options.sort_by_key(|c| (c.kind != answer.kind, c.word_count().abs_diff(words)));

        options
            .into_iter()
            .take(self.count)
            .map(|c| c.answer_span.clone())
            .collect()
    }
}

impl Default for DistractorSampler {
    fn default() -> Self {
        Self::new(3, 42)
    }
}

fn normalise(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SpanKind;

    fn span(text: &str, kind: SpanKind) -> AnswerCandidate {
        AnswerCandidate::from_ranges(text, 0..text.len(), 0..text.len(), CandidateStyle::MultipleChoiceSource, kind)
            .unwrap()
    }

    fn pool() -> Vec<AnswerCandidate> {
        vec![
            span("Paris", SpanKind::ProperNoun),
            span("1889", SpanKind::Numeric),
            span("Lyon", SpanKind::ProperNoun),
            span("PARIS", SpanKind::ProperNoun),
            span("Gustave Eiffel", SpanKind::ProperNoun),
            span("lyon", SpanKind::ProperNoun),
            span("Marseille", SpanKind::ProperNoun),
            span("capital", SpanKind::Phrase),
        ]
    }

    #[test]
    fn test_distinct_and_not_the_answer() {
        let sampler = DistractorSampler::default();
        let answer  = span("Paris", SpanKind::ProperNoun);
        let picked  = sampler.sample(&answer, &pool(), 0);

        assert_eq!(picked.len(), 3);
        let lowered: HashSet<String> = picked.iter().map(|s| s.to_lowercase()).collect();
        assert_eq!(lowered.len(), picked.len());
        assert!(!lowered.contains("paris"));
    }

    #[test]
    fn test_prefers_same_kind_and_length() {
        let sampler = DistractorSampler::default();
        let answer  = span("Paris", SpanKind::ProperNoun);
        let mut picked = sampler.sample(&answer, &pool(), 7);
        picked.sort();
        // Lyon and Marseille are one-word names; Gustave Eiffel is the
        // next best name; the numeric and phrase spans come last
        assert_eq!(picked, vec!["Gustave Eiffel", "Lyon", "Marseille"]);
    }

    #[test]
    fn test_fewer_than_count_available() {
        let sampler = DistractorSampler::default();
        let answer  = span("1889", SpanKind::Numeric);
        let small   = vec![span("1889", SpanKind::Numeric), span("1900", SpanKind::Numeric)];
        assert_eq!(sampler.sample(&answer, &small, 0), vec!["1900"]);
        assert!(sampler.sample(&answer, &[], 0).is_empty());
    }

    #[test]
    fn test_sentence_spans_are_never_options() {
        let sampler  = DistractorSampler::default();
        let answer   = span("Paris", SpanKind::ProperNoun);
        let sentence = AnswerCandidate::from_ranges(
            "Lyon is big.", 0..12, 0..12, CandidateStyle::Sentence, SpanKind::Sentence,
        ).unwrap();
        assert!(sampler.sample(&answer, &[sentence], 0).is_empty());
    }

    #[test]
    fn test_same_seed_same_choice() {
        let sampler = DistractorSampler::new(2, 11);
        let answer  = span("Paris", SpanKind::ProperNoun);
        assert_eq!(sampler.sample(&answer, &pool(), 3), sampler.sample(&answer, &pool(), 3));
    }
}
