// ============================================================
// Layer 3 - AnswerCandidate Domain Type
// ============================================================
// A candidate is one (context, answer span) pair that the
// question generator will be asked about.
//
// Both strings are slices of the caller's source text:
//
//   source:  "Paris is the capital of France. It is known ..."
//   context: "Paris is the capital of France. It is known ..."
//   answer:  "Paris is the capital of France."
//            ^ span_offset.0                ^ span_offset.1
//
// Offsets are byte offsets into the source text, so the
// answer's position inside the context can always be
// recovered without searching for it again. The sentence
// holding the answer is recorded too: context truncation
// keeps that sentence whole whenever it fits.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// How a candidate's answer span was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStyle {
    /// The answer is a whole sentence
    Sentence,
    /// The answer is a clause highlighted inside a long sentence
    Highlighted,
    /// The answer is a short span eligible for distractors
    MultipleChoiceSource,
}

/// Rough syntactic type of an answer span.
/// Distractors are drawn from spans of the same kind first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    Sentence,
    Clause,
    Numeric,
    ProperNoun,
    Phrase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerCandidate {
    /// Surrounding text handed to the generator
    pub context: String,

    /// The span the generated question should be answered by
    pub answer_span: String,

    /// Byte offset of `context` in the source text
    pub context_offset: usize,

    /// Byte range (start, end) of `answer_span` in the source text
    pub span_offset: (usize, usize),

    /// Byte range (start, end) of the sentence holding the answer.
    /// Equal to `span_offset` when the answer is itself a sentence.
    #[serde(default)]
    pub sentence_offset: (usize, usize),

    pub style: CandidateStyle,

    pub kind: SpanKind,
}

impl AnswerCandidate {
    /// Build a candidate by slicing `source`.
    ///
    /// Returns None when the ranges are out of bounds, not on char
    /// boundaries, or the answer does not sit inside the context.
    pub fn from_ranges(
        source:  &str,
        context: Range<usize>,
        answer:  Range<usize>,
        style:   CandidateStyle,
        kind:    SpanKind,
    ) -> Option<Self> {
        if answer.start < context.start || answer.end > context.end || answer.start >= answer.end {
            return None;
        }
        let context_text = source.get(context.clone())?;
        let answer_text  = source.get(answer.clone())?;

        Some(Self {
            context:         context_text.to_string(),
            answer_span:     answer_text.to_string(),
            context_offset:  context.start,
            span_offset:     (answer.start, answer.end),
            sentence_offset: (answer.start, answer.end),
            style,
            kind,
        })
    }

    /// Record the sentence the answer was taken from.
    /// Ignored unless the sentence covers the answer and lies inside the context.
    pub fn with_sentence(mut self, sentence: Range<usize>) -> Self {
        let context_end = self.context_offset + self.context.len();
        if sentence.start <= self.span_offset.0
            && sentence.end >= self.span_offset.1
            && sentence.start >= self.context_offset
            && sentence.end <= context_end
        {
            self.sentence_offset = (sentence.start, sentence.end);
        }
        self
    }

    /// Byte range of the answer inside `context`
    pub fn answer_range_in_context(&self) -> Range<usize> {
        let start = self.span_offset.0 - self.context_offset;
        start..start + self.answer_span.len()
    }

    /// Byte range of the answer's sentence inside `context`.
    /// Falls back to the answer range for candidates without a recorded sentence.
    pub fn sentence_range_in_context(&self) -> Range<usize> {
        let (start, end) = self.sentence_offset;
        let context_end  = self.context_offset + self.context.len();
        if start > self.span_offset.0 || end < self.span_offset.1
            || start < self.context_offset || end > context_end
        {
            return self.answer_range_in_context();
        }
        start - self.context_offset..end - self.context_offset
    }

    pub fn word_count(&self) -> usize {
        self.answer_span.split_whitespace().count()
    }

    /// Key used to deduplicate candidates across extraction strategies
    pub fn dedup_key(&self) -> (&str, &str) {
        (self.context.as_str(), self.answer_span.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "Paris is the capital of France. It is known for the Eiffel Tower.";

    #[test]
    fn test_answer_is_substring_of_context() {
        let c = AnswerCandidate::from_ranges(
            SOURCE, 0..SOURCE.len(), 0..31,
            CandidateStyle::Sentence, SpanKind::Sentence,
        ).unwrap();

        assert_eq!(c.answer_span, "Paris is the capital of France.");
        assert_eq!(&c.context[c.answer_range_in_context()], c.answer_span);
    }

    #[test]
    fn test_range_relative_to_context() {
        // context = second sentence, answer = "Eiffel Tower"
        let ctx_start = SOURCE.find("It").unwrap();
        let ans_start = SOURCE.find("Eiffel").unwrap();
        let c = AnswerCandidate::from_ranges(
            SOURCE, ctx_start..SOURCE.len(), ans_start..ans_start + 12,
            CandidateStyle::MultipleChoiceSource, SpanKind::ProperNoun,
        ).unwrap();

        assert_eq!(c.answer_span, "Eiffel Tower");
        assert_eq!(&c.context[c.answer_range_in_context()], "Eiffel Tower");
        assert_eq!(c.word_count(), 2);
    }

    #[test]
    fn test_sentence_range_defaults_to_answer() {
        let c = AnswerCandidate::from_ranges(
            SOURCE, 0..SOURCE.len(), 13..20,
            CandidateStyle::MultipleChoiceSource, SpanKind::Phrase,
        ).unwrap();
        assert_eq!(c.sentence_range_in_context(), c.answer_range_in_context());
    }

    #[test]
    fn test_sentence_range_relative_to_context() {
        let ctx_start = SOURCE.find("France").unwrap();
        let snt_start = SOURCE.find("It").unwrap();
        let ans_start = SOURCE.find("Eiffel").unwrap();
        let c = AnswerCandidate::from_ranges(
            SOURCE, ctx_start..SOURCE.len(), ans_start..ans_start + 12,
            CandidateStyle::MultipleChoiceSource, SpanKind::ProperNoun,
        )
        .unwrap()
        .with_sentence(snt_start..SOURCE.len());

        assert_eq!(&c.context[c.sentence_range_in_context()], "It is known for the Eiffel Tower.");
    }

    #[test]
    fn test_sentence_not_covering_answer_is_ignored() {
        let ans_start = SOURCE.find("Eiffel").unwrap();
        let c = AnswerCandidate::from_ranges(
            SOURCE, 0..SOURCE.len(), ans_start..ans_start + 12,
            CandidateStyle::MultipleChoiceSource, SpanKind::ProperNoun,
        )
        .unwrap()
        .with_sentence(0..31);

        assert_eq!(c.sentence_offset, c.span_offset);
    }

    #[test]
    fn test_rejects_answer_outside_context() {
        let c = AnswerCandidate::from_ranges(
            SOURCE, 0..10, 5..20,
            CandidateStyle::Sentence, SpanKind::Sentence,
        );
        assert!(c.is_none());
    }

    #[test]
    fn test_rejects_empty_answer() {
        let c = AnswerCandidate::from_ranges(
            SOURCE, 0..10, 4..4,
            CandidateStyle::Sentence, SpanKind::Sentence,
        );
        assert!(c.is_none());
    }
}
