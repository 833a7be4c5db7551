// ============================================================
// Layer 4 - Answer Extractor
// ============================================================
// Turns source text into candidate (context, answer) pairs.
//
//   sentences style        one candidate per sentence, plus one
//                          per long clause of a long sentence
//   multiple_choice style  one candidate per harvested span
//                          (names, numbers, short phrases); a
//                          fragment with no spans becomes one
//                          whole-text candidate
//   all                    both, sentence candidates first,
//                          deduplicated by (context, answer)
//
// The context of every candidate is the sentence holding the
// answer plus `context_sentences` neighbours on each side:
//
//   context_sentences = 1, answer = s2
//   [ s0 ][ s1 ][ s2 ][ s3 ]
//         └──── context ───┘
//
// Extraction is a pure function of (text, style, config): no
// randomness, so repeated calls return identical sequences.

use std::collections::HashSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::data::phrases::harvest_spans;
use crate::data::sentences::{split_sentences, trim_range};
use crate::domain::{AnswerCandidate, AnswerStyle, CandidateStyle, SpanKind};

const CLAUSE_SEPARATORS: &[char] = &[',', ';', ':', ')'];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Neighbouring sentences included on each side of the answer
    pub context_sentences: usize,

    /// Sentences longer than this (in chars) also yield clause candidates
    pub max_sentence_chars: usize,

    /// Clauses with fewer words than this are discarded
    pub min_clause_words: usize,

    /// Longest multiple-choice span, in words
    pub max_phrase_words: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            context_sentences:  1,
            max_sentence_chars: 128,
            min_clause_words:   6,
            max_phrase_words:   5,
        }
    }
}

pub struct AnswerExtractor {
    config: ExtractorConfig,
}

impl AnswerExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Split `text` into answer candidates for the requested style.
    /// Empty or whitespace-only text gives an empty Vec.
    pub fn extract(&self, text: &str, style: AnswerStyle) -> Vec<AnswerCandidate> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let sentences = split_sentences(text);
        let mut candidates = Vec::new();

        if style.wants_sentences() {
            self.push_sentence_candidates(text, &sentences, &mut candidates);
        }
        if style.wants_spans() {
            self.push_span_candidates(text, &sentences, &mut candidates);
        }

        let candidates = dedup(candidates);
        tracing::debug!(
            "Extracted {} candidates from {} sentences (style={})",
            candidates.len(),
            sentences.len(),
            style
        );
        candidates
    }

    fn push_sentence_candidates(
        &self,
        text:      &str,
        sentences: &[Range<usize>],
        out:       &mut Vec<AnswerCandidate>,
    ) {
        for (i, sentence) in sentences.iter().enumerate() {
            let context = self.context_window(sentences, i);

            out.extend(AnswerCandidate::from_ranges(
                text, context.clone(), sentence.clone(),
                CandidateStyle::Sentence, SpanKind::Sentence,
            ));

            if text[sentence.clone()].chars().count() > self.config.max_sentence_chars {
                for clause in self.clause_ranges(text, sentence.clone()) {
                    out.extend(
                        AnswerCandidate::from_ranges(
                            text, context.clone(), clause,
                            CandidateStyle::Highlighted, SpanKind::Clause,
                        )
                        .map(|c| c.with_sentence(sentence.clone())),
                    );
                }
            }
        }
    }

    fn push_span_candidates(
        &self,
        text:      &str,
        sentences: &[Range<usize>],
        out:       &mut Vec<AnswerCandidate>,
    ) {
        let before = out.len();
        for (i, sentence) in sentences.iter().enumerate() {
            let context = self.context_window(sentences, i);
            for span in harvest_spans(text, sentence.clone(), self.config.max_phrase_words) {
                out.extend(
                    AnswerCandidate::from_ranges(
                        text, context.clone(), span.range,
                        CandidateStyle::MultipleChoiceSource, span.kind,
                    )
                    .map(|c| c.with_sentence(sentence.clone())),
                );
            }
        }

        // A fragment without boundaries is its own answer
        if out.len() == before {
            if let [whole] = sentences {
                out.extend(AnswerCandidate::from_ranges(
                    text, whole.clone(), whole.clone(),
                    CandidateStyle::MultipleChoiceSource, SpanKind::Phrase,
                ));
            }
        }
    }

    /// Byte range covering sentence `i` and its neighbours
    fn context_window(&self, sentences: &[Range<usize>], i: usize) -> Range<usize> {
        let n     = self.config.context_sentences;
        let first = i.saturating_sub(n);
        let last  = (i + n).min(sentences.len() - 1);
        sentences[first].start..sentences[last].end
    }

    /// Pieces of a long sentence between clause separators
    fn clause_ranges(&self, text: &str, sentence: Range<usize>) -> Vec<Range<usize>> {
        let slice = &text[sentence.clone()];
        let mut clauses = Vec::new();
        let mut start   = 0usize;

        let cuts = slice
            .match_indices(CLAUSE_SEPARATORS)
            .map(|(pos, sep)| (pos, pos + sep.len()))
            .chain(std::iter::once((slice.len(), slice.len())));

        for (cut, next_start) in cuts {
            let piece = sentence.start + start..sentence.start + cut;
            start = next_start;

            let Some(piece) = trim_range(text, piece) else { continue };
            let words = text[piece.clone()].split_whitespace().count();
            if words >= self.config.min_clause_words && piece != sentence {
                clauses.push(piece);
            }
        }
        clauses
    }
}

impl Default for AnswerExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

/// Keep the first candidate for each (context, answer) pair
fn dedup(candidates: Vec<AnswerCandidate>) -> Vec<AnswerCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert((c.context.clone(), c.answer_span.clone())))
        .collect()
}
