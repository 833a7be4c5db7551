// ============================================================
// Layer 4 - Phrase Harvester
// ============================================================
// Finds short, noun-phrase-like spans inside a sentence.
// These become multiple-choice answers, so they should be
// the kind of thing a quiz would ask for: names, numbers and
// short "the X" phrases.
//
// Three shapes are recognised:
//
//   Numeric     "1889", "3.5", "40%", "$1,200"
//   ProperNoun  runs of Capitalised words, optionally joined
//               by a connector ("Bank of England")
//   Phrase      words after a determiner, up to the first
//               function word ("the [capital] of France")
//
// A capitalised first word of the sentence is only treated as
// a name when it is not a common sentence starter ("It",
// "The", "However", ...).
//
// Returned ranges are byte ranges into the full text.

use std::ops::Range;

use crate::domain::candidate::SpanKind;

const DETERMINERS: &[&str] = &["the", "a", "an"];

const CONNECTORS: &[&str] = &["of", "de", "da", "del", "du", "van", "von", "la", "le"];

const FUNCTION_WORDS: &[&str] = &[
    "is", "are", "was", "were", "be", "been", "being", "of", "in", "on", "at",
    "to", "for", "with", "by", "from", "and", "or", "but", "that", "which",
    "who", "whom", "as", "than", "it", "its", "has", "have", "had", "will",
    "would", "can", "could", "should", "may", "might", "not", "into", "over",
];

// Common irregular verbs that end a determiner phrase
const VERBS: &[&str] = &[
    "became", "began", "made", "said", "took", "gave", "won", "lost", "built",
    "grew", "came", "went", "saw", "found", "known", "called", "located",
    "stands", "remains", "contains", "includes",
];

const SENTENCE_STARTERS: &[&str] = &[
    "the", "a", "an", "it", "he", "she", "they", "we", "i", "you", "this",
    "that", "these", "those", "there", "here", "in", "on", "at", "by", "for",
    "with", "his", "her", "its", "their", "our", "my", "when", "while",
    "after", "before", "as", "but", "and", "or", "however", "although",
    "if", "what", "who", "where", "why", "how", "since", "during", "today",
    "yesterday", "many", "some", "most", "all", "each", "every", "one",
];

/// A harvested span and its kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestedSpan {
    pub range: Range<usize>,
    pub kind:  SpanKind,
}

/// One whitespace-delimited word with surrounding punctuation removed
#[derive(Debug, Clone)]
struct Word<'a> {
    core:         &'a str,
    range:        Range<usize>,
    break_before: bool,
    break_after:  bool,
}

impl Word<'_> {
    fn lower(&self) -> String {
        self.core.to_lowercase()
    }

    fn is_numeric(&self) -> bool {
        self.core.chars().any(|c| c.is_ascii_digit())
            && self.core.chars().all(|c| c.is_ascii_digit() || ",.%$".contains(c))
    }

    fn is_capitalised(&self) -> bool {
        self.core.chars().next().is_some_and(char::is_uppercase)
    }

    /// Crude verb test: irregular list plus -ed/-ing endings
    fn looks_like_verb(&self) -> bool {
        let lower = self.lower();
        VERBS.contains(&lower.as_str())
            || (lower.len() > 4 && lower.ends_with("ed"))
            || (lower.len() > 5 && lower.ends_with("ing"))
    }
}

/// Harvest answer spans from the sentence at `sentence` in `text`.
/// At most `max_words` words go into a single span.
pub fn harvest_spans(text: &str, sentence: Range<usize>, max_words: usize) -> Vec<HarvestedSpan> {
    let words     = split_words(text, sentence);
    let max_words = max_words.max(1);
    let mut spans = Vec::new();
    let mut i     = 0usize;

    while i < words.len() {
        let word = &words[i];

        // ── Numbers ──────────────────────────────────────────────────────────
        if word.is_numeric() {
            let mut j = i;
            while j + 1 < words.len()
                && j + 1 - i < max_words
                && !words[j].break_after
                && !words[j + 1].break_before
                && words[j + 1].is_numeric()
            {
                j += 1;
            }
            spans.push(span(&words[i..=j], SpanKind::Numeric));
            i = j + 1;
            continue;
        }

        // ── Proper nouns ─────────────────────────────────────────────────────
        let starter = i == 0 && SENTENCE_STARTERS.contains(&word.lower().as_str());
        if word.is_capitalised() && !starter {
            let j = extend_proper_noun(&words, i, max_words);
            spans.push(span(&words[i..=j], SpanKind::ProperNoun));
            i = j + 1;
            continue;
        }

        // ── Determiner phrases ───────────────────────────────────────────────
        if DETERMINERS.contains(&word.lower().as_str()) && !word.break_after {
            if let Some(j) = extend_phrase(&words, i + 1, max_words) {
                spans.push(span(&words[i + 1..=j], SpanKind::Phrase));
                i = j + 1;
                continue;
            }
        }

        i += 1;
    }

    spans
}

fn extend_proper_noun(words: &[Word<'_>], start: usize, max_words: usize) -> usize {
    let mut end = start;
    loop {
        if words[end].break_after || end + 1 - start >= max_words {
            return end;
        }
        let Some(next) = words.get(end + 1) else { return end };
        if next.break_before {
            return end;
        }
        if next.is_capitalised() {
            end += 1;
            continue;
        }
        // "Bank of England": connector followed by another capitalised word
        let joined = CONNECTORS.contains(&next.lower().as_str())
            && !next.break_after
            && end + 3 - start <= max_words
            && words.get(end + 2).is_some_and(|w| w.is_capitalised() && !w.break_before);
        if joined {
            end += 2;
            continue;
        }
        return end;
    }
}

fn extend_phrase(words: &[Word<'_>], start: usize, max_words: usize) -> Option<usize> {
    let mut end = None;
    for (j, w) in words.iter().enumerate().skip(start) {
        let stop = w.is_capitalised()
            || w.is_numeric()
            || FUNCTION_WORDS.contains(&w.lower().as_str())
            || DETERMINERS.contains(&w.lower().as_str())
            || (j > start && (w.break_before || w.looks_like_verb()))
            || j - start >= max_words;
        if stop {
            break;
        }
        end = Some(j);
        if w.break_after {
            break;
        }
    }
    end
}

fn span(words: &[Word<'_>], kind: SpanKind) -> HarvestedSpan {
    let start = words.first().map(|w| w.range.start).unwrap_or(0);
    let end   = words.last().map(|w| w.range.end).unwrap_or(start);
    HarvestedSpan { range: start..end, kind }
}

/// Split the sentence into words, stripping punctuation from each edge.
/// Punctuation-only tokens (dashes, stray quotes) become breaks.
fn split_words(text: &str, sentence: Range<usize>) -> Vec<Word<'_>> {
    let Some(slice) = text.get(sentence.clone()) else { return Vec::new() };
    let mut words: Vec<Word<'_>> = Vec::new();
    let mut pending_break = false;

    let mut offset = 0usize;
    for raw in slice.split_whitespace() {
        let local = offset + slice[offset..].find(raw).unwrap_or(0);
        offset    = local + raw.len();

        let head_trimmed = raw.trim_start_matches(|c: char| !c.is_alphanumeric() && c != '$');
        let core         = head_trimmed.trim_end_matches(|c: char| !c.is_alphanumeric() && c != '%');

        if core.is_empty() {
            if let Some(last) = words.last_mut() {
                last.break_after = true;
            }
            pending_break = true;
            continue;
        }

        let lead  = raw.len() - head_trimmed.len();
        let start = sentence.start + local + lead;
        words.push(Word {
            core,
            range:        start..start + core.len(),
            break_before: pending_break || lead > 0,
            break_after:  core.len() + lead < raw.len(),
        });
        pending_break = false;
    }

    words
}
