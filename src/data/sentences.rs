// ============================================================
// Layer 4 - Sentence Segmenter
// ============================================================
// Splits text into sentences and returns BYTE RANGES into the
// original string rather than owned copies. Keeping ranges
// means every later candidate is provably a substring of the
// caller's text.
//
// A boundary is a run of terminators (. ! ?) followed by
// optional closing quotes/brackets and then whitespace or the
// end of the text. A blank line also ends a sentence, so
// headings without punctuation do not merge into the next
// paragraph.
//
// A period is NOT a boundary when:
//   - the word before it is a known abbreviation ("Dr.", "e.g.")
//   - the word before it is a single capital letter ("J. Smith")
//   - the next word starts with a lowercase letter
//
// Example:
//   "Dr. Smith arrived. He sat down."
//    └──────────────────┘ └──────────┘

use std::ops::Range;

const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc",
    "e.g", "i.e", "inc", "ltd", "co", "corp", "no", "fig", "approx",
    "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept",
    "oct", "nov", "dec", "u.s", "u.k",
];

const TERMINATORS: &[char] = &['.', '!', '?'];
const CLOSERS: &[char] = &['"', '\'', ')', ']', '\u{201D}', '\u{2019}'];

/// Split `text` into trimmed, non-empty sentence byte ranges
pub fn split_sentences(text: &str) -> Vec<Range<usize>> {
    let mut sentences = Vec::new();
    let mut start     = 0usize;
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut i = 0usize;

    while i < chars.len() {
        let (pos, c) = chars[i];

        // ── Paragraph break ──────────────────────────────────────────────────
        if c == '\n' && is_blank_line_ahead(&chars, i) {
            push_trimmed(text, start..pos, &mut sentences);
            start = pos;
            i += 1;
            continue;
        }

        if !TERMINATORS.contains(&c) {
            i += 1;
            continue;
        }

        // ── Consume the terminator run and closing punctuation ───────────────
        let mut j = i + 1;
        while j < chars.len() && TERMINATORS.contains(&chars[j].1) {
            j += 1;
        }
        while j < chars.len() && CLOSERS.contains(&chars[j].1) {
            j += 1;
        }
        let end = chars.get(j).map(|&(p, _)| p).unwrap_or(text.len());

        let at_end        = j >= chars.len();
        let followed_by_ws = !at_end && chars[j].1.is_whitespace();

        if (at_end || followed_by_ws) && is_boundary(text, &chars, i, j) {
            push_trimmed(text, start..end, &mut sentences);
            start = end;
        }
        i = j.max(i + 1);
    }

    push_trimmed(text, start..text.len(), &mut sentences);
    sentences
}

/// Decide whether the terminator at chars[i] really ends a sentence.
/// `j` is the index just past the terminator/closer run.
fn is_boundary(text: &str, chars: &[(usize, char)], i: usize, j: usize) -> bool {
    if chars[i].1 != '.' {
        return true;
    }

    // The word that the period is attached to
    let dot_pos    = chars[i].0;
    let word_start = text[..dot_pos]
        .char_indices()
        .rev()
        .find(|&(_, c)| c.is_whitespace())
        .map(|(p, c)| p + c.len_utf8())
        .unwrap_or(0);
    let word = text[word_start..dot_pos]
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();

    if ABBREVIATIONS.contains(&word.as_str()) {
        return false;
    }

    let original = &text[word_start..dot_pos];
    let mut letters = original.chars().filter(|c| c.is_alphabetic());
    if let (Some(first), None) = (letters.next(), letters.next()) {
        if first.is_uppercase() && original.chars().count() == 1 {
            return false;
        }
    }

    // Next non-whitespace character decides the remaining cases
    let next = chars[j..].iter().map(|&(_, c)| c).find(|c| !c.is_whitespace());
    !matches!(next, Some(c) if c.is_lowercase())
}

fn is_blank_line_ahead(chars: &[(usize, char)], i: usize) -> bool {
    chars[i + 1..]
        .iter()
        .map(|&(_, c)| c)
        .take_while(|&c| c != '\n' && c.is_whitespace())
        .count()
        .checked_add(i + 1)
        .and_then(|k| chars.get(k))
        .is_some_and(|&(_, c)| c == '\n')
}

fn push_trimmed(text: &str, range: Range<usize>, out: &mut Vec<Range<usize>>) {
    if let Some(r) = trim_range(text, range) {
        out.push(r);
    }
}

/// Shrink a byte range so it excludes surrounding whitespace.
/// Returns None when nothing but whitespace is left.
pub fn trim_range(text: &str, range: Range<usize>) -> Option<Range<usize>> {
    let slice = text.get(range.clone())?;
    let lead  = slice.len() - slice.trim_start().len();
    let trail = slice.len() - slice.trim_end().len();
    if lead == slice.len() {
        return None;
    }
    Some(range.start + lead..range.end - trail)
}
