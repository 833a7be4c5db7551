// ============================================================
// Ranking Layer
// ============================================================
// Turns generated questions into the final RankedResult:
// deduplicate, order, truncate, then attach distractors to
// multiple-choice questions.

/// Deduplication, ordering and truncation
pub mod selector;

/// Wrong-answer options for multiple-choice questions
pub mod distractors;

pub use distractors::DistractorSampler;
pub use selector::Selector;
