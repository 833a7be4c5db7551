// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain value types and capability traits shared by every
// other layer of the question-generation pipeline.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO tokenizer or file I/O
//   - Only structs, enums, traits and the error taxonomy
//
// The model-backed components (Layer 5) implement the traits
// declared here, which lets the pipeline be exercised with
// stub models in unit tests.

/// A source document loaded from disk
pub mod document;

/// Answer styles requested by callers
pub mod style;

/// Candidate (context, answer span) pairs
pub mod candidate;

/// Generated questions and ranked results
pub mod question;

/// Capability traits implemented by the model layer
pub mod traits;

/// Pipeline error taxonomy
pub mod error;

pub use candidate::{AnswerCandidate, CandidateStyle, SpanKind};
pub use document::Document;
pub use error::PipelineError;
pub use question::{GeneratedQuestion, QaRecord, RankedQuestion, RankedResult};
pub use style::AnswerStyle;
pub use traits::{DocumentSource, QaScorer, TextToText};
