// ============================================================
// Layer 4 - Text Pipeline
// ============================================================
// Everything between a file on disk and a list of answer
// candidates:
//
//   .txt / .docx
//       │
//       ▼
//   FileLoader      → reads files into Documents
//       │
//       ▼
//   Preprocessor    → normalises whitespace and control chars
//       │
//       ▼
//   AnswerExtractor → sentences + harvested spans
//       │               (uses the segmenter and harvester)
//       ▼
//   Vec<AnswerCandidate>
//
// Nothing here touches a model; all of it is pure text work.

/// Loads .txt and .docx sources
pub mod loader;

/// Cleans raw text before it reaches the pipeline
pub mod preprocessor;

/// Sentence boundary detection with byte ranges
pub mod sentences;

/// Noun-phrase-like span harvesting for multiple choice
pub mod phrases;

/// Candidate extraction for each answer style
pub mod extractor;

pub use extractor::{AnswerExtractor, ExtractorConfig};
pub use loader::FileLoader;
pub use preprocessor::Preprocessor;
