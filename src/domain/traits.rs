// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The pipeline only talks to models through these traits.
// Layer 5 provides Burn-backed implementations; tests provide
// stubs, so extraction, ranking and orchestration can be
// checked without any model weights.
//
// Model-backed implementations are shared read-only across
// worker threads, hence the Send + Sync bounds.

use anyhow::Result;

use crate::domain::candidate::AnswerCandidate;
use crate::domain::document::Document;
use crate::domain::error::PipelineError;

// ─── DocumentSource ───────────────────────────────────────────────────────────
/// Any component that can load source documents.
///
/// Implementations:
///   - FileLoader → a single .txt/.docx file or a directory of them
pub trait DocumentSource {
    fn load_all(&self) -> Result<Vec<Document>>;
}

// ─── TextToText ───────────────────────────────────────────────────────────────
/// Turns a candidate (context with a highlighted answer) into a question.
///
/// Errors must be `Inference` or `Truncation` for failures that only
/// affect this candidate; the orchestrator drops the candidate and
/// carries on.
pub trait TextToText: Send + Sync {
    fn generate_question(&self, candidate: &AnswerCandidate) -> std::result::Result<String, PipelineError>;
}

// ─── QaScorer ─────────────────────────────────────────────────────────────────
/// Scores how plausible a (question, answer, context) triple is.
/// Higher is better; implementations return values in [0, 1].
pub trait QaScorer: Send + Sync {
    fn score(
        &self,
        question: &str,
        answer:   &str,
        context:  &str,
    ) -> std::result::Result<f32, PipelineError>;
}
