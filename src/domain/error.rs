// ============================================================
// Layer 3 - Pipeline Errors
// ============================================================
// Configuration problems are reported before any inference
// runs. Per-candidate failures (Inference, Truncation) are
// dropped by the orchestrator; only when every candidate
// fails does the caller see AllCandidatesFailed.

use thiserror::Error;

/// Errors surfaced by the question-generation pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid request parameters or pipeline settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A model checkpoint or tokenizer could not be loaded
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    /// A single generation or scoring call failed
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Fitting the model input would cut into the answer span
    #[error("Truncation would cut the answer span: {0}")]
    Truncation(String),

    /// Every extracted candidate failed generation or scoring
    #[error("All {attempted} candidates failed; last error: {last_error}")]
    AllCandidatesFailed { attempted: usize, last_error: String },
}

impl PipelineError {
    /// True for failures that only affect one candidate
    pub fn is_candidate_local(&self) -> bool {
        matches!(self, PipelineError::Inference(_) | PipelineError::Truncation(_))
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Inference(format!("{err:#}"))
    }
}
