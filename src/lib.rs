#![recursion_limit = "256"]

//! Question generation from plain text.
//!
//! Text goes through answer extraction, a seq2seq question
//! generator, an optional QA evaluator and a ranking step.
//! [`QuestionPipeline::generate`] is the entry point; the
//! models are injected through the [`TextToText`] and
//! [`QaScorer`] traits so the pipeline runs with any backend.

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;
pub mod ranking;

pub use application::{PipelineConfig, PipelineRun, QuestionPipeline};
pub use domain::{AnswerStyle, PipelineError, QaRecord, QaScorer, TextToText};
