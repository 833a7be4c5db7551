// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - Only workflow coordination
//
//   config.rs            - PipelineConfig and its JSON loading
//   pipeline.rs          - QuestionPipeline, the generate() entry point
//   generate_use_case.rs - model loading + file-in/records-out batch run

/// Pipeline settings with documented defaults
pub mod config;

/// The question-generation orchestrator
pub mod pipeline;

/// The batch generation workflow
pub mod generate_use_case;

pub use config::PipelineConfig;
pub use pipeline::{PipelineRun, QuestionPipeline};
