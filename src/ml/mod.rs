// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports from burn directly, only this one
// (and the checkpoint loader in infra).
//
//   model.rs      - Seq2seq transformer (encoder + decoder)
//   classifier.rs - QA evaluation classifier (encoder + head)
//   beam.rs       - Model-agnostic beam search
//   replicas.rs   - Per-worker model clones
//   generator.rs  - TextToText over the seq2seq checkpoint
//   evaluator.rs  - QaScorer over the classifier checkpoint

/// Inference runs on the default wgpu device
pub type InferBackend = burn::backend::Wgpu;

/// Encoder-decoder question generation architecture
pub mod model;

/// Question/answer plausibility classifier
pub mod classifier;

/// Deterministic beam search decoding
pub mod beam;

/// Cloned models so workers never queue on one lock
pub mod replicas;

/// Burn-backed question generator
pub mod generator;

/// Burn-backed QA evaluator
pub mod evaluator;
