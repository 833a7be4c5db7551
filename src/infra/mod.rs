// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the ML and application layers:
//
//   checkpoint.rs      - Model directory resolution and loading
//                        (config.json + CompactRecorder weights)
//
//   tokenizer_store.rs - Pretrained tokenizer loading and the
//                        TextCodec encode/decode adapter
//
//   metrics.rs         - Per-run metrics CSV logging

/// Model directory resolution and checkpoint loading
pub mod checkpoint;

/// Tokenizer loading and text <-> id conversion
pub mod tokenizer_store;

/// Run metrics CSV logger
pub mod metrics;
