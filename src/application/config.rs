// ============================================================
// Layer 2 - Pipeline Configuration
// ============================================================
// Every tunable knob of a pipeline run, with the documented
// defaults. Loaded from an optional JSON file; missing fields
// fall back to the defaults, and the CLI can override single
// fields afterwards.
//
// Example pipeline.json:
//   {
//     "context_sentences": 2,
//     "beam_width": 6,
//     "workers": 2
//   }

use serde::{Deserialize, Serialize};
use std::{fs, num::NonZeroUsize, path::Path};

use crate::data::ExtractorConfig;
use crate::domain::PipelineError;
use crate::ml::generator::DecodeSettings;
use crate::ranking::DistractorSampler;

const MAX_DEFAULT_WORKERS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Neighbouring sentences on each side of an answer
    pub context_sentences:   usize,
    pub max_sentence_chars:  usize,
    pub min_clause_words:    usize,
    pub max_phrase_words:    usize,

    pub beam_width:          usize,
    pub max_question_tokens: usize,
    pub max_input_tokens:    usize,
    pub max_eval_tokens:     usize,
    pub length_penalty:      f32,

    /// Inference threads per run, and model replicas per checkpoint
    pub workers:             usize,

    pub distractor_count:    usize,
    pub distractor_seed:     u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let extractor = ExtractorConfig::default();
        let decode    = DecodeSettings::default();
        Self {
            context_sentences:   extractor.context_sentences,
            max_sentence_chars:  extractor.max_sentence_chars,
            min_clause_words:    extractor.min_clause_words,
            max_phrase_words:    extractor.max_phrase_words,
            beam_width:          decode.beam_width,
            max_question_tokens: decode.max_question_tokens,
            max_input_tokens:    decode.max_input_tokens,
            max_eval_tokens:     512,
            length_penalty:      decode.length_penalty,
            workers:             default_workers(),
            distractor_count:    3,
            distractor_seed:     42,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        .min(MAX_DEFAULT_WORKERS)
}

impl PipelineConfig {
    /// Read a JSON config file; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let json = fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!("Cannot read config '{}': {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| {
            PipelineError::Configuration(format!("Invalid config '{}': {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let checks = [
            (self.beam_width == 0,          "beam_width must be at least 1"),
            (self.max_question_tokens == 0, "max_question_tokens must be at least 1"),
            (self.max_input_tokens < 2,     "max_input_tokens must be at least 2"),
            (self.max_eval_tokens <= 4,     "max_eval_tokens must be greater than 4"),
            (self.max_phrase_words == 0,    "max_phrase_words must be at least 1"),
            (self.workers == 0,             "workers must be at least 1"),
            (!self.length_penalty.is_finite(), "length_penalty must be a finite number"),
        ];
        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, msg)) => Err(PipelineError::Configuration(msg.to_string())),
            None => Ok(()),
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            context_sentences:  self.context_sentences,
            max_sentence_chars: self.max_sentence_chars,
            min_clause_words:   self.min_clause_words,
            max_phrase_words:   self.max_phrase_words,
        }
    }

    pub fn decode_settings(&self) -> DecodeSettings {
        DecodeSettings {
            beam_width:          self.beam_width,
            max_question_tokens: self.max_question_tokens,
            max_input_tokens:    self.max_input_tokens,
            length_penalty:      self.length_penalty,
            replicas:            self.workers,
        }
    }

    pub fn distractor_sampler(&self) -> DistractorSampler {
        DistractorSampler::new(self.distractor_count, self.distractor_seed)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.context_sentences, 1);
        assert_eq!(cfg.beam_width, 4);
        assert_eq!(cfg.max_question_tokens, 50);
        assert_eq!(cfg.distractor_count, 3);
        assert!(cfg.workers >= 1 && cfg.workers <= MAX_DEFAULT_WORKERS);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_partial_json() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        fs::write(&path, r#"{"context_sentences": 2, "beam_width": 6}"#).unwrap();

        let cfg = PipelineConfig::load(&path).unwrap();
        assert_eq!(cfg.context_sentences, 2);
        assert_eq!(cfg.beam_width, 6);
        assert_eq!(cfg.max_sentence_chars, 128);
        assert_eq!(cfg.extractor_config().context_sentences, 2);
        assert_eq!(cfg.decode_settings().beam_width, 6);
        assert_eq!(cfg.decode_settings().replicas, cfg.workers);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        fs::write(&path, r#"{"workers": 0}"#).unwrap();

        let err = PipelineConfig::load(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(ref m) if m.contains("workers")));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PipelineConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
