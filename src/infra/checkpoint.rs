// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Restores pretrained model weights using Burn's CompactRecorder.
//
// A model directory holds three artifacts:
//
//   models/
//     qg/
//       config.json      ← architecture (Burn #[derive(Config)])
//       model.mpk        ← weights (CompactRecorder, MessagePack)
//       tokenizer.json   ← HuggingFace tokenizer
//
// The config is read first so the exact architecture can be
// rebuilt before the weights are loaded into it; CompactRecorder
// refuses a record whose shape does not match.
//
// A model may be named by path or by registry name. A name
// that is not an existing directory resolves to
// `<model_home>/<name>`.

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::de::DeserializeOwned;

pub const CONFIG_FILE:    &str = "config.json";
pub const WEIGHTS_STEM:   &str = "model";
pub const WEIGHTS_FILE:   &str = "model.mpk";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Read-only view of one model directory.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Resolve a model path or registry name against `model_home`.
    pub fn resolve(spec: &str, model_home: &Path) -> Self {
        let direct = PathBuf::from(spec);
        if direct.is_dir() {
            return Self::new(direct);
        }
        Self::new(model_home.join(spec))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Check that every artifact is present before anything is loaded.
    pub fn verify(&self) -> Result<()> {
        if !self.dir.is_dir() {
            bail!("model directory '{}' does not exist", self.dir.display());
        }
        let missing: Vec<&str> = [CONFIG_FILE, WEIGHTS_FILE, TOKENIZER_FILE]
            .into_iter()
            .filter(|name| !self.dir.join(name).is_file())
            .collect();
        if !missing.is_empty() {
            bail!(
                "model directory '{}' is missing {}",
                self.dir.display(),
                missing.join(", ")
            );
        }
        Ok(())
    }

    /// Load the architecture config stored next to the weights.
    pub fn load_config<C: DeserializeOwned>(&self) -> Result<C> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read model config from '{}'", path.display()))?;

        serde_json::from_str(&json)
            .with_context(|| format!("Model config '{}' does not match this architecture", path.display()))
    }

    /// Load weights into a freshly initialised `model`.
    ///
    /// The model must have the architecture described by
    /// `config.json` or the recorder rejects the record.
    pub fn load_model<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<M> {
        let path = self.dir.join(WEIGHTS_STEM);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load weights '{}.mpk'", path.display()))?;

        tracing::info!("Loaded weights from '{}'", self.dir.display());
        Ok(model.load_record(record))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TinyConfig {
        d_model: usize,
        num_heads: usize,
    }

    fn write_artifacts(dir: &Path) {
        fs::write(dir.join(CONFIG_FILE), r#"{"d_model": 64, "num_heads": 4}"#).unwrap();
        fs::write(dir.join(WEIGHTS_FILE), b"weights").unwrap();
        fs::write(dir.join(TOKENIZER_FILE), "{}").unwrap();
    }

    #[test]
    fn test_resolve_by_name_uses_model_home() {
        let home = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::resolve("qg", home.path());
        assert_eq!(ckpt.dir(), home.path().join("qg"));
    }

    #[test]
    fn test_resolve_existing_path_is_used_directly() {
        let home = tempfile::tempdir().unwrap();
        let model_dir = tempfile::tempdir().unwrap();
        let spec = model_dir.path().to_string_lossy().to_string();

        let ckpt = CheckpointManager::resolve(&spec, home.path());
        assert_eq!(ckpt.dir(), model_dir.path());
    }

    #[test]
    fn test_verify_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{}").unwrap();

        let err = CheckpointManager::new(dir.path()).verify().unwrap_err().to_string();
        assert!(err.contains(WEIGHTS_FILE));
        assert!(err.contains(TOKENIZER_FILE));
        assert!(!err.contains(CONFIG_FILE));
    }

    #[test]
    fn test_verify_missing_directory() {
        let home = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::resolve("nope", home.path());
        assert!(ckpt.verify().is_err());
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());

        let ckpt = CheckpointManager::new(dir.path());
        ckpt.verify().unwrap();
        let cfg: TinyConfig = ckpt.load_config().unwrap();
        assert_eq!(cfg, TinyConfig { d_model: 64, num_heads: 4 });
    }

    #[test]
    fn test_load_config_rejects_wrong_shape() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), r#"{"d_model": "big"}"#).unwrap();

        let result: Result<TinyConfig> = CheckpointManager::new(dir.path()).load_config();
        assert!(result.is_err());
    }
}
