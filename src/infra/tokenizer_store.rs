// ============================================================
// Layer 6 - Tokenizer Store
// ============================================================
// Loads the pretrained subword tokenizer shipped with each
// model and wraps it in `TextCodec`, the only place that
// touches the `tokenizers` crate.
//
//   text  ──encode──►  ids (+ byte offsets into the text)
//   ids   ──decode──►  text, special tokens and markers removed
//
// Offsets are byte offsets into the original string, so the
// generator can map the answer span onto token positions.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

/// Marker tokens that may survive decoding when a checkpoint
/// did not register them as special
const MARKERS: &[&str] = &["<answer>", "<context>", "<pad>", "</s>", "[CLS]", "[SEP]", "[PAD]"];

pub struct TokenizerStore {
    path: PathBuf,
}

impl TokenizerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load a previously saved tokenizer from JSON file
    pub fn load(&self) -> Result<TextCodec> {
        TextCodec::from_file(&self.path)
    }
}

/// Thread-safe encode/decode over a loaded tokenizer.
pub struct TextCodec {
    tokenizer: Tokenizer,
}

impl TextCodec {
    pub fn from_file(path: &Path) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))?;
        tracing::debug!("Tokenizer loaded from '{}'", path.display());
        Ok(Self { tokenizer })
    }

    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let enc = self.tokenizer.encode(text, false)
            .map_err(|e| anyhow!("Tokenise: {e}"))?;
        Ok(enc.get_ids().to_vec())
    }

    /// Token ids plus each token's byte range in `text`
    pub fn encode_with_offsets(&self, text: &str) -> Result<(Vec<u32>, Vec<(usize, usize)>)> {
        let enc = self.tokenizer.encode(text, false)
            .map_err(|e| anyhow!("Tokenise: {e}"))?;
        Ok((enc.get_ids().to_vec(), enc.get_offsets().to_vec()))
    }

    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        let text = self.tokenizer.decode(ids, true)
            .map_err(|e| anyhow!("Decode: {e}"))?;
        Ok(strip_markers(&text))
    }

    pub fn token_id(&self, token: &str) -> Option<u32> {
        self.tokenizer.token_to_id(token)
    }

    /// First of `candidates` present in the vocabulary
    pub fn first_token_id(&self, candidates: &[&str]) -> Result<u32> {
        candidates
            .iter()
            .find_map(|t| self.token_id(t))
            .ok_or_else(|| anyhow!("tokenizer has none of {:?}", candidates))
    }
}

fn strip_markers(text: &str) -> String {
    let mut out = text.to_string();
    for marker in MARKERS {
        out = out.replace(marker, " ");
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_tokenizer(dir: &Path) -> PathBuf {
        let json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": 0, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 1, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 2, "content": "[CLS]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 3, "content": "[SEP]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": {
                    "[PAD]": 0, "[UNK]": 1, "[CLS]": 2, "[SEP]": 3,
                    "what": 4, "is": 5, "rust": 6, "?": 7
                },
                "unk_token": "[UNK]"
            }
        });
        let path = dir.join("tokenizer.json");
        std::fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_encode_with_offsets() {
        let dir   = tempfile::tempdir().unwrap();
        let codec = TokenizerStore::new(tiny_tokenizer(dir.path())).load().unwrap();

        let (ids, offsets) = codec.encode_with_offsets("What is Rust?").unwrap();
        assert_eq!(ids, vec![4, 5, 6, 7]);
        assert_eq!(offsets[2], (8, 12));
    }

    #[test]
    fn test_special_token_lookup() {
        let dir   = tempfile::tempdir().unwrap();
        let codec = TextCodec::from_file(&tiny_tokenizer(dir.path())).unwrap();

        assert_eq!(codec.token_id("[SEP]"), Some(3));
        assert_eq!(codec.token_id("</s>"), None);
        assert_eq!(codec.first_token_id(&["<s>", "[CLS]"]).unwrap(), 2);
        assert!(codec.first_token_id(&["<s>"]).is_err());
    }

    #[test]
    fn test_decode_skips_special_tokens() {
        let dir   = tempfile::tempdir().unwrap();
        let codec = TextCodec::from_file(&tiny_tokenizer(dir.path())).unwrap();

        let text = codec.decode(&[2, 4, 5, 6, 3]).unwrap();
        assert_eq!(text, "what is rust");
    }

    #[test]
    fn test_missing_tokenizer_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TokenizerStore::new(dir.path().join("tokenizer.json")).load().is_err());
    }

    #[test]
    fn test_strip_markers() {
        assert_eq!(strip_markers("<pad> When was it built? </s>"), "When was it built?");
    }
}
