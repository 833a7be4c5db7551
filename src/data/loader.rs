// ============================================================
// Layer 4 - Source Loader
// ============================================================
// Reads the text a batch run asks questions about. The input
// path may be a single file or a directory; directories are
// scanned (non-recursively) for supported files, in name order
// so runs are reproducible.
//
// Supported formats:
//   .txt   read as UTF-8
//   .md    read as UTF-8
//   .docx  parsed with docx-rs; paragraph text joined by
//          newlines, runs inside a paragraph concatenated
//
// The docx-rs tree we walk:
//   Document → DocumentChild::Paragraph → ParagraphChild::Run
//            → RunChild::Text

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use docx_rs::{read_docx, ReaderError};

use crate::domain::document::Document;
use crate::domain::traits::DocumentSource;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

/// Loads documents from a file or a directory of files
pub struct FileLoader {
    path: PathBuf,
}

impl FileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentSource for FileLoader {
    fn load_all(&self) -> Result<Vec<Document>> {
        if self.path.is_file() {
            return Ok(vec![load_file(&self.path)?]);
        }
        if !self.path.is_dir() {
            bail!("Input '{}' does not exist", self.path.display());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.path)
            .with_context(|| format!("Cannot read directory '{}'", self.path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_supported(p))
            .collect();
        paths.sort();

        let mut docs = Vec::with_capacity(paths.len());
        for path in paths {
            // One unreadable file should not sink the whole batch
            match load_file(&path) {
                Ok(doc) => {
                    tracing::debug!("Loaded: {} ({} words)", doc.source, doc.word_count());
                    docs.push(doc);
                }
                Err(e) => tracing::warn!("Skipping '{}': {:#}", path.display(), e),
            }
        }

        tracing::info!("Loaded {} documents from '{}'", docs.len(), self.path.display());
        Ok(docs)
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn is_supported(path: &Path) -> bool {
    match extension(path) {
        Some(ext) => ext == "docx" || TEXT_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

fn load_file(path: &Path) -> Result<Document> {
    let text = match extension(path).as_deref() {
        Some("docx") => load_docx_text(path)?,
        _ => fs::read_to_string(path)
            .with_context(|| format!("Cannot read '{}' as UTF-8 text", path.display()))?,
    };

    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(Document::new(source, text))
}

fn load_docx_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    let docx = read_docx(&bytes).map_err(|e: ReaderError| {
        anyhow::anyhow!("docx-rs parse error in '{}': {:?}", path.display(), e)
    })?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            docx_rs::DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
            _ => None,
        })
        .filter(|text| !text.trim().is_empty())
        .collect();

    Ok(paragraphs.join("\n"))
}

fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    use docx_rs::{ParagraphChild, RunChild};

    let mut out = String::new();
    for child in &para.children {
        if let ParagraphChild::Run(run) = child {
            for rc in &run.children {
                if let RunChild::Text(t) = rc {
                    out.push_str(&t.text);
                }
            }
        }
    }
    out
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_single_text_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("article.txt");
        fs::write(&path, "Paris is the capital of France.").unwrap();

        let docs = FileLoader::new(&path).load_all().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "article.txt");
        assert_eq!(docs[0].text, "Paris is the capital of France.");
    }

    #[test]
    fn test_directory_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "second").unwrap();
        fs::write(dir.path().join("a.md"), "first").unwrap();
        fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();

        let docs = FileLoader::new(dir.path()).load_all().unwrap();
        let sources: Vec<&str> = docs.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(sources, vec!["a.md", "b.txt"]);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileLoader::new(dir.path().join("nope.txt")).load_all();
        assert!(err.is_err());
    }

    #[test]
    fn test_bad_docx_is_skipped_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.docx"), b"not a zip").unwrap();
        fs::write(dir.path().join("ok.txt"), "fine").unwrap();

        let docs = FileLoader::new(dir.path()).load_all().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "ok.txt");
    }
}
