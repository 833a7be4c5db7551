// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Records one CSV row per pipeline run.
//
// Example CSV output:
//   candidates,generated,failed,returned,elapsed_ms
//   14,13,1,10,5230
//   6,6,0,6,2104
//
// How to read the metrics:
//   - failed > 0 means some candidates were dropped
//     (inference or truncation failures)
//   - returned < requested means the text was too short or
//     too repetitive for the requested count

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

const HEADER: &str = "candidates,generated,failed,returned,elapsed_ms";

/// Counters for a single `generate` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Candidates produced by the answer extractor
    pub candidates: usize,

    /// Candidates that produced a question (and score, if enabled)
    pub generated: usize,

    /// Candidates dropped after an inference or truncation failure
    pub failed: usize,

    /// Questions in the final result
    pub returned: usize,

    pub elapsed_ms: u128,
}

impl RunMetrics {
    /// Fraction of candidates that survived generation
    pub fn success_rate(&self) -> f64 {
        if self.candidates == 0 {
            return 0.0;
        }
        self.generated as f64 / self.candidates as f64
    }
}

/// Appends run metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();

        if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create metrics CSV '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &RunMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open metrics CSV '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{},{},{},{}",
            m.candidates,
            m.generated,
            m.failed,
            m.returned,
            m.elapsed_ms,
        )?;

        tracing::debug!(
            "Logged run metrics: {}/{} candidates generated, {} returned",
            m.generated,
            m.candidates,
            m.returned,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
