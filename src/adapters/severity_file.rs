//! File-backed severity source.
//!
//! The upstream analysis pipelines drop two JSON documents (flat
//! string→number maps) next to the process. This adapter reads both each
//! cycle and derives the score. Every failure mode — missing file,
//! malformed JSON, absent keys — degrades to a quiet score with a log
//! line; a broken input must never stop the control loop.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::app::ports::SeverityPort;
use crate::config::SystemConfig;
use crate::severity::{self, SeverityScore, SeveritySnapshot, SourceMetrics};

/// Reads the magnetogram and continuum result documents.
pub struct FileSeveritySource {
    magnetogram_path: PathBuf,
    continuum_path: PathBuf,
}

impl FileSeveritySource {
    pub fn new(magnetogram: impl Into<PathBuf>, continuum: impl Into<PathBuf>) -> Self {
        Self {
            magnetogram_path: magnetogram.into(),
            continuum_path: continuum.into(),
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(&config.magnetogram_path, &config.continuum_path)
    }

    fn read_snapshot(&self) -> anyhow::Result<SeveritySnapshot> {
        Ok(SeveritySnapshot {
            magnetogram: read_source(&self.magnetogram_path, "magnetogram")?,
            continuum: read_source(&self.continuum_path, "continuum")?,
        })
    }
}

impl SeverityPort for FileSeveritySource {
    fn sample(&mut self) -> SeverityScore {
        match self.read_snapshot() {
            Ok(snapshot) => severity::evaluate(&snapshot),
            Err(e) => {
                warn!("severity inputs unreadable ({e}), treating as quiet");
                SeverityScore::QUIET
            }
        }
    }
}

/// Read one document and pull out `{prefix}-alpha` / `{prefix}-beta`.
/// Missing keys read as 0.0 and therefore never satisfy a comparison.
fn read_source(path: &Path, prefix: &str) -> anyhow::Result<SourceMetrics> {
    let text = fs::read_to_string(path)?;
    let fields: HashMap<String, f64> = serde_json::from_str(&text)?;

    let field = |suffix: &str| {
        fields
            .get(&format!("{prefix}-{suffix}"))
            .copied()
            .unwrap_or(0.0)
    };

    Ok(SourceMetrics {
        alpha: field("alpha"),
        beta: field("beta"),
    })
}
