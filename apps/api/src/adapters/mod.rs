//! I/O adapters at the edges of a run: where raw offerings come from and
//! where finished reports go.
//!
//! Both are traits carried in `AppState` as `Arc<dyn …>` so a search-API
//! client or a spreadsheet writer can replace the JSON-file defaults.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::matching::pipeline::RunReport;
use crate::matching::report::render_table;
use crate::models::offering::RawOffering;

// ────────────────────────────────────────────────────────────────────────────
// Offering source
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait OfferingSource: Send + Sync {
    /// Loads raw offerings from `location`, in source order.
    async fn load(&self, location: &str) -> Result<Vec<RawOffering>>;
}

/// Reads a JSON file holding either an array of offerings or a search-API
/// envelope `{ "data": [...] }`.
///
/// Locations are relative to `root` and may not leave it.
pub struct JsonFileOfferingSource {
    root: PathBuf,
}

impl JsonFileOfferingSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, location: &str) -> Result<PathBuf> {
        let relative = Path::new(location.trim());
        if relative.as_os_str().is_empty() {
            bail!("Offerings location is empty");
        }
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => bail!("Offerings location '{location}' must stay inside the offerings directory"),
            }
        }
        Ok(self.root.join(relative))
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum OfferingFile {
    List(Vec<RawOffering>),
    Envelope { data: Vec<RawOffering> },
}

#[async_trait]
impl OfferingSource for JsonFileOfferingSource {
    async fn load(&self, location: &str) -> Result<Vec<RawOffering>> {
        let path = self.resolve(location)?;
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read offerings file '{location}'"))?;
        let file: OfferingFile = serde_json::from_str(&text)
            .with_context(|| format!("Offerings file '{location}' is not valid JSON"))?;
        let offerings = match file {
            OfferingFile::List(list) => list,
            OfferingFile::Envelope { data } => data,
        };
        info!(path = %path.display(), count = offerings.len(), "Offerings loaded");
        Ok(offerings)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Report sink
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Publishes a finished report. Returns where it went, if addressable.
    async fn publish(&self, report: &RunReport) -> Result<Option<PathBuf>>;
}

/// Writes `report-<run_id>.json` into a directory, plus a tab-separated
/// `report-<run_id>.tsv` of the rows for spreadsheet import.
pub struct JsonReportSink {
    dir: PathBuf,
}

impl JsonReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ReportSink for JsonReportSink {
    async fn publish(&self, report: &RunReport) -> Result<Option<PathBuf>> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create report directory {}", self.dir.display()))?;

        let path = self.dir.join(format!("report-{}.json", report.run_id));
        let body = serde_json::to_vec_pretty(report).context("Failed to serialize run report")?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("Failed to write report {}", path.display()))?;

        let table_path = path.with_extension("tsv");
        tokio::fs::write(&table_path, render_table(&report.rows))
            .await
            .with_context(|| format!("Failed to write report table {}", table_path.display()))?;

        info!(run_id = %report.run_id, path = %path.display(), "Report written");
        Ok(Some(path))
    }
}

/// Discards reports. Used when no report directory is configured.
pub struct NullReportSink;

#[async_trait]
impl ReportSink for NullReportSink {
    async fn publish(&self, _report: &RunReport) -> Result<Option<PathBuf>> {
        Ok(None)
    }
}
