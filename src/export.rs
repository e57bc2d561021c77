//! Export artifacts
//!
//! Turns the log's export payloads into on-disk files named by the
//! current date, matching `gemini_logs_<ISO-date>.<ext>`.

use crate::error::Result;
use crate::log_store::LogStore;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Export payload format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Download filename for an export taken on `date`
pub fn export_filename(format: ExportFormat, date: NaiveDate) -> String {
    format!("gemini_logs_{}.{}", date.format("%Y-%m-%d"), format.extension())
}

/// Write the current log as an export file under `dir`.
///
/// Returns the path written.
pub async fn save_export(dir: &Path, store: &LogStore, format: ExportFormat) -> Result<PathBuf> {
    let bytes = match format {
        ExportFormat::Json => store.export_json().await?,
        ExportFormat::Csv => store.export_csv().await,
    };

    fs::create_dir_all(dir).await?;
    let path = dir.join(export_filename(format, chrono::Local::now().date_naive()));
    fs::write(&path, &bytes).await?;

    tracing::info!(
        path = %path.display(),
        bytes = bytes.len(),
        records = store.len().await,
        "Log exported"
    );
    Ok(path)
}
