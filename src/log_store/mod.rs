//! Log store - session-scoped analysis log
//!
//! ## Responsibilities
//!
//! - Keep completed analyses in memory, newest first
//! - Guarantee exactly-once logging per capture (no duplicate ids)
//! - Produce JSON and CSV export payloads
//!
//! Nothing here persists across sessions.

use crate::camera::EncodedImage;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::RwLock;
use uuid::Uuid;

/// One completed capture-and-description event.
///
/// Immutable once created; records are appended or removed en masse,
/// never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    /// Local key only, never sent upstream
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub image: EncodedImage,
    pub description: String,
}

impl AnalysisRecord {
    /// Create a record for a just-completed analysis
    pub fn new(image: EncodedImage, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            image,
            description,
        }
    }

    /// Short human label: first 8 characters of the id
    pub fn id_label(&self) -> String {
        self.id.to_string().chars().take(8).collect()
    }

    /// Timestamp formatted for display in the local timezone
    pub fn display_timestamp(&self) -> String {
        self.timestamp
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

/// In-memory analysis log, newest first
#[derive(Default)]
pub struct LogStore {
    records: RwLock<VecDeque<AnalysisRecord>>,
}

impl LogStore {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record at the front.
    ///
    /// A record whose id is already present is dropped; the log never
    /// holds two records with the same id.
    pub async fn append(&self, record: AnalysisRecord) {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            tracing::warn!(id = %record.id, "Duplicate record id, append dropped");
            return;
        }

        tracing::debug!(id = %record.id, "Analysis record logged");
        records.push_front(record);
    }

    /// Empty the log. Destructive confirmation is the caller's concern.
    pub async fn clear(&self) {
        let mut records = self.records.write().await;
        let dropped = records.len();
        records.clear();
        tracing::info!(dropped = dropped, "Log cleared");
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Ordered copy of the log for rendering or export
    pub async fn snapshot(&self) -> Vec<AnalysisRecord> {
        self.records.read().await.iter().cloned().collect()
    }

    /// Pretty-printed JSON array of the full ordered record list
    pub async fn export_json(&self) -> crate::error::Result<Vec<u8>> {
        let snapshot = self.snapshot().await;
        Ok(serde_json::to_vec_pretty(&snapshot)?)
    }

    /// CSV of `ID,Timestamp,Description`.
    ///
    /// The description is always double-quoted with internal quotes
    /// doubled; image payloads are never included in this format.
    pub async fn export_csv(&self) -> Vec<u8> {
        let snapshot = self.snapshot().await;
        let mut lines = vec!["ID,Timestamp,Description".to_string()];
        for record in &snapshot {
            lines.push(format!(
                "{},{},\"{}\"",
                record.id,
                record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                record.description.replace('"', "\"\"")
            ));
        }
        lines.join("\n").into_bytes()
    }
}
