//! JSON snapshot of a record set.

use bidtab_analysis::{summarize, PortfolioStatistics};
use bidtab_core::{BidRecord, Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Records plus their statistics at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub bids: Vec<BidRecord>,
    pub statistics: PortfolioStatistics,
    /// Serialized as RFC 3339.
    pub exported_at: DateTime<Utc>,
    /// Always `bids.len()`.
    pub total_projects: usize,
}

/// Build a snapshot stamped with the current time.
pub fn build_snapshot(records: &[BidRecord]) -> Snapshot {
    build_snapshot_at(records, Utc::now())
}

/// Build a snapshot with an explicit export time.
pub fn build_snapshot_at(records: &[BidRecord], exported_at: DateTime<Utc>) -> Snapshot {
    Snapshot {
        bids: records.to_vec(),
        statistics: summarize(records),
        exported_at,
        total_projects: records.len(),
    }
}

/// Serialize a snapshot.
pub fn to_json(snapshot: &Snapshot, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(snapshot)?
    } else {
        serde_json::to_string(snapshot)?
    };
    Ok(json)
}

/// Deserialize a snapshot, rejecting an inconsistent project count.
pub fn parse_snapshot(json: &str) -> Result<Snapshot> {
    let snapshot: Snapshot = serde_json::from_str(json)?;
    if snapshot.total_projects != snapshot.bids.len() {
        return Err(Error::data(format!(
            "totalProjects is {} but the snapshot holds {} bids",
            snapshot.total_projects,
            snapshot.bids.len()
        )));
    }
    Ok(snapshot)
}

/// `"{prefix}-YYYY-MM-DD.json"`.
pub fn default_export_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.json", prefix, date.format("%Y-%m-%d"))
}

/// Write a snapshot to disk, creating parent directories if needed.
pub fn write_snapshot(path: impl AsRef<Path>, snapshot: &Snapshot, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_json(snapshot, pretty)?)?;
    info!(
        path = %path.display(),
        projects = snapshot.total_projects,
        "wrote snapshot"
    );
    Ok(())
}

/// Read a snapshot written by [`write_snapshot`].
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<Snapshot> {
    let text = std::fs::read_to_string(path)?;
    parse_snapshot(&text)
}
