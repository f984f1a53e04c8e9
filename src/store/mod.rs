//! Persistence of completed comparison reports.
//!
//! Stores are append-only: each completed run writes one new record and
//! existing records are never rewritten, so concurrent runs cannot corrupt
//! each other's history.

mod memory;
mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::comparison::ComparisonReport;
use crate::errors::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identifier assigned by the store to a saved run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub i64);

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Selection of stored runs. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Matches either side's codebase id.
    pub codebase: Option<String>,
    pub since: Option<DateTime<Utc>>,
    /// Keep only the newest `limit` matching runs (still returned oldest first).
    pub limit: Option<usize>,
}

impl HistoryFilter {
    pub fn matches(&self, report: &ComparisonReport) -> bool {
        let codebase_ok = self.codebase.as_deref().is_none_or(|id| {
            report.codebase_a_id.as_str() == id || report.codebase_b_id.as_str() == id
        });
        let since_ok = self.since.is_none_or(|since| report.timestamp >= since);
        codebase_ok && since_ok
    }
}

/// A stored report with the id it was saved under.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRun {
    pub run_id: RunId,
    pub report: ComparisonReport,
}

pub trait ResultStore: Send + Sync {
    fn save(&self, report: &ComparisonReport) -> Result<RunId, StoreError>;

    /// Matching runs ordered by timestamp, ties broken by run id.
    fn load_history(&self, filter: &HistoryFilter) -> Result<Vec<StoredRun>, StoreError>;
}

/// Order runs by (timestamp, run id) and apply the filter's limit.
pub(crate) fn finish_history(mut runs: Vec<StoredRun>, filter: &HistoryFilter) -> Vec<StoredRun> {
    runs.sort_by(|a, b| {
        a.report
            .timestamp
            .cmp(&b.report.timestamp)
            .then(a.run_id.cmp(&b.run_id))
    });
    if let Some(limit) = filter.limit {
        let excess = runs.len().saturating_sub(limit);
        runs.drain(..excess);
    }
    runs
}

/// `<data dir>/codebench/history.db`.
pub fn default_store_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("codebench").join("history.db"))
}
