use super::{finish_history, HistoryFilter, ResultStore, RunId, StoredRun};
use crate::comparison::ComparisonReport;
use crate::errors::StoreError;
use chrono::SecondsFormat;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS runs (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp     TEXT    NOT NULL,
    codebase_a    TEXT    NOT NULL,
    codebase_b    TEXT    NOT NULL,
    total_a       REAL    NOT NULL,
    total_b       REAL    NOT NULL,
    winner        TEXT    NOT NULL,
    report_json   TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_runs_timestamp ON runs(timestamp);
CREATE INDEX IF NOT EXISTS idx_runs_codebase_a ON runs(codebase_a);
CREATE INDEX IF NOT EXISTS idx_runs_codebase_b ON runs(codebase_b);
";

/// SQLite-backed run history. Insert-only.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) a file-backed store.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init_connection(&conn)?;
        tracing::debug!(path = %path.display(), "opened result store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store (for testing).
    pub fn memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_connection(conn: &Connection) -> Result<(), StoreError> {
        // WAL for file-backed DBs; no-op for in-memory
        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn id_and_json(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn row_to_run(id: i64, json: &str) -> Result<StoredRun, StoreError> {
    let report = ComparisonReport::from_json(json)
        .map_err(|e| StoreError::Corrupt(format!("run {id}: {e}")))?;
    Ok(StoredRun {
        run_id: RunId(id),
        report,
    })
}

impl ResultStore for SqliteStore {
    fn save(&self, report: &ComparisonReport) -> Result<RunId, StoreError> {
        let json = report.to_json()?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO runs(timestamp, codebase_a, codebase_b, total_a, total_b, winner, report_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                report.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
                report.codebase_a_id.as_str(),
                report.codebase_b_id.as_str(),
                report.total_a,
                report.total_b,
                report.overall_winner.to_string(),
                json,
            ],
        )?;
        Ok(RunId(conn.last_insert_rowid()))
    }

    fn load_history(&self, filter: &HistoryFilter) -> Result<Vec<StoredRun>, StoreError> {
        let rows: Vec<(i64, String)> = {
            let conn = self.conn.lock();
            let mut stmt = match &filter.codebase {
                Some(_) => conn.prepare(
                    "SELECT id, report_json FROM runs
                     WHERE codebase_a = ?1 OR codebase_b = ?1 ORDER BY id",
                )?,
                None => conn.prepare("SELECT id, report_json FROM runs ORDER BY id")?,
            };
            let mapped = match &filter.codebase {
                Some(codebase) => stmt.query_map(params![codebase], id_and_json)?,
                None => stmt.query_map([], id_and_json)?,
            };
            let rows = mapped.collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let mut runs = Vec::with_capacity(rows.len());
        for (id, json) in rows {
            let run = row_to_run(id, &json)?;
            if filter.matches(&run.report) {
                runs.push(run);
            }
        }
        Ok(finish_history(runs, filter))
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::report::fixtures::report;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_saved_report_reads_back_exactly() {
        let store = SqliteStore::memory().unwrap();
        let original = report();
        let id = store.save(&original).unwrap();
        let history = store.load_history(&HistoryFilter::default()).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].run_id, id);
        assert_eq!(history[0].report, original);
    }

    #[test]
    fn test_history_ordered_by_timestamp() {
        let store = SqliteStore::memory().unwrap();
        let mut late = report();
        late.timestamp += chrono::Duration::hours(1);
        let late_id = store.save(&late).unwrap();
        let early_id = store.save(&report()).unwrap();

        let ids: Vec<RunId> = store
            .load_history(&HistoryFilter::default())
            .unwrap()
            .into_iter()
            .map(|r| r.run_id)
            .collect();
        assert_eq!(ids, vec![early_id, late_id]);
    }

    #[test]
    fn test_codebase_filter() {
        let store = SqliteStore::memory().unwrap();
        store.save(&report()).unwrap();
        let mut other = report();
        other.codebase_a_id = crate::core::CodebaseId::new("/src/gamma");
        other.codebase_b_id = crate::core::CodebaseId::new("/src/delta");
        store.save(&other).unwrap();

        let filter = HistoryFilter {
            codebase: Some("/src/delta".to_string()),
            ..HistoryFilter::default()
        };
        let history = store.load_history(&filter).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].report.codebase_a_label, "alpha");
        assert_eq!(history[0].report.codebase_b_id.as_str(), "/src/delta");
    }

    #[test]
    fn test_concurrent_saves_on_one_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("history.db");
        let store = Arc::new(SqliteStore::open(&path).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..5 {
                        store.save(&report()).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.count().unwrap(), 20);

        let reopened = SqliteStore::open(&path).unwrap();
        let history = reopened.load_history(&HistoryFilter::default()).unwrap();
        assert_eq!(history.len(), 20);
        assert!(history.iter().all(|r| r.report == report()));
    }
}
