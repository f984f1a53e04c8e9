use super::{finish_history, HistoryFilter, ResultStore, RunId, StoredRun};
use crate::comparison::ComparisonReport;
use crate::errors::StoreError;
use parking_lot::Mutex;

/// Process-local store, used by tests and `--no-store` runs.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    runs: Mutex<Vec<StoredRun>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.runs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.lock().is_empty()
    }
}

impl ResultStore for InMemoryStore {
    fn save(&self, report: &ComparisonReport) -> Result<RunId, StoreError> {
        let mut runs = self.runs.lock();
        let run_id = RunId(runs.len() as i64 + 1);
        runs.push(StoredRun {
            run_id,
            report: report.clone(),
        });
        Ok(run_id)
    }

    fn load_history(&self, filter: &HistoryFilter) -> Result<Vec<StoredRun>, StoreError> {
        let matching = self
            .runs
            .lock()
            .iter()
            .filter(|run| filter.matches(&run.report))
            .cloned()
            .collect();
        Ok(finish_history(matching, filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::report::fixtures::report;

    #[test]
    fn test_save_assigns_increasing_ids() {
        let store = InMemoryStore::new();
        let first = store.save(&report()).unwrap();
        let second = store.save(&report()).unwrap();
        assert!(second > first);
        assert_eq!(store.len(), 2);

        let history = store.load_history(&HistoryFilter::default()).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].run_id, first);
    }
}
