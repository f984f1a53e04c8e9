use crate::cli::render::history_table;
use crate::cli::setup::open_store;
use crate::store::HistoryFilter;
use anyhow::Result;
use std::path::PathBuf;

pub fn handle_history_command(
    codebase: Option<String>,
    limit: usize,
    store: Option<PathBuf>,
) -> Result<()> {
    let store = open_store(store, false)?;
    let filter = HistoryFilter {
        codebase,
        since: None,
        limit: Some(limit),
    };
    let runs = store.load_history(&filter)?;
    if runs.is_empty() {
        println!("No stored comparisons.");
        return Ok(());
    }
    println!("{}", history_table(&runs));
    Ok(())
}
