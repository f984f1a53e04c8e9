//! Wiring shared by the subcommands: config resolution, plugin registry
//! and result store.

use crate::config::{load_config, CodebenchConfig};
use crate::plugins::PluginRegistry;
use crate::store::{default_store_path, InMemoryStore, ResultStore, SqliteStore};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Explicit `--config`, else the nearest `.codebench.toml` above `start`.
pub fn load_cli_config(explicit: Option<&Path>, start: &Path) -> Result<CodebenchConfig> {
    let config = load_config(explicit, start)?;
    Ok(config)
}

/// Built-in plugins plus the config's external tools.
pub fn build_registry(config: &CodebenchConfig) -> Result<PluginRegistry> {
    let mut registry = PluginRegistry::with_builtins();
    registry.register_external(&config.external)?;
    Ok(registry)
}

/// `--store`, else the per-user data directory.
pub fn store_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit
        .or_else(default_store_path)
        .context("no data directory found; pass --store")
}

pub fn open_store(explicit: Option<PathBuf>, disabled: bool) -> Result<Arc<dyn ResultStore>> {
    if disabled {
        return Ok(Arc::new(InMemoryStore::new()));
    }
    let path = store_path(explicit)?;
    let store = SqliteStore::open(&path)
        .with_context(|| format!("failed to open result store at {}", path.display()))?;
    Ok(Arc::new(store))
}
