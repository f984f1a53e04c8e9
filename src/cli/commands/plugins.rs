use crate::cli::render::plugins_table;
use crate::cli::setup::{build_registry, load_cli_config};
use anyhow::Result;
use std::path::Path;

/// Print every registered dimension with its polarity and size policy.
pub fn handle_plugins_command(config: Option<&Path>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = load_cli_config(config, &cwd)?;
    let registry = build_registry(&config)?;
    println!("{}", plugins_table(&registry));
    Ok(())
}
