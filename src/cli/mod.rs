//! CLI module for codebench
//!
//! - Argument parsing (`args`)
//! - Command handlers (`commands`)
//! - Table rendering (`render`)
//! - Config, registry and store wiring (`setup`)

pub mod args;
pub mod commands;
pub mod render;
pub mod setup;

pub use args::{Cli, Commands, ReferenceArg};
pub use commands::{
    handle_compare_command, handle_history_command, handle_plugins_command, CompareArgs,
};
pub use setup::{build_registry, load_cli_config, open_store, store_path};

/// Parse CLI arguments using Clap
pub fn parse_args() -> Cli {
    args::parse_args()
}
