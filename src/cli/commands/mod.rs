//! Command handlers for CLI subcommands

mod compare;
mod history;
mod plugins;

pub use compare::{handle_compare_command, CompareArgs};
pub use history::handle_history_command;
pub use plugins::handle_plugins_command;
