//! Configuration: the `.codebench.toml` file model, its discovery, and the
//! effective per-run settings.

mod core;
mod loader;
mod settings;

pub use self::core::{AnalysisConfig, CodebenchConfig, ReferenceConfig, ScoringConfig};
pub use loader::{
    directory_ancestors, discover_config_path, load_config, load_config_file, parse_config,
    CONFIG_FILE_NAME,
};
pub use settings::{CompareSettings, SettingsOverrides, DEFAULT_GIT_WINDOW_DAYS, DEFAULT_TIMEOUT_SECS};
