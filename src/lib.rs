// Export modules for library usage
pub mod cli;
pub mod comparison;
pub mod config;
pub mod core;
pub mod errors;
pub mod io;
pub mod observability;
pub mod plugins;
pub mod scoring;
pub mod store;

// Re-export commonly used types
pub use crate::core::{
    AnalysisFailure, CodebaseId, Dimension, FailureReason, Language, LanguageSet, PluginOutcome,
    Polarity, RawMetric, SizePolicy,
};

pub use crate::comparison::{
    CancellationToken, ComparisonReport, CompletedRun, DimensionOutcome, DimensionRow,
    Orchestrator, RunState,
};

pub use crate::config::{load_config, CodebenchConfig, CompareSettings, SettingsOverrides};

pub use crate::errors::{CompareError, ErrorCode, StoreError};

pub use crate::io::{Codebase, LoadOptions, SourceFile};

pub use crate::plugins::{
    AnalysisOptions, BenchmarkPlugin, ExternalPlugin, ExternalPluginSpec, PluginRegistry,
};

pub use crate::scoring::{
    Aggregator, MarginClass, NormalizedScore, ReferenceDistribution, ReferenceMode,
    ScoreNormalizer, SizeBiasCorrector, WeightConfig, Winner,
};

pub use crate::store::{HistoryFilter, InMemoryStore, ResultStore, RunId, SqliteStore, StoredRun};
