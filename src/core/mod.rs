//! Core domain types shared by plugins, the scoring pipeline and the store.

pub mod dimension;
pub mod language;
pub mod metric;

pub use dimension::{Dimension, Polarity, SizePolicy};
pub use language::{Language, LanguageSet};
pub use metric::{AnalysisFailure, CodebaseId, FailureReason, PluginOutcome, RawMetric};
