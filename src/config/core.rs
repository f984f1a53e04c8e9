use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::Dimension;
use crate::plugins::ExternalPluginSpec;
use crate::scoring::{ReferenceDistribution, ReferenceMode, WeightConfig};

/// Root of `.codebench.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodebenchConfig {
    /// Weight multiplier per dimension; unlisted dimensions weigh 1.0.
    #[serde(default)]
    pub weights: WeightConfig,

    /// Dimensions excluded from scoring and from weight normalization.
    #[serde(default)]
    pub skip: Vec<Dimension>,

    /// Z multiplier of the confidence interval half-width.
    #[serde(default)]
    pub confidence_coefficient: Option<f64>,

    #[serde(default)]
    pub timeout_per_plugin_secs: Option<f64>,

    /// Worker threads; 0 means one per CPU.
    #[serde(default)]
    pub jobs: Option<usize>,

    #[serde(default)]
    pub scoring: Option<ScoringConfig>,

    #[serde(default)]
    pub reference: Option<ReferenceConfig>,

    #[serde(default)]
    pub analysis: Option<AnalysisConfig>,

    /// Dimensions backed by external commands.
    #[serde(default)]
    pub external: Vec<ExternalPluginSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Display points per unit of z.
    #[serde(default)]
    pub spread: Option<f64>,
    #[serde(default)]
    pub tie_epsilon: Option<f64>,
    #[serde(default)]
    pub negligible_margin: Option<f64>,
    #[serde(default)]
    pub decisive_margin: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceConfig {
    #[serde(default)]
    pub mode: Option<ReferenceMode>,
    /// Replacement priors, in each dimension's size-corrected units.
    #[serde(default)]
    pub priors: BTreeMap<Dimension, ReferenceDistribution>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Glob patterns excluded from both codebases.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub max_file_bytes: Option<u64>,
    #[serde(default)]
    pub git_window_days: Option<u32>,
}
