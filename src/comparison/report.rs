//! The comparison report: unit of persistence and of export.

use crate::core::{AnalysisFailure, CodebaseId, Dimension, Polarity};
use crate::scoring::{MarginClass, NormalizedScore, ReferenceMode, WeightConfig, Winner};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bumped whenever the exported layout changes incompatibly.
pub const SCHEMA_VERSION: u32 = 1;

/// Settings that shaped the scores, so an exported report stands alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    pub weights: WeightConfig,
    pub confidence_coefficient: f64,
    pub spread: f64,
    pub tie_epsilon: f64,
    pub negligible_margin: f64,
    pub decisive_margin: f64,
    pub reference_mode: ReferenceMode,
    pub timeout_per_plugin_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DimensionOutcome {
    Scored {
        a: NormalizedScore,
        b: NormalizedScore,
        winner: Winner,
        /// `a.size_adjusted - b.size_adjusted`.
        gap: f64,
    },
    /// At least one side is populated.
    Unavailable {
        reason_a: Option<AnalysisFailure>,
        reason_b: Option<AnalysisFailure>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionRow {
    pub dimension: Dimension,
    pub polarity: Polarity,
    pub weight: f64,
    /// Share of the composite after renormalization; 0 when unavailable.
    pub weight_share: f64,
    pub outcome: DimensionOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence_a: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence_b: Vec<String>,
}

impl DimensionRow {
    pub fn is_scored(&self) -> bool {
        matches!(self.outcome, DimensionOutcome::Scored { .. })
    }

    pub fn winner(&self) -> Option<Winner> {
        match &self.outcome {
            DimensionOutcome::Scored { winner, .. } => Some(*winner),
            DimensionOutcome::Unavailable { .. } => None,
        }
    }

    /// Display scores `(a, b)` when scored.
    pub fn scores(&self) -> Option<(f64, f64)> {
        match &self.outcome {
            DimensionOutcome::Scored { a, b, .. } => Some((a.size_adjusted, b.size_adjusted)),
            DimensionOutcome::Unavailable { .. } => None,
        }
    }

    /// Short reason text for an unavailable row, e.g. `A: timeout; B: ok`.
    pub fn unavailable_reason(&self) -> Option<String> {
        let DimensionOutcome::Unavailable { reason_a, reason_b } = &self.outcome else {
            return None;
        };
        let code = |r: &AnalysisFailure| r.reason_code();
        if reason_a.as_ref().map(code) == reason_b.as_ref().map(code) {
            return reason_a.as_ref().map(|r| r.reason_code().to_string());
        }
        let side = |r: &Option<AnalysisFailure>| {
            r.as_ref()
                .map(|f| f.reason_code().to_string())
                .unwrap_or_else(|| "ok".to_string())
        };
        Some(format!("A: {}; B: {}", side(reason_a), side(reason_b)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub schema_version: u32,
    pub timestamp: DateTime<Utc>,
    pub codebase_a_id: CodebaseId,
    pub codebase_b_id: CodebaseId,
    pub codebase_a_label: String,
    pub codebase_b_label: String,
    /// Every requested dimension, ordered by name.
    pub per_dimension: Vec<DimensionRow>,
    pub total_a: f64,
    pub total_b: f64,
    /// `|total_a - total_b|`, always reported beside the margin band.
    pub gap: f64,
    pub overall_winner: Winner,
    pub margin_classification: MarginClass,
    #[serde(default)]
    pub skipped: Vec<Dimension>,
    pub settings: SettingsSnapshot,
}

impl ComparisonReport {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn row(&self, dimension: &Dimension) -> Option<&DimensionRow> {
        self.per_dimension.iter().find(|r| &r.dimension == dimension)
    }

    pub fn scored_rows(&self) -> impl Iterator<Item = &DimensionRow> {
        self.per_dimension.iter().filter(|r| r.is_scored())
    }

    pub fn unavailable_dimensions(&self) -> Vec<&Dimension> {
        self.per_dimension
            .iter()
            .filter(|r| !r.is_scored())
            .map(|r| &r.dimension)
            .collect()
    }

    /// One-line verdict, e.g. `A wins by 1.20 (moderate): 6.40 vs 5.20`.
    pub fn summary_line(&self) -> String {
        let verdict = match self.overall_winner {
            Winner::A => format!("{} wins", self.codebase_a_label),
            Winner::B => format!("{} wins", self.codebase_b_label),
            Winner::Tie => "tie".to_string(),
        };
        format!(
            "{verdict} by {:.2} ({}): {:.2} vs {:.2}",
            self.gap, self.margin_classification, self.total_a, self.total_b
        )
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::core::FailureReason;
    use crate::scoring::Interval;

    fn score(dimension: &Dimension, id: &str, z: f64) -> NormalizedScore {
        NormalizedScore {
            dimension: dimension.clone(),
            codebase_id: CodebaseId::new(id),
            raw: 12.345678901234567,
            corrected: 0.1 + 0.2,
            sample_size: 321,
            z,
            confidence_interval: Interval {
                low: z - 0.1093,
                high: z + 0.1093,
            },
            size_adjusted: 5.0 + 1.5 * z,
            display_interval: Interval {
                low: 5.0 + 1.5 * (z - 0.1093),
                high: 5.0 + 1.5 * (z + 0.1093),
            },
            low_confidence: false,
            no_signal: false,
        }
    }

    pub fn report() -> ComparisonReport {
        let security = Dimension::Security;
        ComparisonReport {
            schema_version: SCHEMA_VERSION,
            timestamp: "2026-03-01T12:34:56.789123456Z".parse().unwrap(),
            codebase_a_id: CodebaseId::new("/src/alpha"),
            codebase_b_id: CodebaseId::new("/src/beta"),
            codebase_a_label: "alpha".to_string(),
            codebase_b_label: "beta".to_string(),
            per_dimension: vec![
                DimensionRow {
                    dimension: Dimension::GitHealth,
                    polarity: Polarity::LowerIsBetter,
                    weight: 1.0,
                    weight_share: 0.0,
                    outcome: DimensionOutcome::Unavailable {
                        reason_a: Some(AnalysisFailure::new(
                            FailureReason::NotApplicable,
                            "not a git repository",
                        )),
                        reason_b: None,
                    },
                    evidence_a: vec![],
                    evidence_b: vec!["commits touching sources: 4".to_string()],
                },
                DimensionRow {
                    dimension: security.clone(),
                    polarity: Polarity::LowerIsBetter,
                    weight: 2.0,
                    weight_share: 1.0,
                    outcome: DimensionOutcome::Scored {
                        a: score(&security, "/src/alpha", 2.0 / 3.0),
                        b: score(&security, "/src/beta", -0.7071067811865476),
                        winner: Winner::A,
                        gap: 2.060660171779821,
                    },
                    evidence_a: vec!["2 risky constructs".to_string()],
                    evidence_b: vec![],
                },
            ],
            total_a: 6.0,
            total_b: 3.939339828220179,
            gap: 2.060660171779821,
            overall_winner: Winner::A,
            margin_classification: MarginClass::Decisive,
            skipped: vec![Dimension::Readability],
            settings: SettingsSnapshot {
                weights: WeightConfig::new().with_weight(Dimension::Security, 2.0),
                confidence_coefficient: 1.96,
                spread: 1.5,
                tie_epsilon: 0.05,
                negligible_margin: 0.5,
                decisive_margin: 1.5,
                reference_mode: ReferenceMode::Prior,
                timeout_per_plugin_secs: 120.0,
            },
        }
    }
}
