//! Weighted aggregation of per-dimension scores into composite totals.
//!
//! Weights are renormalized over exactly the dimensions that produced a
//! score on both sides, so the composite stays on the 0-10 display scale
//! whatever gets skipped or degraded.

use super::score_normalizer::NormalizedScore;
use crate::core::Dimension;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Per-dimension weight multipliers. Missing dimensions weigh 1.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightConfig {
    weights: BTreeMap<Dimension, f64>,
}

impl WeightConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weight(mut self, dimension: Dimension, weight: f64) -> Self {
        self.weights.insert(dimension, weight);
        self
    }

    pub fn set(&mut self, dimension: Dimension, weight: f64) {
        self.weights.insert(dimension, weight);
    }

    pub fn weight_for(&self, dimension: &Dimension) -> f64 {
        self.weights.get(dimension).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    /// Explicitly configured entries.
    pub fn entries(&self) -> impl Iterator<Item = (&Dimension, f64)> {
        self.weights.iter().map(|(d, w)| (d, *w))
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Overlay `other` on top of `self`; entries in `other` win.
    pub fn merged_with(mut self, other: &WeightConfig) -> Self {
        for (dimension, weight) in other.entries() {
            self.weights.insert(dimension.clone(), weight);
        }
        self
    }

    /// Parse a JSON object such as `{"security": 2.0}`.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let raw: BTreeMap<String, f64> =
            serde_json::from_str(json).map_err(|e| format!("invalid weights JSON: {e}"))?;
        let mut config = Self::new();
        for (name, weight) in raw {
            let dimension: Dimension = name.parse()?;
            config.set(dimension, weight);
        }
        Ok(config)
    }

    /// Every weight must be a finite, strictly positive number.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let errors: Vec<String> = self
            .weights
            .iter()
            .filter(|(_, w)| !(w.is_finite() && **w > 0.0))
            .map(|(d, w)| format!("weight for '{d}' must be a positive number, got {w}"))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    A,
    B,
    Tie,
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Winner::A => f.write_str("A"),
            Winner::B => f.write_str("B"),
            Winner::Tie => f.write_str("tie"),
        }
    }
}

/// Human-readable band for the gap between the two totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginClass {
    Negligible,
    Moderate,
    Decisive,
}

impl std::fmt::Display for MarginClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MarginClass::Negligible => "negligible",
            MarginClass::Moderate => "moderate",
            MarginClass::Decisive => "decisive",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationSettings {
    /// Score differences below this are ties (0-10 scale).
    pub tie_epsilon: f64,
    /// Gaps below this are negligible.
    pub negligible_margin: f64,
    /// Gaps at or above this are decisive.
    pub decisive_margin: f64,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            tie_epsilon: 0.05,
            negligible_margin: 0.5,
            decisive_margin: 1.5,
        }
    }
}

impl AggregationSettings {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if !(self.tie_epsilon.is_finite() && self.tie_epsilon >= 0.0) {
            errors.push("scoring.tie_epsilon must be a non-negative number".to_string());
        }
        if !(self.negligible_margin.is_finite() && self.negligible_margin >= 0.0) {
            errors.push("scoring.negligible_margin must be a non-negative number".to_string());
        }
        if !(self.decisive_margin.is_finite() && self.decisive_margin >= self.negligible_margin) {
            errors.push(
                "scoring.decisive_margin must be at least scoring.negligible_margin".to_string(),
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Both sides' scores for one dimension that is usable for aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDimension {
    pub dimension: Dimension,
    pub a: NormalizedScore,
    pub b: NormalizedScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionVerdict {
    pub dimension: Dimension,
    pub weight: f64,
    /// Weight after renormalization over the scored dimensions.
    pub weight_share: f64,
    pub winner: Winner,
    pub contribution_a: f64,
    pub contribution_b: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub total_a: f64,
    pub total_b: f64,
    pub gap: f64,
    pub overall_winner: Winner,
    pub margin: MarginClass,
    pub per_dimension: Vec<DimensionVerdict>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    settings: AggregationSettings,
}

impl Aggregator {
    pub fn new(settings: AggregationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AggregationSettings {
        &self.settings
    }

    pub fn winner(&self, a: f64, b: f64) -> Winner {
        let diff = a - b;
        if diff.abs() < self.settings.tie_epsilon {
            Winner::Tie
        } else if diff > 0.0 {
            Winner::A
        } else {
            Winner::B
        }
    }

    pub fn classify_margin(&self, gap: f64) -> MarginClass {
        let gap = gap.abs();
        if gap < self.settings.negligible_margin {
            MarginClass::Negligible
        } else if gap < self.settings.decisive_margin {
            MarginClass::Moderate
        } else {
            MarginClass::Decisive
        }
    }

    /// Weighted average of `size_adjusted` per side.
    ///
    /// Returns `None` when there is nothing to aggregate.
    pub fn aggregate(&self, scored: &[ScoredDimension], weights: &WeightConfig) -> Option<Aggregate> {
        if scored.is_empty() {
            return None;
        }
        // Shares are computed on weights relative to the largest, so huge
        // finite weights cannot overflow the sum.
        let max_weight = scored
            .iter()
            .map(|s| weights.weight_for(&s.dimension))
            .fold(0.0f64, f64::max);
        if !(max_weight.is_finite() && max_weight > 0.0) {
            return None;
        }
        let weight_sum: f64 = scored
            .iter()
            .map(|s| weights.weight_for(&s.dimension) / max_weight)
            .sum();

        let per_dimension: Vec<DimensionVerdict> = scored
            .iter()
            .map(|s| {
                let weight = weights.weight_for(&s.dimension);
                let weight_share = weight / max_weight / weight_sum;
                DimensionVerdict {
                    dimension: s.dimension.clone(),
                    weight,
                    weight_share,
                    winner: self.winner(s.a.size_adjusted, s.b.size_adjusted),
                    contribution_a: weight_share * s.a.size_adjusted,
                    contribution_b: weight_share * s.b.size_adjusted,
                }
            })
            .collect();

        let total_a: f64 = per_dimension.iter().map(|v| v.contribution_a).sum();
        let total_b: f64 = per_dimension.iter().map(|v| v.contribution_b).sum();
        let gap = (total_a - total_b).abs();

        Some(Aggregate {
            total_a,
            total_b,
            gap,
            overall_winner: self.winner(total_a, total_b),
            margin: self.classify_margin(gap),
            per_dimension,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CodebaseId;
    use crate::scoring::score_normalizer::Interval;

    fn score(dimension: Dimension, side: &str, size_adjusted: f64) -> NormalizedScore {
        NormalizedScore {
            dimension,
            codebase_id: CodebaseId::new(side),
            raw: size_adjusted,
            corrected: size_adjusted,
            sample_size: 100,
            z: 0.0,
            confidence_interval: Interval::point(0.0),
            size_adjusted,
            display_interval: Interval::point(size_adjusted),
            low_confidence: false,
            no_signal: false,
        }
    }

    fn scored(dimension: Dimension, a: f64, b: f64) -> ScoredDimension {
        ScoredDimension {
            a: score(dimension.clone(), "a", a),
            b: score(dimension.clone(), "b", b),
            dimension,
        }
    }

    #[test]
    fn test_identical_scores_tie_negligibly() {
        let rows = vec![
            scored(Dimension::Security, 6.0, 6.0),
            scored(Dimension::Readability, 3.0, 3.0),
        ];
        let agg = Aggregator::default().aggregate(&rows, &WeightConfig::new()).unwrap();
        assert_eq!(agg.total_a, agg.total_b);
        assert_eq!(agg.overall_winner, Winner::Tie);
        assert_eq!(agg.margin, MarginClass::Negligible);
        assert!(agg.per_dimension.iter().all(|v| v.winner == Winner::Tie));
    }

    #[test]
    fn test_total_stays_on_display_scale() {
        let rows = vec![scored(Dimension::Security, 10.0, 0.0)];
        let weights = WeightConfig::new().with_weight(Dimension::Security, 7.5);
        let agg = Aggregator::default().aggregate(&rows, &weights).unwrap();
        assert_eq!(agg.total_a, 10.0);
        assert_eq!(agg.total_b, 0.0);
        assert_eq!(agg.overall_winner, Winner::A);
        assert_eq!(agg.margin, MarginClass::Decisive);
    }

    #[test]
    fn test_double_weight_doubles_share() {
        let rows: Vec<_> = Dimension::BUILT_IN
            .iter()
            .map(|d| scored(d.clone(), 5.0, 5.0))
            .collect();
        let weights = WeightConfig::new().with_weight(Dimension::Security, 2.0);
        let agg = Aggregator::default().aggregate(&rows, &weights).unwrap();
        let share = |d: &Dimension| {
            agg.per_dimension
                .iter()
                .find(|v| &v.dimension == d)
                .map(|v| v.weight_share)
                .unwrap()
        };
        assert!((share(&Dimension::Security) - 2.0 / 11.0).abs() < 1e-12);
        assert!((share(&Dimension::Security) - 2.0 * share(&Dimension::Readability)).abs() < 1e-12);
    }

    #[test]
    fn test_huge_weights_do_not_overflow() {
        let rows = vec![
            scored(Dimension::Custom("alpha".to_string()), 8.0, 2.0),
            scored(Dimension::Custom("beta".to_string()), 4.0, 6.0),
        ];
        let weights = WeightConfig::from_json(r#"{"alpha": 1e308, "beta": 1e308}"#).unwrap();
        assert!(weights.validate().is_ok());
        let agg = Aggregator::default().aggregate(&rows, &weights).unwrap();
        assert!(agg.per_dimension.iter().all(|v| v.weight_share == 0.5));
        assert_eq!(agg.total_a, 6.0);
        assert_eq!(agg.total_b, 4.0);
        assert_eq!(agg.overall_winner, Winner::A);
    }

    #[test]
    fn test_tiny_weights_keep_their_ratio() {
        let rows = vec![
            scored(Dimension::Security, 9.0, 1.0),
            scored(Dimension::Readability, 1.0, 9.0),
        ];
        let weights = WeightConfig::new()
            .with_weight(Dimension::Security, 3e-300)
            .with_weight(Dimension::Readability, 1e-300);
        let agg = Aggregator::default().aggregate(&rows, &weights).unwrap();
        assert!((agg.total_a - 7.0).abs() < 1e-12);
        assert!((agg.total_b - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_tie_epsilon_is_not_broken() {
        let agg = Aggregator::default();
        assert_eq!(agg.winner(5.0, 5.04), Winner::Tie);
        assert_eq!(agg.winner(5.0, 5.06), Winner::B);
    }

    #[test]
    fn test_margin_bands() {
        let agg = Aggregator::default();
        assert_eq!(agg.classify_margin(0.2), MarginClass::Negligible);
        assert_eq!(agg.classify_margin(1.0), MarginClass::Moderate);
        assert_eq!(agg.classify_margin(-2.0), MarginClass::Decisive);
    }

    #[test]
    fn test_empty_input_has_no_aggregate() {
        assert!(Aggregator::default().aggregate(&[], &WeightConfig::new()).is_none());
    }

    #[test]
    fn test_weights_from_json() {
        let weights = WeightConfig::from_json(r#"{"Security": 2.0, "git-health": 0.5}"#).unwrap();
        assert_eq!(weights.weight_for(&Dimension::Security), 2.0);
        assert_eq!(weights.weight_for(&Dimension::GitHealth), 0.5);
        assert_eq!(weights.weight_for(&Dimension::Readability), 1.0);
        assert!(WeightConfig::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_weights() {
        let weights = WeightConfig::new()
            .with_weight(Dimension::Security, 0.0)
            .with_weight(Dimension::Readability, -1.0)
            .with_weight(Dimension::Performance, 2.0);
        assert_eq!(weights.validate().unwrap_err().len(), 2);
    }
}
