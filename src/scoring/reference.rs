use serde::{Deserialize, Serialize};

/// Spread below which a reference is treated as carrying no signal.
const DEGENERATE_STDDEV: f64 = 1e-12;

/// Distribution a dimension's values are standardized against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDistribution {
    pub mean: f64,
    pub stddev: f64,
    #[serde(default = "default_sample_count")]
    pub sample_count: u32,
}

fn default_sample_count() -> u32 {
    1
}

/// Where the reference distribution comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceMode {
    /// Fixed per-dimension prior; reproducible across runs.
    #[default]
    Prior,
    /// Derived from the values in the current batch, anchored by the prior mean.
    Batch,
}

impl std::str::FromStr for ReferenceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prior" => Ok(ReferenceMode::Prior),
            "batch" => Ok(ReferenceMode::Batch),
            other => Err(format!("unknown reference mode '{other}' (expected prior or batch)")),
        }
    }
}

impl std::fmt::Display for ReferenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceMode::Prior => f.write_str("prior"),
            ReferenceMode::Batch => f.write_str("batch"),
        }
    }
}

impl ReferenceDistribution {
    /// A built-in prior, counted as one pseudo-observation.
    pub const fn prior(mean: f64, stddev: f64) -> Self {
        Self {
            mean,
            stddev,
            sample_count: 1,
        }
    }

    /// Mean and population standard deviation of `values`.
    ///
    /// Values are scaled by their largest magnitude first, so finite inputs
    /// near `f64::MAX` still give finite statistics. `None` for an empty or
    /// non-finite population.
    pub fn from_population(values: &[f64]) -> Option<Self> {
        if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let n = values.len() as f64;
        let scale = values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        if scale == 0.0 {
            return Some(Self {
                mean: 0.0,
                stddev: 0.0,
                sample_count: values.len() as u32,
            });
        }
        let mean = values.iter().map(|v| v / scale).sum::<f64>() / n;
        let variance = values
            .iter()
            .map(|v| (v / scale - mean).powi(2))
            .sum::<f64>()
            / n;
        Some(Self {
            mean: mean * scale,
            stddev: variance.sqrt() * scale,
            sample_count: values.len() as u32,
        })
    }

    /// Batch reference: the batch values plus the prior mean as an anchor.
    pub fn from_batch(prior: &ReferenceDistribution, batch: &[f64]) -> Self {
        let population: Vec<f64> = std::iter::once(prior.mean)
            .chain(batch.iter().copied())
            .collect();
        Self::from_population(&population).unwrap_or(*prior)
    }

    pub fn resolve(mode: ReferenceMode, prior: &ReferenceDistribution, batch: &[f64]) -> Self {
        match mode {
            ReferenceMode::Prior => *prior,
            ReferenceMode::Batch => Self::from_batch(prior, batch),
        }
    }

    /// True when the reference cannot discriminate between values.
    pub fn is_degenerate(&self) -> bool {
        self.stddev.is_nan() || self.stddev <= DEGENERATE_STDDEV
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.mean.is_finite() {
            return Err("reference mean must be finite".to_string());
        }
        if !self.stddev.is_finite() || self.stddev < 0.0 {
            return Err("reference stddev must be finite and non-negative".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_stats() {
        let r = ReferenceDistribution::from_population(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])
            .unwrap();
        assert_eq!(r.mean, 5.0);
        assert_eq!(r.stddev, 2.0);
        assert_eq!(r.sample_count, 8);
    }

    #[test]
    fn test_population_near_float_max_stays_finite() {
        let r = ReferenceDistribution::from_population(&[5.0, 1.7e308, 8.5e307]).unwrap();
        assert!(r.mean.is_finite());
        assert!(r.stddev.is_finite());
        assert!(r.validate().is_ok());
        assert!((r.mean / 8.5e307 - 1.0).abs() < 1e-12);
        assert!(!r.is_degenerate());
    }

    #[test]
    fn test_population_rejects_non_finite_values() {
        assert!(ReferenceDistribution::from_population(&[1.0, f64::INFINITY]).is_none());
        assert!(ReferenceDistribution::from_population(&[f64::NAN]).is_none());
        let zeros = ReferenceDistribution::from_population(&[0.0, 0.0]).unwrap();
        assert_eq!((zeros.mean, zeros.stddev), (0.0, 0.0));
    }

    #[test]
    fn test_batch_anchored_by_prior_mean() {
        let prior = ReferenceDistribution::prior(6.0, 1.0);
        let r = ReferenceDistribution::from_batch(&prior, &[3.0, 9.0]);
        assert_eq!(r.mean, 6.0);
        assert_eq!(r.sample_count, 3);
        assert!(r.stddev > 0.0);
    }

    #[test]
    fn test_batch_agreeing_with_prior_is_degenerate() {
        let prior = ReferenceDistribution::prior(5.0, 2.0);
        let r = ReferenceDistribution::resolve(ReferenceMode::Batch, &prior, &[5.0, 5.0]);
        assert!(r.is_degenerate());
    }

    #[test]
    fn test_prior_mode_ignores_batch() {
        let prior = ReferenceDistribution::prior(5.0, 2.0);
        let r = ReferenceDistribution::resolve(ReferenceMode::Prior, &prior, &[100.0, -100.0]);
        assert_eq!(r, prior);
    }

    #[test]
    fn test_validate_rejects_negative_stddev() {
        assert!(ReferenceDistribution::prior(1.0, -0.5).validate().is_err());
        assert!(ReferenceDistribution::prior(f64::NAN, 1.0).validate().is_err());
        assert!(ReferenceDistribution::prior(1.0, 0.0).validate().is_ok());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Batch".parse::<ReferenceMode>(), Ok(ReferenceMode::Batch));
        assert!("median".parse::<ReferenceMode>().is_err());
    }
}
