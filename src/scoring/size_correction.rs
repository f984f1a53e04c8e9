//! Size-bias correction.
//!
//! Each dimension declares a [`SizePolicy`]; this stage applies it uniformly
//! so no plugin handles codebase size on its own. Rate dimensions are divided
//! by their sample size before standardization, absolute dimensions pass
//! through untouched. The `size_corrected` flag makes the step idempotent.

use crate::core::{AnalysisFailure, RawMetric, SizePolicy};
use serde::{Deserialize, Serialize};

/// Intermediate value between a raw metric and its z-score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringInput {
    pub value: f64,
    pub sample_size: u64,
    pub policy: SizePolicy,
    pub size_corrected: bool,
}

impl ScoringInput {
    pub fn from_metric(metric: &RawMetric, policy: SizePolicy) -> Self {
        Self {
            value: metric.value(),
            sample_size: metric.sample_size(),
            policy,
            size_corrected: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SizeBiasCorrector;

impl SizeBiasCorrector {
    pub fn new() -> Self {
        Self
    }

    /// Apply the declared size policy once.
    ///
    /// A rate dimension measured over zero units has no defined rate and is
    /// reported as insufficient data rather than scored.
    pub fn correct(&self, input: ScoringInput) -> Result<ScoringInput, AnalysisFailure> {
        if input.size_corrected {
            return Ok(input);
        }
        let value = match input.policy {
            SizePolicy::Absolute => input.value,
            SizePolicy::Rate { per_units } => {
                if input.sample_size == 0 {
                    return Err(AnalysisFailure::insufficient_data(
                        "rate metric measured over zero units",
                    ));
                }
                input.value * per_units / input.sample_size as f64
            }
        };
        if !value.is_finite() {
            return Err(AnalysisFailure::insufficient_data(
                "size-corrected value is not finite",
            ));
        }
        Ok(ScoringInput {
            value,
            size_corrected: true,
            ..input
        })
    }
}
