use super::reference::ReferenceDistribution;
use super::size_correction::ScoringInput;
use crate::core::{AnalysisFailure, CodebaseId, Dimension, Polarity, RawMetric};
use serde::{Deserialize, Serialize};

/// Center of the 0-10 display scale.
pub const DISPLAY_CENTER: f64 = 5.0;
pub const DISPLAY_MAX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizerSettings {
    /// Multiplier of the interval half-width; 1.96 is a nominal 95% interval.
    pub confidence_coefficient: f64,
    /// Display points per unit of z.
    pub spread: f64,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            confidence_coefficient: 1.96,
            spread: 1.5,
        }
    }
}

/// Symmetric interval, in z units or display units depending on the field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub low: f64,
    pub high: f64,
}

impl Interval {
    pub fn point(value: f64) -> Self {
        Self {
            low: value,
            high: value,
        }
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// One codebase's standardized score on one dimension.
///
/// `z` is oriented so that higher is always better, whatever the raw
/// metric's polarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedScore {
    pub dimension: Dimension,
    pub codebase_id: CodebaseId,
    pub raw: f64,
    pub corrected: f64,
    pub sample_size: u64,
    pub z: f64,
    pub confidence_interval: Interval,
    pub size_adjusted: f64,
    pub display_interval: Interval,
    pub low_confidence: bool,
    pub no_signal: bool,
}

/// Maps size-corrected values onto oriented z-scores and the 0-10 scale.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreNormalizer {
    settings: NormalizerSettings,
}

impl ScoreNormalizer {
    pub fn new(settings: NormalizerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &NormalizerSettings {
        &self.settings
    }

    /// Oriented z-score; 0 when the reference has no spread.
    pub fn z_score(&self, value: f64, reference: &ReferenceDistribution, polarity: Polarity) -> f64 {
        if reference.is_degenerate() {
            return 0.0;
        }
        polarity.orientation() * (value - reference.mean) / reference.stddev
    }

    /// Half-width of the interval around z for a given sample size.
    pub fn half_width(&self, sample_size: u64) -> f64 {
        self.settings.confidence_coefficient / (sample_size.max(1) as f64).sqrt()
    }

    pub fn to_display(&self, z: f64) -> f64 {
        (DISPLAY_CENTER + z * self.settings.spread).clamp(0.0, DISPLAY_MAX)
    }

    pub fn normalize(
        &self,
        metric: &RawMetric,
        input: &ScoringInput,
        reference: &ReferenceDistribution,
        polarity: Polarity,
        min_sample_size: u64,
    ) -> NormalizedScore {
        debug_assert!(input.size_corrected, "normalize expects a size-corrected input");

        let no_signal = reference.is_degenerate();
        let z = self.z_score(input.value, reference, polarity);
        let confidence_interval = if no_signal {
            Interval::point(z)
        } else {
            let half = self.half_width(input.sample_size);
            Interval {
                low: z - half,
                high: z + half,
            }
        };

        NormalizedScore {
            dimension: metric.dimension().clone(),
            codebase_id: metric.codebase_id().clone(),
            raw: metric.value(),
            corrected: input.value,
            sample_size: input.sample_size,
            z,
            confidence_interval,
            size_adjusted: self.to_display(z),
            display_interval: Interval {
                low: self.to_display(confidence_interval.low),
                high: self.to_display(confidence_interval.high),
            },
            low_confidence: input.sample_size < min_sample_size,
            no_signal,
        }
    }

    /// [`normalize`](Self::normalize), refusing references or z-scores that
    /// are not finite.
    ///
    /// Such cells are reported as insufficient data so no NaN or infinity
    /// reaches the totals or the exported report.
    pub fn score(
        &self,
        metric: &RawMetric,
        input: &ScoringInput,
        reference: &ReferenceDistribution,
        polarity: Polarity,
        min_sample_size: u64,
    ) -> Result<NormalizedScore, AnalysisFailure> {
        reference.validate().map_err(AnalysisFailure::insufficient_data)?;
        let score = self.normalize(metric, input, reference, polarity, min_sample_size);
        if !(score.z.is_finite()
            && score.confidence_interval.low.is_finite()
            && score.confidence_interval.high.is_finite())
        {
            return Err(AnalysisFailure::insufficient_data(format!(
                "value {} is too far from the reference (mean {}, stddev {}) to score",
                input.value, reference.mean, reference.stddev
            )));
        }
        Ok(score)
    }
}
