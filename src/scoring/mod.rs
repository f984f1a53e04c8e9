//! Scoring pipeline: size correction, standardization, aggregation.

pub mod aggregator;
pub mod reference;
pub mod score_normalizer;
pub mod size_correction;

pub use aggregator::{
    Aggregate, AggregationSettings, Aggregator, DimensionVerdict, MarginClass, ScoredDimension,
    WeightConfig, Winner,
};
pub use reference::{ReferenceDistribution, ReferenceMode};
pub use score_normalizer::{Interval, NormalizedScore, NormalizerSettings, ScoreNormalizer};
pub use size_correction::{ScoringInput, SizeBiasCorrector};
