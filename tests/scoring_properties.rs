use codebench::core::{CodebaseId, Dimension, Polarity, RawMetric, SizePolicy};
use codebench::scoring::{
    Aggregator, NormalizedScore, ReferenceDistribution, ScoreNormalizer, ScoredDimension,
    ScoringInput, SizeBiasCorrector, WeightConfig, Winner,
};
use proptest::prelude::*;

const REFERENCE: ReferenceDistribution = ReferenceDistribution::prior(50.0, 10.0);

fn score(dimension: &Dimension, side: &str, raw: f64, polarity: Polarity) -> NormalizedScore {
    let metric = RawMetric::new(dimension.clone(), CodebaseId::new(side), raw, 500);
    let input = SizeBiasCorrector::new()
        .correct(ScoringInput::from_metric(&metric, SizePolicy::Absolute))
        .unwrap();
    ScoreNormalizer::default().normalize(&metric, &input, &REFERENCE, polarity, 10)
}

fn scored(dimension: Dimension, a: f64, b: f64) -> ScoredDimension {
    ScoredDimension {
        a: score(&dimension, "a", a, Polarity::HigherIsBetter),
        b: score(&dimension, "b", b, Polarity::HigherIsBetter),
        dimension,
    }
}

/// Raw values that stay inside the unclamped part of the 0-10 display scale.
fn raw_value() -> impl Strategy<Value = f64> {
    20.0f64..80.0
}

fn dimension_scores() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((raw_value(), raw_value()), Dimension::BUILT_IN.len())
}

proptest! {
    #[test]
    fn prop_higher_is_better_is_monotonic(v in raw_value(), delta in 0.01f64..10.0) {
        let dim = Dimension::Documentation;
        let lower = score(&dim, "a", v, Polarity::HigherIsBetter);
        let higher = score(&dim, "a", v + delta, Polarity::HigherIsBetter);
        prop_assert!(higher.z > lower.z);
        prop_assert!(higher.size_adjusted > lower.size_adjusted);
    }

    #[test]
    fn prop_lower_is_better_inverts(v in raw_value(), delta in 0.01f64..10.0) {
        let dim = Dimension::Security;
        let lower = score(&dim, "a", v, Polarity::LowerIsBetter);
        let higher = score(&dim, "a", v + delta, Polarity::LowerIsBetter);
        prop_assert!(higher.size_adjusted < lower.size_adjusted);
    }

    #[test]
    fn prop_polarity_mirrors_z(v in raw_value()) {
        let dim = Dimension::Readability;
        let up = score(&dim, "a", v, Polarity::HigherIsBetter);
        let down = score(&dim, "a", v, Polarity::LowerIsBetter);
        prop_assert!((up.z + down.z).abs() < 1e-12);
    }

    #[test]
    fn prop_total_invariant_to_uniform_weight_scaling(
        values in dimension_scores(),
        raw_weights in prop::collection::vec(0.1f64..5.0, Dimension::BUILT_IN.len()),
        factor in 0.01f64..100.0,
    ) {
        let scored: Vec<ScoredDimension> = Dimension::BUILT_IN
            .iter()
            .zip(&values)
            .map(|(d, (a, b))| scored(d.clone(), *a, *b))
            .collect();
        let mut weights = WeightConfig::new();
        let mut scaled = WeightConfig::new();
        for (d, w) in Dimension::BUILT_IN.iter().zip(&raw_weights) {
            weights.set(d.clone(), *w);
            scaled.set(d.clone(), w * factor);
        }

        let aggregator = Aggregator::default();
        let base = aggregator.aggregate(&scored, &weights).unwrap();
        let other = aggregator.aggregate(&scored, &scaled).unwrap();
        prop_assert!((base.total_a - other.total_a).abs() < 1e-9);
        prop_assert!((base.total_b - other.total_b).abs() < 1e-9);
        prop_assert_eq!(base.overall_winner, other.overall_winner);
    }

    #[test]
    fn prop_totals_stay_on_display_scale(values in dimension_scores()) {
        let scored: Vec<ScoredDimension> = Dimension::BUILT_IN
            .iter()
            .zip(&values)
            .map(|(d, (a, b))| scored(d.clone(), *a, *b))
            .collect();
        let aggregate = Aggregator::default()
            .aggregate(&scored, &WeightConfig::default())
            .unwrap();
        prop_assert!((0.0..=10.0).contains(&aggregate.total_a));
        prop_assert!((0.0..=10.0).contains(&aggregate.total_b));
        let shares: f64 = aggregate.per_dimension.iter().map(|v| v.weight_share).sum();
        prop_assert!((shares - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prop_skipping_a_split_dimension_changes_totals(
        values in prop::collection::vec(raw_value(), 2..6),
        a in raw_value(),
        b in raw_value(),
    ) {
        let d_a = score(&Dimension::Security, "a", a, Polarity::HigherIsBetter).size_adjusted;
        let d_b = score(&Dimension::Security, "b", b, Polarity::HigherIsBetter).size_adjusted;
        prop_assume!((d_a - d_b).abs() > 1e-6);

        let rest: Vec<ScoredDimension> = values
            .iter()
            .enumerate()
            .map(|(i, x)| scored(Dimension::Custom(format!("extra_{i}")), *x, *x))
            .collect();
        let mut with_security = rest.clone();
        with_security.push(scored(Dimension::Security, a, b));

        let aggregator = Aggregator::default();
        let weights = WeightConfig::default();
        let full = aggregator.aggregate(&with_security, &weights).unwrap();
        let skipped = aggregator.aggregate(&rest, &weights).unwrap();
        let full_gap = full.total_a - full.total_b;
        let skipped_gap = skipped.total_a - skipped.total_b;
        prop_assert_eq!(skipped_gap, 0.0);
        prop_assert!((full_gap - skipped_gap).abs() > 1e-12);
        prop_assert!(full.per_dimension.iter().any(|v| v.dimension == Dimension::Security));
        prop_assert!(skipped.per_dimension.iter().all(|v| v.dimension != Dimension::Security));
    }
}

#[test]
fn test_identical_inputs_tie_everywhere() {
    let scored: Vec<ScoredDimension> = Dimension::BUILT_IN
        .iter()
        .map(|d| scored(d.clone(), 42.0, 42.0))
        .collect();
    let aggregate = Aggregator::default()
        .aggregate(&scored, &WeightConfig::default())
        .unwrap();
    assert_eq!(aggregate.total_a, aggregate.total_b);
    assert_eq!(aggregate.overall_winner, Winner::Tie);
    assert!(aggregate.per_dimension.iter().all(|v| v.winner == Winner::Tie));
    assert_eq!(aggregate.margin.to_string(), "negligible");
}

#[test]
fn test_security_example_gap_is_four_spreads() {
    let reference = ReferenceDistribution::prior(7.0, 1.0);
    let normalizer = ScoreNormalizer::default();
    let metric_a = RawMetric::new(Dimension::Security, CodebaseId::new("a"), 9.0, 1000);
    let metric_b = RawMetric::new(Dimension::Security, CodebaseId::new("b"), 5.0, 1000);
    let corrector = SizeBiasCorrector::new();
    let ia = corrector
        .correct(ScoringInput::from_metric(&metric_a, SizePolicy::Absolute))
        .unwrap();
    let ib = corrector
        .correct(ScoringInput::from_metric(&metric_b, SizePolicy::Absolute))
        .unwrap();
    let a = normalizer.normalize(&metric_a, &ia, &reference, Polarity::HigherIsBetter, 10);
    let b = normalizer.normalize(&metric_b, &ib, &reference, Polarity::HigherIsBetter, 10);

    assert_eq!(a.z, 2.0);
    assert_eq!(b.z, -2.0);
    let spread = normalizer.settings().spread;
    assert!((a.size_adjusted - b.size_adjusted - 4.0 * spread).abs() < 1e-12);
    assert_eq!(Aggregator::default().winner(a.size_adjusted, b.size_adjusted), Winner::A);
}

#[test]
fn test_doubled_weight_doubles_contribution() {
    let scored: Vec<ScoredDimension> = Dimension::BUILT_IN
        .iter()
        .map(|d| scored(d.clone(), 60.0, 40.0))
        .collect();
    let weights = WeightConfig::new().with_weight(Dimension::Security, 2.0);
    let aggregate = Aggregator::default().aggregate(&scored, &weights).unwrap();

    let share = |d: &Dimension| {
        aggregate
            .per_dimension
            .iter()
            .find(|v| &v.dimension == d)
            .map(|v| v.weight_share)
            .unwrap()
    };
    assert!((share(&Dimension::Security) - 2.0 / 11.0).abs() < 1e-12);
    assert!((share(&Dimension::Security) - 2.0 * share(&Dimension::Readability)).abs() < 1e-12);
}
