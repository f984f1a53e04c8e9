//! Effective settings for one comparison run.
//!
//! Built from defaults, then the config file, then command-line overrides.
//! Validation collects every problem before reporting.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use super::core::CodebenchConfig;
use crate::comparison::SettingsSnapshot;
use crate::core::Dimension;
use crate::errors::CompareError;
use crate::io::LoadOptions;
use crate::scoring::{
    AggregationSettings, NormalizerSettings, ReferenceDistribution, ReferenceMode, WeightConfig,
};

pub const DEFAULT_TIMEOUT_SECS: f64 = 120.0;
pub const DEFAULT_GIT_WINDOW_DAYS: u32 = 180;
/// One century; longer windows overflow date arithmetic.
pub const MAX_GIT_WINDOW_DAYS: u32 = 36_500;

#[derive(Debug, Clone, PartialEq)]
pub struct CompareSettings {
    pub weights: WeightConfig,
    pub skip: BTreeSet<Dimension>,
    pub normalizer: NormalizerSettings,
    pub aggregation: AggregationSettings,
    pub reference_mode: ReferenceMode,
    pub prior_overrides: BTreeMap<Dimension, ReferenceDistribution>,
    pub timeout_per_plugin: Duration,
    /// Worker threads; 0 means one per CPU.
    pub jobs: usize,
    pub git_window_days: u32,
    pub load: LoadOptions,
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            weights: WeightConfig::default(),
            skip: BTreeSet::new(),
            normalizer: NormalizerSettings::default(),
            aggregation: AggregationSettings::default(),
            reference_mode: ReferenceMode::default(),
            prior_overrides: BTreeMap::new(),
            timeout_per_plugin: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            jobs: 0,
            git_window_days: DEFAULT_GIT_WINDOW_DAYS,
            load: LoadOptions::default(),
        }
    }
}

/// Values given on the command line. `None` leaves the file value in place.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    /// JSON object of weights, merged over the file's weights.
    pub weights_json: Option<String>,
    /// Added to the file's skip list.
    pub skip: Vec<String>,
    pub confidence_coefficient: Option<f64>,
    pub timeout_secs: Option<f64>,
    pub jobs: Option<usize>,
    pub reference_mode: Option<String>,
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl CompareSettings {
    /// Resolve file values and overrides into validated settings.
    pub fn resolve(
        config: &CodebenchConfig,
        overrides: &SettingsOverrides,
    ) -> Result<Self, CompareError> {
        let mut errors: Vec<String> = Vec::new();
        let mut settings = CompareSettings::default();

        settings.weights = config.weights.clone();
        if let Some(json) = &overrides.weights_json {
            match WeightConfig::from_json(json) {
                Ok(cli) => settings.weights = settings.weights.merged_with(&cli),
                Err(e) => errors.push(e),
            }
        }

        settings.skip = config.skip.iter().cloned().collect();
        for name in overrides.skip.iter().filter(|s| !s.trim().is_empty()) {
            match name.parse::<Dimension>() {
                Ok(dimension) => {
                    settings.skip.insert(dimension);
                }
                Err(e) => errors.push(format!("skip: {e}")),
            }
        }

        if let Some(c) = overrides.confidence_coefficient.or(config.confidence_coefficient) {
            settings.normalizer.confidence_coefficient = c;
        }
        if let Some(scoring) = &config.scoring {
            if let Some(spread) = scoring.spread {
                settings.normalizer.spread = spread;
            }
            if let Some(eps) = scoring.tie_epsilon {
                settings.aggregation.tie_epsilon = eps;
            }
            if let Some(m) = scoring.negligible_margin {
                settings.aggregation.negligible_margin = m;
            }
            if let Some(m) = scoring.decisive_margin {
                settings.aggregation.decisive_margin = m;
            }
        }

        if let Some(reference) = &config.reference {
            if let Some(mode) = reference.mode {
                settings.reference_mode = mode;
            }
            for (dimension, prior) in &reference.priors {
                match prior.validate() {
                    Ok(()) => {
                        settings.prior_overrides.insert(dimension.clone(), *prior);
                    }
                    Err(e) => errors.push(format!("reference.priors.{dimension}: {e}")),
                }
            }
        }
        if let Some(mode) = &overrides.reference_mode {
            match mode.parse::<ReferenceMode>() {
                Ok(mode) => settings.reference_mode = mode,
                Err(e) => errors.push(e),
            }
        }

        let timeout = overrides
            .timeout_secs
            .or(config.timeout_per_plugin_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if positive(timeout) {
            match Duration::try_from_secs_f64(timeout) {
                Ok(limit) => settings.timeout_per_plugin = limit,
                Err(e) => errors.push(format!("timeout_per_plugin_secs {timeout}: {e}")),
            }
        } else {
            errors.push(format!(
                "timeout_per_plugin_secs must be a positive number, got {timeout}"
            ));
        }

        settings.jobs = overrides.jobs.or(config.jobs).unwrap_or(0);

        if let Some(analysis) = &config.analysis {
            settings.load.exclude = analysis.exclude.clone();
            if let Some(max) = analysis.max_file_bytes {
                settings.load.max_file_bytes = max;
            }
            if let Some(days) = analysis.git_window_days {
                if (1..=MAX_GIT_WINDOW_DAYS).contains(&days) {
                    settings.git_window_days = days;
                } else {
                    errors.push(format!(
                        "analysis.git_window_days must be between 1 and {MAX_GIT_WINDOW_DAYS}, got {days}"
                    ));
                }
            }
            for pattern in &analysis.exclude {
                if let Err(e) = glob::Pattern::new(pattern) {
                    errors.push(format!("analysis.exclude: invalid pattern '{pattern}': {e}"));
                }
            }
        }

        for spec in &config.external {
            if let Err(mut spec_errors) = spec.validate() {
                errors.append(&mut spec_errors);
            }
        }

        if let Err(mut e) = settings.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(settings)
        } else {
            Err(CompareError::config_validations(errors))
        }
    }

    /// Checks on the numeric settings themselves.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if let Err(mut e) = self.weights.validate() {
            errors.append(&mut e);
        }
        if !positive(self.normalizer.confidence_coefficient) {
            errors.push(format!(
                "confidence_coefficient must be a positive number, got {}",
                self.normalizer.confidence_coefficient
            ));
        }
        if !positive(self.normalizer.spread) {
            errors.push(format!(
                "scoring.spread must be a positive number, got {}",
                self.normalizer.spread
            ));
        }
        if let Err(mut e) = self.aggregation.validate() {
            errors.append(&mut e);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            weights: self.weights.clone(),
            confidence_coefficient: self.normalizer.confidence_coefficient,
            spread: self.normalizer.spread,
            tie_epsilon: self.aggregation.tie_epsilon,
            negligible_margin: self.aggregation.negligible_margin,
            decisive_margin: self.aggregation.decisive_margin,
            reference_mode: self.reference_mode,
            timeout_per_plugin_secs: self.timeout_per_plugin.as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let settings =
            CompareSettings::resolve(&CodebenchConfig::default(), &SettingsOverrides::default())
                .unwrap();
        assert_eq!(settings, CompareSettings::default());
        assert_eq!(settings.normalizer.confidence_coefficient, 1.96);
        assert_eq!(settings.timeout_per_plugin, Duration::from_secs(120));
    }

    #[test]
    fn test_cli_overrides_file() {
        let config = parse_config(
            "confidence_coefficient = 2.0\nskip = [\"security\"]\n[weights]\nreadability = 3.0\n",
        )
        .unwrap();
        let overrides = SettingsOverrides {
            weights_json: Some(r#"{"Readability": 1.5, "testability": 2}"#.to_string()),
            skip: vec!["git_health".to_string()],
            confidence_coefficient: Some(2.576),
            reference_mode: Some("batch".to_string()),
            ..SettingsOverrides::default()
        };
        let settings = CompareSettings::resolve(&config, &overrides).unwrap();
        assert_eq!(settings.weights.weight_for(&Dimension::Readability), 1.5);
        assert_eq!(settings.weights.weight_for(&Dimension::Testability), 2.0);
        assert_eq!(settings.normalizer.confidence_coefficient, 2.576);
        assert_eq!(settings.reference_mode, ReferenceMode::Batch);
        assert_eq!(
            settings.skip,
            [Dimension::GitHealth, Dimension::Security].into_iter().collect()
        );
    }

    #[test]
    fn test_every_problem_is_reported() {
        let config = parse_config(indoc::indoc! {r#"
            confidence_coefficient = -1.0
            [weights]
            security = 0.0
            [scoring]
            decisive_margin = 0.1
            [analysis]
            git_window_days = 4000000000
        "#})
        .unwrap();
        let overrides = SettingsOverrides {
            timeout_secs: Some(0.0),
            weights_json: Some("not json".to_string()),
            ..SettingsOverrides::default()
        };
        let err = CompareSettings::resolve(&config, &overrides).unwrap_err();
        let message = err.to_string();
        for needle in [
            "invalid weights JSON",
            "timeout_per_plugin_secs",
            "weight for 'security'",
            "confidence_coefficient",
            "decisive_margin",
            "git_window_days",
        ] {
            assert!(message.contains(needle), "missing '{needle}' in {message}");
        }
    }

    #[test]
    fn test_oversized_timeout_is_a_configuration_error() {
        let overrides = SettingsOverrides {
            timeout_secs: Some(1e30),
            ..SettingsOverrides::default()
        };
        let err = CompareSettings::resolve(&CodebenchConfig::default(), &overrides).unwrap_err();
        assert_eq!(err.code(), crate::errors::ErrorCode::CONFIG_INVALID);
        assert!(err.to_string().contains("timeout_per_plugin_secs"), "{err}");

        let largest_ok = SettingsOverrides {
            timeout_secs: Some(86_400.0 * 365.0),
            ..SettingsOverrides::default()
        };
        assert!(CompareSettings::resolve(&CodebenchConfig::default(), &largest_ok).is_ok());
    }

    #[test]
    fn test_git_window_upper_bound() {
        let config = parse_config("[analysis]\ngit_window_days = 36500\n").unwrap();
        let settings =
            CompareSettings::resolve(&config, &SettingsOverrides::default()).unwrap();
        assert_eq!(settings.git_window_days, MAX_GIT_WINDOW_DAYS);

        let config = parse_config("[analysis]\ngit_window_days = 36501\n").unwrap();
        assert!(CompareSettings::resolve(&config, &SettingsOverrides::default()).is_err());
    }

    #[test]
    fn test_snapshot_mirrors_settings() {
        let settings = CompareSettings::default();
        let snapshot = settings.snapshot();
        assert_eq!(snapshot.spread, 1.5);
        assert_eq!(snapshot.timeout_per_plugin_secs, 120.0);
        assert_eq!(snapshot.reference_mode, ReferenceMode::Prior);
    }
}
