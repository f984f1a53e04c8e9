use super::scan::is_test_file;
use super::{measured_sources, AnalysisOptions, BenchmarkPlugin};
use crate::core::{Dimension, Language, PluginOutcome, Polarity, RawMetric, SizePolicy};
use crate::io::Codebase;
use crate::scoring::ReferenceDistribution;

/// Share of source files that are tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestabilityPlugin;

impl BenchmarkPlugin for TestabilityPlugin {
    fn dimension(&self) -> Dimension {
        Dimension::Testability
    }

    fn polarity(&self) -> Polarity {
        Polarity::HigherIsBetter
    }

    fn size_policy(&self) -> SizePolicy {
        SizePolicy::Absolute
    }

    fn min_sample_size(&self) -> u64 {
        5
    }

    fn prior(&self) -> ReferenceDistribution {
        ReferenceDistribution::prior(0.2, 0.15)
    }

    fn supported_languages(&self) -> Option<&[Language]> {
        None
    }

    fn description(&self) -> &str {
        "share of source files that are tests"
    }

    fn analyze(&self, codebase: &Codebase, _options: &AnalysisOptions) -> PluginOutcome {
        let sources = measured_sources(self, codebase)?;
        let total = sources.len() as u64;
        let tests: Vec<String> = sources
            .iter()
            .filter(|f| is_test_file(&f.path, &f.content))
            .map(|f| f.path.display().to_string())
            .collect();
        let ratio = tests.len() as f64 / total as f64;

        let mut evidence = vec![format!(
            "{} of {total} source files are tests ({:.1}%)",
            tests.len(),
            ratio * 100.0
        )];
        if tests.is_empty() {
            evidence.push("no test files found (e.g. test_*.py, *_test.go, tests/)".to_string());
        } else {
            evidence.extend(tests.into_iter().take(5).map(|p| format!("test file: {p}")));
        }

        Ok(RawMetric::new(self.dimension(), codebase.id().clone(), ratio, total)
            .with_unit("ratio")
            .with_evidence(evidence))
    }
}
