use super::scan::scan;
use super::{measured_sources, AnalysisOptions, BenchmarkPlugin};
use crate::core::{Dimension, Language, PluginOutcome, Polarity, RawMetric, SizePolicy};
use crate::io::Codebase;
use crate::scoring::ReferenceDistribution;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static BRANCH_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(if|elif|for|while|case|catch|except|match)\b|&&|\|\||\?\?")
        .expect("branch keyword pattern is valid")
});

static PYTHON_BOOLEAN_OPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(and|or)\b").expect("boolean operator pattern is valid"));

/// Decision points per KLOC, an approximation of cyclomatic density.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaintainabilityPlugin;

pub(crate) fn branch_points(code: &str, language: Language) -> usize {
    let mut count = BRANCH_KEYWORDS.find_iter(code).count();
    if language == Language::Python {
        count += PYTHON_BOOLEAN_OPS.find_iter(code).count();
    }
    count
}

impl BenchmarkPlugin for MaintainabilityPlugin {
    fn dimension(&self) -> Dimension {
        Dimension::Maintainability
    }

    fn polarity(&self) -> Polarity {
        Polarity::LowerIsBetter
    }

    fn size_policy(&self) -> SizePolicy {
        SizePolicy::PER_KLOC
    }

    fn min_sample_size(&self) -> u64 {
        200
    }

    fn prior(&self) -> ReferenceDistribution {
        ReferenceDistribution::prior(150.0, 60.0)
    }

    fn supported_languages(&self) -> Option<&[Language]> {
        None
    }

    fn description(&self) -> &str {
        "branch points per KLOC"
    }

    fn analyze(&self, codebase: &Codebase, _options: &AnalysisOptions) -> PluginOutcome {
        let sources = measured_sources(self, codebase)?;
        let mut per_file: BTreeMap<String, (usize, u64)> = BTreeMap::new();
        let mut branches = 0usize;
        let mut code_lines = 0u64;

        for file in sources {
            let mut file_branches = 0usize;
            let mut file_lines = 0u64;
            for line in scan(file).iter().filter(|l| l.is_code()) {
                file_lines += 1;
                file_branches += branch_points(line.code, file.language);
            }
            branches += file_branches;
            code_lines += file_lines;
            per_file.insert(file.path.display().to_string(), (file_branches, file_lines));
        }

        let mut densest: Vec<(String, f64)> = per_file
            .into_iter()
            .filter(|(_, (b, lines))| *b > 0 && *lines > 0)
            .map(|(path, (b, lines))| (path, b as f64 * 1000.0 / lines as f64))
            .collect();
        densest.sort_by(|x, y| y.1.total_cmp(&x.1).then_with(|| x.0.cmp(&y.0)));

        let mut evidence = vec![format!(
            "{branches} branch points in {code_lines} code lines"
        )];
        evidence.extend(
            densest
                .into_iter()
                .take(5)
                .map(|(path, density)| format!("{path}: {density:.0} branch points per KLOC")),
        );

        Ok(
            RawMetric::new(self.dimension(), codebase.id().clone(), branches as f64, code_lines)
                .with_unit("branch points")
                .with_evidence(evidence),
        )
    }
}
