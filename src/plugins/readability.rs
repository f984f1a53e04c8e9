use super::scan::{indent_width, scan, Findings};
use super::{measured_sources, AnalysisOptions, BenchmarkPlugin};
use crate::core::{Dimension, Language, PluginOutcome, Polarity, RawMetric, SizePolicy};
use crate::io::Codebase;
use crate::scoring::ReferenceDistribution;

pub const LONG_LINE_THRESHOLD: usize = 100;
/// Nesting levels (four columns each) beyond which a line counts as deep.
pub const DEEP_NESTING_THRESHOLD: usize = 4;

/// Overlong or deeply nested code lines per KLOC.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadabilityPlugin;

impl BenchmarkPlugin for ReadabilityPlugin {
    fn dimension(&self) -> Dimension {
        Dimension::Readability
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
        ReferenceDistribution::prior(40.0, 30.0)
    }

    fn supported_languages(&self) -> Option<&[Language]> {
        None
    }

    fn description(&self) -> &str {
        "overlong or deeply nested lines per KLOC"
    }

    fn analyze(&self, codebase: &Codebase, _options: &AnalysisOptions) -> PluginOutcome {
        let sources = measured_sources(self, codebase)?;
        let mut findings = Findings::default();
        let mut code_lines = 0u64;

        for file in sources {
            for line in scan(file).iter().filter(|l| l.is_code()) {
                code_lines += 1;
                let width = line.raw.chars().count();
                let depth = indent_width(line.raw) / 4;
                if width > LONG_LINE_THRESHOLD {
                    findings.record(1.0, file, line.number, &format!("line is {width} characters"));
                } else if depth > DEEP_NESTING_THRESHOLD {
                    findings.record(1.0, file, line.number, &format!("nesting depth {depth}"));
                }
            }
        }

        let summary = format!(
            "{} hard-to-read lines in {} code lines",
            findings.occurrences(),
            code_lines
        );
        Ok(
            RawMetric::new(self.dimension(), codebase.id().clone(), findings.total(), code_lines)
                .with_unit("lines")
                .with_evidence(findings.into_evidence(summary)),
        )
    }
}
