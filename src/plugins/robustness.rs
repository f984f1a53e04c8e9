use super::scan::{is_test_file, scan, Findings};
use super::{measured_sources, AnalysisOptions, BenchmarkPlugin};
use crate::core::{Dimension, Language, PluginOutcome, Polarity, RawMetric, SizePolicy};
use crate::io::Codebase;
use crate::scoring::ReferenceDistribution;
use once_cell::sync::Lazy;
use regex::Regex;

const SUPPORTED: &[Language] = &[
    Language::Java,
    Language::JavaScript,
    Language::Python,
    Language::Rust,
    Language::TypeScript,
];

static PY_BARE_EXCEPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*except\s*:").expect("valid"));
static PY_BROAD_EXCEPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*except\s*\(?\s*(Exception|BaseException)\b").expect("valid")
});
static RS_UNWRAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(unwrap|expect)\(").expect("valid"));
static JS_EMPTY_CATCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"catch\s*(\([^)]*\))?\s*\{\s*\}").expect("valid"));
static JAVA_BROAD_CATCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"catch\s*\(\s*(final\s+)?(Exception|Throwable|RuntimeException)\s+\w+\s*\)")
        .expect("valid")
});

/// Broad or swallowed error handling per KLOC.
#[derive(Debug, Clone, Copy, Default)]
pub struct RobustnessPlugin;

fn broad_handler(code: &str, language: Language) -> Option<&'static str> {
    match language {
        Language::Python if PY_BARE_EXCEPT.is_match(code) => Some("bare 'except:'"),
        Language::Python if PY_BROAD_EXCEPT.is_match(code) => Some("generic 'except Exception'"),
        Language::Rust if RS_UNWRAP.is_match(code) => Some("unchecked unwrap/expect"),
        Language::JavaScript | Language::TypeScript if JS_EMPTY_CATCH.is_match(code) => {
            Some("empty catch block")
        }
        Language::Java if JAVA_BROAD_CATCH.is_match(code) => Some("catch of a generic exception"),
        Language::Java if JS_EMPTY_CATCH.is_match(code) => Some("empty catch block"),
        _ => None,
    }
}

impl BenchmarkPlugin for RobustnessPlugin {
    fn dimension(&self) -> Dimension {
        Dimension::Robustness
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
        ReferenceDistribution::prior(4.0, 4.0)
    }

    fn supported_languages(&self) -> Option<&[Language]> {
        Some(SUPPORTED)
    }

    fn description(&self) -> &str {
        "broad or swallowed error handlers per KLOC"
    }

    fn analyze(&self, codebase: &Codebase, _options: &AnalysisOptions) -> PluginOutcome {
        let sources = measured_sources(self, codebase)?;
        let mut findings = Findings::default();
        let mut code_lines = 0u64;

        // Test code is allowed to unwrap and swallow.
        for file in sources.into_iter().filter(|f| !is_test_file(&f.path, &f.content)) {
            for line in scan(file).iter().filter(|l| l.is_code()) {
                code_lines += 1;
                if let Some(what) = broad_handler(line.code, file.language) {
                    findings.record(1.0, file, line.number, what);
                }
            }
        }

        let summary = format!(
            "{} broad error handlers in {code_lines} non-test code lines",
            findings.occurrences()
        );
        Ok(
            RawMetric::new(self.dimension(), codebase.id().clone(), findings.total(), code_lines)
                .with_unit("handlers")
                .with_evidence(findings.into_evidence(summary)),
        )
    }
}
