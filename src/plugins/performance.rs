use super::scan::{scan, Findings, LoopTracker};
use super::{measured_sources, AnalysisOptions, BenchmarkPlugin};
use crate::core::{Dimension, Language, PluginOutcome, Polarity, RawMetric, SizePolicy};
use crate::io::Codebase;
use crate::scoring::ReferenceDistribution;
use once_cell::sync::Lazy;
use regex::Regex;

const SUPPORTED: &[Language] = &[
    Language::JavaScript,
    Language::Python,
    Language::Rust,
    Language::TypeScript,
];

/// Where an anti-pattern counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Anywhere,
    InLoop,
}

struct AntiPattern {
    what: &'static str,
    weight: f64,
    scope: Scope,
    pattern: Regex,
}

fn anti(what: &'static str, weight: f64, scope: Scope, pattern: &str) -> AntiPattern {
    AntiPattern {
        what,
        weight,
        scope,
        pattern: Regex::new(pattern).expect("anti-pattern is valid"),
    }
}

static PYTHON: Lazy<Vec<AntiPattern>> = Lazy::new(|| {
    vec![
        anti("list.insert(0, ...) shifts the whole list", 1.0, Scope::Anywhere, r"\.insert\(\s*0\s*,"),
        anti("string concatenation in a loop", 0.5, Scope::InLoop, r#"^\s*\w+\s*\+=\s*(f?["']|str\()"#),
        anti("blocking sleep", 1.0, Scope::Anywhere, r"\btime\.sleep\s*\("),
        anti("repeated regex compilation in a loop", 0.5, Scope::InLoop, r"\bre\.compile\s*\("),
    ]
});

static RUST: Lazy<Vec<AntiPattern>> = Lazy::new(|| {
    vec![
        anti("clone in a loop", 0.5, Scope::InLoop, r"\.clone\(\)"),
        anti("Vec::insert(0, ...) shifts the whole vector", 1.0, Scope::Anywhere, r"\.insert\(\s*0\s*,"),
        anti("blocking sleep", 1.0, Scope::Anywhere, r"\bthread::sleep\s*\("),
        anti("regex compilation in a loop", 1.0, Scope::InLoop, r"\bRegex::new\s*\("),
    ]
});

static JS: Lazy<Vec<AntiPattern>> = Lazy::new(|| {
    vec![
        anti("unshift shifts the whole array", 1.0, Scope::InLoop, r"\.unshift\s*\("),
        anti("string concatenation in a loop", 0.5, Scope::InLoop, r#"\w+\s*\+=\s*[`"']"#),
        anti("synchronous I/O", 1.0, Scope::Anywhere, r"\b(readFileSync|writeFileSync|execSync|spawnSync)\s*\("),
        anti("await inside a loop", 0.5, Scope::InLoop, r"\bawait\b"),
    ]
});

fn patterns_for(language: Language) -> &'static [AntiPattern] {
    match language {
        Language::Python => PYTHON.as_slice(),
        Language::Rust => RUST.as_slice(),
        Language::JavaScript | Language::TypeScript => JS.as_slice(),
        _ => &[],
    }
}

/// Weighted static performance anti-patterns per KLOC.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformancePlugin;

impl BenchmarkPlugin for PerformancePlugin {
    fn dimension(&self) -> Dimension {
        Dimension::Performance
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
        ReferenceDistribution::prior(3.0, 3.0)
    }

    fn supported_languages(&self) -> Option<&[Language]> {
        Some(SUPPORTED)
    }

    fn description(&self) -> &str {
        "weighted static anti-patterns per KLOC"
    }

    fn analyze(&self, codebase: &Codebase, _options: &AnalysisOptions) -> PluginOutcome {
        let sources = measured_sources(self, codebase)?;
        let mut findings = Findings::default();
        let mut code_lines = 0u64;

        for file in sources {
            let patterns = patterns_for(file.language);
            let mut loops = LoopTracker::new(file.language);
            for line in scan(file).iter().filter(|l| l.is_code()) {
                code_lines += 1;
                let in_loop = loops.observe(line.code);
                for anti in patterns {
                    if anti.scope == Scope::InLoop && !in_loop {
                        continue;
                    }
                    if anti.pattern.is_match(line.code) {
                        findings.record(anti.weight, file, line.number, anti.what);
                    }
                }
            }
        }

        let summary = format!(
            "{} potential anti-patterns (weighted {:.1}) in {code_lines} code lines",
            findings.occurrences(),
            findings.total()
        );
        Ok(
            RawMetric::new(self.dimension(), codebase.id().clone(), findings.total(), code_lines)
                .with_unit("weighted findings")
                .with_evidence(findings.into_evidence(summary)),
        )
    }
}
