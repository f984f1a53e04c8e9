//! Naming-convention consistency.
//!
//! Declared names are pulled out with per-language patterns and checked
//! against the convention each language expects for that kind of name.

use super::scan::{scan, Findings};
use super::{measured_sources, AnalysisOptions, BenchmarkPlugin};
use crate::core::{
    AnalysisFailure, Dimension, Language, PluginOutcome, Polarity, RawMetric, SizePolicy,
};
use crate::io::Codebase;
use crate::scoring::ReferenceDistribution;
use once_cell::sync::Lazy;
use regex::Regex;

const SUPPORTED: &[Language] = &[
    Language::Go,
    Language::Java,
    Language::JavaScript,
    Language::Python,
    Language::Rust,
    Language::TypeScript,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// `snake_case`
    Snake,
    /// `SCREAMING_SNAKE_CASE`
    UpperSnake,
    /// `PascalCase`
    Pascal,
    /// `camelCase`
    Camel,
    /// Go's mixedCaps: Pascal or camel, no underscores.
    MixedCaps,
}

static SNAKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^_*[a-z][a-z0-9_]*$").expect("valid"));
static UPPER_SNAKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^_*[A-Z][A-Z0-9_]*$").expect("valid"));
static PASCAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^_*[A-Z][a-zA-Z0-9]*$").expect("valid"));
static CAMEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[_$]*[a-z][a-zA-Z0-9]*$").expect("valid"));
static MIXED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9]*$").expect("valid"));

impl Convention {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Convention::Snake => SNAKE.is_match(name),
            Convention::UpperSnake => UPPER_SNAKE.is_match(name),
            Convention::Pascal => PASCAL.is_match(name),
            Convention::Camel => CAMEL.is_match(name),
            Convention::MixedCaps => MIXED.is_match(name),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Convention::Snake => "snake_case",
            Convention::UpperSnake => "SCREAMING_SNAKE_CASE",
            Convention::Pascal => "PascalCase",
            Convention::Camel => "camelCase",
            Convention::MixedCaps => "mixedCaps",
        }
    }
}

/// A declaration pattern whose first capture group is the declared name.
struct Rule {
    kind: &'static str,
    pattern: Regex,
    accepted: &'static [Convention],
}

fn rule(kind: &'static str, pattern: &str, accepted: &'static [Convention]) -> Rule {
    Rule {
        kind,
        pattern: Regex::new(pattern).expect("declaration pattern is valid"),
        accepted,
    }
}

static PYTHON_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    use Convention::*;
    vec![
        rule("class", r"^\s*class\s+(\w+)", &[Pascal]),
        rule("function", r"^\s*(?:async\s+)?def\s+(\w+)", &[Snake]),
        rule("variable", r"^\s*(\w+)\s*(?::[^=]+)?=[^=]", &[Snake, UpperSnake]),
    ]
});

static RUST_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    use Convention::*;
    vec![
        rule("type", r"\b(?:struct|enum|trait|type|union)\s+(\w+)", &[Pascal]),
        rule("function", r"\bfn\s+(\w+)", &[Snake]),
        rule("binding", r"\blet\s+(?:mut\s+)?(\w+)", &[Snake]),
        rule("constant", r"\b(?:const|static)\s+(?:mut\s+)?(\w+)\s*:", &[UpperSnake]),
    ]
});

static JS_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    use Convention::*;
    vec![
        rule("class", r"\bclass\s+(\w+)", &[Pascal]),
        rule("function", r"\bfunction\s*\*?\s+(\w+)", &[Camel, Pascal]),
        rule("variable", r"\b(?:const|let|var)\s+(\w+)\s*=", &[Camel, UpperSnake, Pascal]),
    ]
});

static TS_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    use Convention::*;
    vec![
        rule("type", r"\b(?:class|interface|type|enum)\s+(\w+)", &[Pascal]),
        rule("function", r"\bfunction\s*\*?\s+(\w+)", &[Camel, Pascal]),
        rule("variable", r"\b(?:const|let|var)\s+(\w+)\s*[:=]", &[Camel, UpperSnake, Pascal]),
    ]
});

static GO_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    use Convention::*;
    vec![
        rule("type", r"^\s*type\s+(\w+)", &[MixedCaps]),
        rule("function", r"^\s*func\s+(?:\([^)]*\)\s*)?(\w+)", &[MixedCaps]),
        rule("variable", r"^\s*(\w+)\s*:=", &[MixedCaps]),
    ]
});

static JAVA_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    use Convention::*;
    vec![
        rule("type", r"\b(?:class|interface|enum|record)\s+(\w+)", &[Pascal]),
        rule(
            "method",
            r"^\s*(?:(?:public|private|protected|static|final|abstract|synchronized)\s+)+[\w<>\[\],\s]+?\s+(\w+)\s*\(",
            &[Camel],
        ),
        rule(
            "constant",
            r"\bstatic\s+final\s+[\w<>\[\]]+\s+(\w+)\s*=",
            &[UpperSnake],
        ),
    ]
});

fn rules_for(language: Language) -> &'static [Rule] {
    match language {
        Language::Python => PYTHON_RULES.as_slice(),
        Language::Rust => RUST_RULES.as_slice(),
        Language::JavaScript => JS_RULES.as_slice(),
        Language::TypeScript => TS_RULES.as_slice(),
        Language::Go => GO_RULES.as_slice(),
        Language::Java => JAVA_RULES.as_slice(),
        _ => &[],
    }
}

fn exempt(name: &str, language: Language) -> bool {
    name == "_"
        || (language == Language::Python && name.starts_with("__") && name.ends_with("__"))
        || (language == Language::Rust && name == "self")
}

/// Share of declared names that follow their language's convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyPlugin;

impl BenchmarkPlugin for ConsistencyPlugin {
    fn dimension(&self) -> Dimension {
        Dimension::Consistency
    }

    fn polarity(&self) -> Polarity {
        Polarity::HigherIsBetter
    }

    fn size_policy(&self) -> SizePolicy {
        SizePolicy::Absolute
    }

    fn min_sample_size(&self) -> u64 {
        20
    }

    fn prior(&self) -> ReferenceDistribution {
        ReferenceDistribution::prior(0.9, 0.08)
    }

    fn supported_languages(&self) -> Option<&[Language]> {
        Some(SUPPORTED)
    }

    fn description(&self) -> &str {
        "share of declared names following the language convention"
    }

    fn analyze(&self, codebase: &Codebase, _options: &AnalysisOptions) -> PluginOutcome {
        let sources = measured_sources(self, codebase)?;
        let mut total = 0u64;
        let mut violations = Findings::default();

        for file in sources {
            let rules = rules_for(file.language);
            for line in scan(file).iter().filter(|l| l.is_code()) {
                for rule in rules {
                    let Some(name) = rule.pattern.captures(line.code).and_then(|c| c.get(1)) else {
                        continue;
                    };
                    let name = name.as_str();
                    if exempt(name, file.language) {
                        break;
                    }
                    total += 1;
                    if !rule.accepted.iter().any(|c| c.matches(name)) {
                        let expected: Vec<&str> = rule.accepted.iter().map(Convention::label).collect();
                        violations.record(
                            1.0,
                            file,
                            line.number,
                            &format!("{} '{name}' should be {}", rule.kind, expected.join(" or ")),
                        );
                    }
                    break;
                }
            }
        }

        if total == 0 {
            return Err(AnalysisFailure::insufficient_data("no declared names found"));
        }

        let consistent = total - violations.occurrences();
        let ratio = consistent as f64 / total as f64;
        let summary = format!(
            "{consistent}/{total} names consistent ({:.1}%)",
            ratio * 100.0
        );
        Ok(RawMetric::new(self.dimension(), codebase.id().clone(), ratio, total)
            .with_unit("ratio")
            .with_evidence(violations.into_evidence(summary)))
    }
}
