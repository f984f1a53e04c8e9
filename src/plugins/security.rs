use super::scan::{scan, Findings};
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

/// A risky construct and how heavily it counts.
struct Risk {
    what: &'static str,
    severity: f64,
    pattern: Regex,
    /// The construct is safe when the line also contains this.
    unless: Option<&'static str>,
}

impl Risk {
    fn unless(mut self, marker: &'static str) -> Self {
        self.unless = Some(marker);
        self
    }

    fn matches(&self, code: &str) -> bool {
        self.pattern.is_match(code) && !self.unless.is_some_and(|m| code.contains(m))
    }
}

fn risk(what: &'static str, severity: f64, pattern: &str) -> Risk {
    Risk {
        what,
        severity,
        pattern: Regex::new(pattern).expect("risk pattern is valid"),
        unless: None,
    }
}

static PYTHON_RISKS: Lazy<Vec<Risk>> = Lazy::new(|| {
    vec![
        risk("eval/exec of dynamic code", 3.0, r"(^|[^.\w])(eval|exec)\s*\("),
        risk("pickle deserialization", 3.0, r"\b(c?pickle|marshal)\.loads?\s*\("),
        risk("shell=True subprocess", 3.0, r"shell\s*=\s*True"),
        risk("os.system call", 2.0, r"\bos\.(system|popen)\s*\("),
        risk("yaml.load without a safe loader", 2.0, r"\byaml\.load\s*\(").unless("SafeLoader"),
        risk("TLS verification disabled", 2.0, r"verify\s*=\s*False"),
    ]
});

static RUST_RISKS: Lazy<Vec<Risk>> = Lazy::new(|| {
    vec![
        risk("unsafe block", 1.0, r"\bunsafe\s*\{"),
        risk("unsafe function or impl", 1.0, r"\bunsafe\s+(fn|impl|trait)\b"),
        risk("transmute", 2.0, r"\bmem::transmute\b|\btransmute\s*::<"),
    ]
});

static JS_RISKS: Lazy<Vec<Risk>> = Lazy::new(|| {
    vec![
        risk("eval of dynamic code", 3.0, r"(^|[^.\w])eval\s*\("),
        risk("Function constructor", 3.0, r"\bnew\s+Function\s*\("),
        risk("innerHTML assignment", 2.0, r"\.(innerHTML|outerHTML)\s*="),
        risk("document.write", 2.0, r"\bdocument\.write(ln)?\s*\("),
        risk("child_process exec", 2.0, r"\b(execSync|exec)\s*\(\s*[`'\x22].*\$\{"),
        risk("dangerouslySetInnerHTML", 2.0, r"dangerouslySetInnerHTML"),
    ]
});

static HARDCODED_SECRET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(password|passwd|pwd|secret|api_?key|access_?token|auth_?token|private_?key)\b\s*[:=]\s*["'][^"'\s]{4,}["']"#,
    )
    .expect("secret pattern is valid")
});

fn risks_for(language: Language) -> &'static [Risk] {
    match language {
        Language::Python => PYTHON_RISKS.as_slice(),
        Language::Rust => RUST_RISKS.as_slice(),
        Language::JavaScript | Language::TypeScript => JS_RISKS.as_slice(),
        _ => &[],
    }
}

/// Severity-weighted risky constructs per KLOC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityPlugin;

impl BenchmarkPlugin for SecurityPlugin {
    fn dimension(&self) -> Dimension {
        Dimension::Security
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
        ReferenceDistribution::prior(2.0, 2.5)
    }

    fn supported_languages(&self) -> Option<&[Language]> {
        Some(SUPPORTED)
    }

    fn description(&self) -> &str {
        "severity-weighted risky constructs per KLOC"
    }

    fn analyze(&self, codebase: &Codebase, _options: &AnalysisOptions) -> PluginOutcome {
        let sources = measured_sources(self, codebase)?;
        let mut findings = Findings::default();
        let mut code_lines = 0u64;

        for file in sources {
            let risks = risks_for(file.language);
            for line in scan(file).iter().filter(|l| l.is_code()) {
                code_lines += 1;
                for risk in risks.iter().filter(|r| r.matches(line.code)) {
                    findings.record(risk.severity, file, line.number, risk.what);
                }
                if HARDCODED_SECRET.is_match(line.code) {
                    findings.record(3.0, file, line.number, "hard-coded credential");
                }
            }
        }

        let summary = format!(
            "{} risky constructs (weighted {:.1}) in {code_lines} code lines",
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
