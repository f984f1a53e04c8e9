//! Scalability readiness score.
//!
//! A 0-10 score built from the presence of async I/O, parallelism and
//! caching, plus the share of functions that are async.

use super::scan::scan;
use super::{measured_sources, AnalysisOptions, BenchmarkPlugin};
use crate::core::{
    AnalysisFailure, Dimension, Language, PluginOutcome, Polarity, RawMetric, SizePolicy,
};
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

const ASYNC_POINTS: f64 = 3.0;
const PARALLEL_POINTS: f64 = 3.0;
const CACHING_POINTS: f64 = 2.0;
const ASYNC_RATIO_POINTS: f64 = 2.0;

struct Signals {
    async_io: Regex,
    parallelism: Regex,
    caching: Regex,
    function: Regex,
    async_function: Regex,
}

fn signals(async_io: &str, parallelism: &str, caching: &str, function: &str, async_function: &str) -> Signals {
    let compile = |p: &str| Regex::new(p).expect("scalability pattern is valid");
    Signals {
        async_io: compile(async_io),
        parallelism: compile(parallelism),
        caching: compile(caching),
        function: compile(function),
        async_function: compile(async_function),
    }
}

static PYTHON: Lazy<Signals> = Lazy::new(|| {
    signals(
        r"^\s*(import|from)\s+(asyncio|aiohttp|trio|anyio)\b",
        r"^\s*(import|from)\s+(multiprocessing|concurrent\.futures|threading)\b",
        r"\b(redis|memcache|pymemcache|cachetools|celery|lru_cache|functools\.cache)\b",
        r"^\s*(async\s+)?def\s+\w+",
        r"^\s*async\s+def\s+\w+",
    )
});

static RUST: Lazy<Signals> = Lazy::new(|| {
    signals(
        r"\b(tokio|async_std|smol)::|#\[tokio::main\]",
        r"\b(rayon|crossbeam)::|\bthread::spawn\b|\bpar_iter\(",
        r"\b(moka|lru|cached|redis|memcache)::",
        r"\bfn\s+\w+",
        r"\basync\s+(unsafe\s+)?fn\s+\w+",
    )
});

static JS: Lazy<Signals> = Lazy::new(|| {
    signals(
        r"\bawait\b|\bPromise\.(all|allSettled|race)\b",
        r"\bworker_threads\b|\bnew\s+Worker\s*\(|\bcluster\.fork\b",
        r"\b(redis|ioredis|memcached|lru-cache|node-cache)\b",
        r"\bfunction\b|=>",
        r"\basync\s+function\b|\basync\s*(\([^)]*\)|\w+)\s*=>",
    )
});

fn signals_for(language: Language) -> Option<&'static Signals> {
    match language {
        Language::Python => Some(&*PYTHON),
        Language::Rust => Some(&*RUST),
        Language::JavaScript | Language::TypeScript => Some(&*JS),
        _ => None,
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Usage {
    async_io: bool,
    parallelism: bool,
    caching: bool,
    functions: u64,
    async_functions: u64,
}

impl Usage {
    fn score(&self) -> f64 {
        let mut score = 0.0;
        if self.async_io {
            score += ASYNC_POINTS;
        }
        if self.parallelism {
            score += PARALLEL_POINTS;
        }
        if self.caching {
            score += CACHING_POINTS;
        }
        if self.functions > 0 {
            score += ASYNC_RATIO_POINTS * self.async_functions as f64 / self.functions as f64;
        }
        score.clamp(0.0, 10.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScalabilityPlugin;

impl BenchmarkPlugin for ScalabilityPlugin {
    fn dimension(&self) -> Dimension {
        Dimension::Scalability
    }

    fn polarity(&self) -> Polarity {
        Polarity::HigherIsBetter
    }

    fn size_policy(&self) -> SizePolicy {
        SizePolicy::Absolute
    }

    fn min_sample_size(&self) -> u64 {
        10
    }

    fn prior(&self) -> ReferenceDistribution {
        ReferenceDistribution::prior(3.0, 2.5)
    }

    fn supported_languages(&self) -> Option<&[Language]> {
        Some(SUPPORTED)
    }

    fn description(&self) -> &str {
        "0-10 score for async I/O, parallelism and caching"
    }

    fn analyze(&self, codebase: &Codebase, _options: &AnalysisOptions) -> PluginOutcome {
        let sources = measured_sources(self, codebase)?;
        let mut usage = Usage::default();

        for file in sources {
            let Some(signals) = signals_for(file.language) else {
                continue;
            };
            for line in scan(file).iter().filter(|l| l.is_code()) {
                let code = line.code;
                usage.async_io |= signals.async_io.is_match(code);
                usage.parallelism |= signals.parallelism.is_match(code);
                usage.caching |= signals.caching.is_match(code);
                if signals.function.is_match(code) {
                    usage.functions += 1;
                    if signals.async_function.is_match(code) {
                        usage.async_functions += 1;
                    }
                }
            }
        }

        if usage.functions == 0 {
            return Err(AnalysisFailure::insufficient_data("no functions found"));
        }

        let mut evidence = vec![format!(
            "{} of {} functions are async",
            usage.async_functions, usage.functions
        )];
        if usage.async_io {
            evidence.push("uses async I/O".to_string());
        }
        if usage.parallelism {
            evidence.push("uses threads or process parallelism".to_string());
        }
        if usage.caching {
            evidence.push("uses a caching or task-queue library".to_string());
        }

        Ok(
            RawMetric::new(self.dimension(), codebase.id().clone(), usage.score(), usage.functions)
                .with_unit("score")
                .with_evidence(evidence),
        )
    }
}
