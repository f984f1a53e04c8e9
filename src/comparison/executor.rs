//! Isolated, bounded execution of plugin invocations.
//!
//! Invocations fan out over a per-run rayon pool. Each one runs on its own
//! named thread and reports through a one-slot channel, so the pool worker
//! can give up on it after the timeout or on cancellation. A panicking
//! plugin becomes a `tool_crashed` failure. Results come back in the order
//! the invocations were given, whatever the degree of parallelism.

use super::cancellation::CancellationToken;
use crate::core::{AnalysisFailure, Dimension, FailureReason, PluginOutcome};
use crate::io::Codebase;
use crate::plugins::{AnalysisOptions, BenchmarkPlugin};
use crossbeam::channel::{self, RecvTimeoutError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Longest single wait between cancellation checks.
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Which of the two compared codebases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
        }
    }
}

/// One plugin run against one codebase.
#[derive(Clone)]
pub struct Invocation {
    pub plugin: Arc<dyn BenchmarkPlugin>,
    pub codebase: Arc<Codebase>,
    pub side: Side,
}

#[derive(Debug, Clone)]
pub struct InvocationResult {
    pub dimension: Dimension,
    pub side: Side,
    pub outcome: PluginOutcome,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct Executor {
    jobs: usize,
}

impl Executor {
    /// `jobs == 0` uses one worker per CPU.
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs: jobs.max(1) }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn run(
        &self,
        invocations: Vec<Invocation>,
        options: &AnalysisOptions,
        cancel: &CancellationToken,
    ) -> Vec<InvocationResult> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|i| format!("codebench-worker-{i}"))
            .build();

        match pool {
            Ok(pool) => pool.install(|| {
                invocations
                    .par_iter()
                    .map(|inv| run_isolated(inv, options, cancel))
                    .collect()
            }),
            Err(e) => {
                tracing::warn!(error = %e, "could not build worker pool, running sequentially");
                invocations
                    .iter()
                    .map(|inv| run_isolated(inv, options, cancel))
                    .collect()
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn run_isolated(
    invocation: &Invocation,
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> InvocationResult {
    let dimension = invocation.plugin.dimension();
    let side = invocation.side;
    let start = Instant::now();
    let finish = |outcome: PluginOutcome| InvocationResult {
        dimension: dimension.clone(),
        side,
        outcome,
        elapsed: start.elapsed(),
    };

    if cancel.is_cancelled() {
        return finish(Err(AnalysisFailure::cancelled()));
    }

    let (tx, rx) = channel::bounded::<PluginOutcome>(1);
    let plugin = Arc::clone(&invocation.plugin);
    let codebase = Arc::clone(&invocation.codebase);
    let thread_options = options.clone();
    let spawned = thread::Builder::new()
        .name(format!("codebench-{dimension}-{side}"))
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                plugin.analyze(&codebase, &thread_options)
            }))
            .unwrap_or_else(|payload| {
                Err(AnalysisFailure::new(
                    FailureReason::ToolCrashed,
                    format!("plugin panicked: {}", panic_message(payload.as_ref())),
                ))
            });
            // The receiver is gone when the invocation was abandoned.
            let _ = tx.send(outcome);
        });

    if let Err(e) = spawned {
        return finish(Err(AnalysisFailure::new(
            FailureReason::Io,
            format!("could not start analysis thread: {e}"),
        )));
    }

    let timeout = options.timeout;
    let outcome = loop {
        let remaining = timeout.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            break Err(AnalysisFailure::timeout(timeout));
        }
        match rx.recv_timeout(remaining.min(CANCEL_POLL)) {
            Ok(outcome) => break outcome,
            Err(RecvTimeoutError::Timeout) => {
                if cancel.is_cancelled() {
                    break Err(AnalysisFailure::cancelled());
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                break Err(AnalysisFailure::new(
                    FailureReason::ToolCrashed,
                    "analysis thread exited without a result",
                ));
            }
        }
    };

    match &outcome {
        Ok(metric) => tracing::debug!(
            %dimension,
            %side,
            value = metric.value(),
            sample_size = metric.sample_size(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "plugin finished"
        ),
        Err(failure) => tracing::debug!(
            %dimension,
            %side,
            reason = failure.reason_code(),
            message = %failure.message,
            "plugin failed"
        ),
    }

    finish(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Language, Polarity, RawMetric, SizePolicy};
    use crate::plugins::test_support::codebase;
    use crate::scoring::ReferenceDistribution;

    enum Behavior {
        Value(f64),
        Sleep(Duration),
        Panic,
    }

    struct Fake {
        dimension: Dimension,
        behavior: Behavior,
    }

    impl BenchmarkPlugin for Fake {
        fn dimension(&self) -> Dimension {
            self.dimension.clone()
        }
        fn polarity(&self) -> Polarity {
            Polarity::HigherIsBetter
        }
        fn size_policy(&self) -> SizePolicy {
            SizePolicy::Absolute
        }
        fn min_sample_size(&self) -> u64 {
            0
        }
        fn prior(&self) -> ReferenceDistribution {
            ReferenceDistribution::prior(0.0, 1.0)
        }
        fn supported_languages(&self) -> Option<&[Language]> {
            None
        }
        fn analyze(&self, codebase: &Codebase, _options: &AnalysisOptions) -> PluginOutcome {
            match self.behavior {
                Behavior::Value(v) => Ok(RawMetric::new(
                    self.dimension.clone(),
                    codebase.id().clone(),
                    v,
                    1,
                )),
                Behavior::Sleep(d) => {
                    thread::sleep(d);
                    Ok(RawMetric::new(self.dimension.clone(), codebase.id().clone(), 0.0, 1))
                }
                Behavior::Panic => panic!("boom"),
            }
        }
    }

    fn invocation(name: &str, behavior: Behavior) -> Invocation {
        Invocation {
            plugin: Arc::new(Fake {
                dimension: name.parse().unwrap(),
                behavior,
            }),
            codebase: Arc::new(codebase(&[("a.py", "x = 1\n")])),
            side: Side::A,
        }
    }

    fn options(timeout: Duration) -> AnalysisOptions {
        AnalysisOptions {
            timeout,
            ..AnalysisOptions::default()
        }
    }

    #[test]
    fn test_results_keep_input_order() {
        let invs: Vec<_> = (0..8)
            .map(|i| invocation(&format!("d{i}"), Behavior::Value(i as f64)))
            .collect();
        let results = Executor::new(4).run(invs, &options(Duration::from_secs(5)), &CancellationToken::new());
        let values: Vec<f64> = results
            .iter()
            .map(|r| r.outcome.as_ref().unwrap().value())
            .collect();
        assert_eq!(values, (0..8).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_panic_becomes_tool_crashed() {
        let results = Executor::new(1).run(
            vec![invocation("x", Behavior::Panic), invocation("y", Behavior::Value(1.0))],
            &options(Duration::from_secs(5)),
            &CancellationToken::new(),
        );
        let err = results[0].outcome.as_ref().unwrap_err();
        assert_eq!(err.reason_code(), "tool_crashed");
        assert!(err.message.contains("boom"));
        assert!(results[1].outcome.is_ok());
    }

    #[test]
    fn test_slow_plugin_times_out_alone() {
        let results = Executor::new(2).run(
            vec![
                invocation("slow", Behavior::Sleep(Duration::from_secs(3))),
                invocation("fast", Behavior::Value(2.0)),
            ],
            &options(Duration::from_millis(100)),
            &CancellationToken::new(),
        );
        assert_eq!(results[0].outcome.as_ref().unwrap_err().reason_code(), "timeout");
        assert!(results[0].elapsed < Duration::from_secs(2));
        assert_eq!(results[1].outcome.as_ref().unwrap().value(), 2.0);
    }

    #[test]
    fn test_cancelled_run_schedules_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let results = Executor::new(2).run(
            vec![invocation("a", Behavior::Value(1.0))],
            &options(Duration::from_secs(5)),
            &cancel,
        );
        assert_eq!(results[0].outcome.as_ref().unwrap_err().reason_code(), "cancelled");
    }
}
