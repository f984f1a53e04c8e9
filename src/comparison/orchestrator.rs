//! Drives one comparison from two paths to a finished report.
//!
//! Initialized -> PluginsResolved -> Running -> Aggregating -> Completed,
//! with Failed reachable from every live state. Plugin failures degrade a
//! single dimension; only configuration problems, cancellation and a total
//! lack of signal fail the run.

use super::cancellation::CancellationToken;
use super::executor::{Executor, Invocation, InvocationResult, Side};
use super::report::{ComparisonReport, DimensionOutcome, DimensionRow, SCHEMA_VERSION};
use super::state::{RunState, RunTracker};
use crate::config::CompareSettings;
use crate::core::{AnalysisFailure, Dimension, FailureReason, LanguageSet, PluginOutcome, RawMetric};
use crate::errors::CompareError;
use crate::io::Codebase;
use crate::plugins::{AnalysisOptions, BenchmarkPlugin, PluginRegistry};
use crate::scoring::{
    Aggregator, ReferenceDistribution, ScoreNormalizer, ScoredDimension, ScoringInput,
    SizeBiasCorrector,
};
use crate::store::{ResultStore, RunId};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// A finished run: the report, plus its store id when persisting succeeded.
#[derive(Debug, Clone)]
pub struct CompletedRun {
    pub report: ComparisonReport,
    pub run_id: Option<RunId>,
    pub states: Vec<RunState>,
}

pub struct Orchestrator {
    registry: PluginRegistry,
    settings: CompareSettings,
    store: Arc<dyn ResultStore>,
}

/// Both sides' outcomes for one active dimension.
struct Collected {
    plugin: Arc<dyn BenchmarkPlugin>,
    a: Option<PluginOutcome>,
    b: Option<PluginOutcome>,
}

/// Per-dimension state between scoring and report assembly.
enum Cell {
    Scored(ScoredDimension),
    Unavailable {
        reason_a: Option<AnalysisFailure>,
        reason_b: Option<AnalysisFailure>,
    },
}

struct Assessed {
    dimension: Dimension,
    plugin: Arc<dyn BenchmarkPlugin>,
    cell: Cell,
    evidence_a: Vec<String>,
    evidence_b: Vec<String>,
}

fn evidence_of(outcome: &Option<PluginOutcome>) -> Vec<String> {
    match outcome {
        Some(Ok(metric)) => metric.evidence().to_vec(),
        _ => Vec::new(),
    }
}

fn outcome_or_missing(outcome: Option<PluginOutcome>) -> Result<RawMetric, AnalysisFailure> {
    outcome.unwrap_or_else(|| {
        Err(AnalysisFailure::new(
            FailureReason::Cancelled,
            "invocation never ran",
        ))
    })
}

impl Orchestrator {
    pub fn new(
        registry: PluginRegistry,
        settings: CompareSettings,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            registry,
            settings,
            store,
        }
    }

    pub fn settings(&self) -> &CompareSettings {
        &self.settings
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn compare(&self, a: &Path, b: &Path) -> Result<CompletedRun, CompareError> {
        self.compare_with_cancellation(a, b, &CancellationToken::new())
    }

    pub fn compare_with_cancellation(
        &self,
        a: &Path,
        b: &Path,
        cancel: &CancellationToken,
    ) -> Result<CompletedRun, CompareError> {
        let mut tracker = RunTracker::new();
        let loaded = Codebase::load(a, &self.settings.load)
            .and_then(|ca| Codebase::load(b, &self.settings.load).map(|cb| (ca, cb)));
        match loaded {
            Ok((ca, cb)) => self.run(tracker, ca, cb, cancel),
            Err(e) => {
                tracker.advance(RunState::Failed);
                Err(e)
            }
        }
    }

    /// Compare two already-loaded codebases.
    pub fn compare_codebases(
        &self,
        a: Codebase,
        b: Codebase,
        cancel: &CancellationToken,
    ) -> Result<CompletedRun, CompareError> {
        self.run(RunTracker::new(), a, b, cancel)
    }

    fn run(
        &self,
        mut tracker: RunTracker,
        a: Codebase,
        b: Codebase,
        cancel: &CancellationToken,
    ) -> Result<CompletedRun, CompareError> {
        let fail = |tracker: &mut RunTracker, err: CompareError| {
            tracker.advance(RunState::Failed);
            Err(err)
        };

        if let Err(errors) = self.settings.validate() {
            return fail(&mut tracker, CompareError::config_validations(errors));
        }
        for codebase in [&a, &b] {
            if codebase.total_files() == 0 {
                return fail(&mut tracker, CompareError::empty_codebase(codebase.root()));
            }
        }

        let started = Utc::now();
        tracing::info!(a = %a.id(), b = %b.id(), "starting comparison");

        let languages: LanguageSet = a.languages().union(b.languages()).copied().collect();
        let resolution = self.registry.resolve(&self.settings.skip, &languages);
        if resolution.active.is_empty() {
            return fail(&mut tracker, CompareError::no_plugins());
        }
        tracker.advance(RunState::PluginsResolved);

        if cancel.is_cancelled() {
            return fail(&mut tracker, CompareError::Cancelled);
        }
        tracker.advance(RunState::Running);

        let a = Arc::new(a);
        let b = Arc::new(b);
        let invocations: Vec<Invocation> = resolution
            .active
            .iter()
            .flat_map(|plugin| {
                [(Side::A, &a), (Side::B, &b)].map(|(side, codebase)| Invocation {
                    plugin: Arc::clone(plugin),
                    codebase: Arc::clone(codebase),
                    side,
                })
            })
            .collect();
        let options = AnalysisOptions {
            timeout: self.settings.timeout_per_plugin,
            git_window_days: self.settings.git_window_days,
            reference_time: started,
        };
        let results = Executor::new(self.settings.jobs).run(invocations, &options, cancel);

        if cancel.is_cancelled() {
            return fail(&mut tracker, CompareError::Cancelled);
        }
        tracker.advance(RunState::Aggregating);

        let collected = collect(&resolution.active, results);
        let mut assessed: Vec<Assessed> = collected
            .into_iter()
            .map(|(dimension, c)| self.assess(dimension, c))
            .collect();
        for dimension in &resolution.unsupported {
            if let Some(plugin) = self.registry.get(dimension) {
                let reason = AnalysisFailure::unsupported_language(format!(
                    "neither codebase contains a language {dimension} supports"
                ));
                assessed.push(Assessed {
                    dimension: dimension.clone(),
                    plugin: Arc::clone(plugin),
                    cell: Cell::Unavailable {
                        reason_a: Some(reason.clone()),
                        reason_b: Some(reason),
                    },
                    evidence_a: Vec::new(),
                    evidence_b: Vec::new(),
                });
            }
        }
        assessed.sort_by(|x, y| x.dimension.cmp(&y.dimension));

        let scored: Vec<ScoredDimension> = assessed
            .iter()
            .filter_map(|d| match &d.cell {
                Cell::Scored(s) => Some(s.clone()),
                Cell::Unavailable { .. } => None,
            })
            .collect();
        let aggregator = Aggregator::new(self.settings.aggregation);
        let Some(aggregate) = aggregator.aggregate(&scored, &self.settings.weights) else {
            let unavailable = assessed.iter().map(|d| d.dimension.clone()).collect();
            return fail(&mut tracker, CompareError::NoUsableSignal { unavailable });
        };

        let verdicts: BTreeMap<&Dimension, _> = aggregate
            .per_dimension
            .iter()
            .map(|v| (&v.dimension, v))
            .collect();
        let per_dimension: Vec<DimensionRow> = assessed
            .into_iter()
            .map(|d| {
                let weight = self.settings.weights.weight_for(&d.dimension);
                let (weight_share, outcome) = match d.cell {
                    Cell::Scored(s) => {
                        let verdict = verdicts.get(&d.dimension);
                        let share = verdict.map_or(0.0, |v| v.weight_share);
                        let winner = verdict
                            .map(|v| v.winner)
                            .unwrap_or_else(|| aggregator.winner(s.a.size_adjusted, s.b.size_adjusted));
                        let gap = s.a.size_adjusted - s.b.size_adjusted;
                        (
                            share,
                            DimensionOutcome::Scored {
                                a: s.a,
                                b: s.b,
                                winner,
                                gap,
                            },
                        )
                    }
                    Cell::Unavailable { reason_a, reason_b } => {
                        tracing::warn!(
                            dimension = %d.dimension,
                            a = reason_a.as_ref().map(AnalysisFailure::reason_code),
                            b = reason_b.as_ref().map(AnalysisFailure::reason_code),
                            "dimension unavailable"
                        );
                        (0.0, DimensionOutcome::Unavailable { reason_a, reason_b })
                    }
                };
                DimensionRow {
                    polarity: d.plugin.polarity(),
                    dimension: d.dimension,
                    weight,
                    weight_share,
                    outcome,
                    evidence_a: d.evidence_a,
                    evidence_b: d.evidence_b,
                }
            })
            .collect();

        let report = ComparisonReport {
            schema_version: SCHEMA_VERSION,
            timestamp: started,
            codebase_a_id: a.id().clone(),
            codebase_b_id: b.id().clone(),
            codebase_a_label: a.label().to_string(),
            codebase_b_label: b.label().to_string(),
            per_dimension,
            total_a: aggregate.total_a,
            total_b: aggregate.total_b,
            gap: aggregate.gap,
            overall_winner: aggregate.overall_winner,
            margin_classification: aggregate.margin,
            skipped: resolution.skipped,
            settings: self.settings.snapshot(),
        };
        tracker.advance(RunState::Completed);
        tracing::info!(summary = %report.summary_line(), "comparison completed");

        let run_id = match self.store.save(&report) {
            Ok(id) => {
                tracing::debug!(run_id = %id, "report saved");
                Some(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to save report; returning it unsaved");
                None
            }
        };

        Ok(CompletedRun {
            report,
            run_id,
            states: tracker.history().to_vec(),
        })
    }

    /// Size-correct and standardize one dimension, or explain why not.
    fn assess(&self, dimension: Dimension, collected: Collected) -> Assessed {
        let evidence_a = evidence_of(&collected.a);
        let evidence_b = evidence_of(&collected.b);
        let plugin = collected.plugin;
        let unavailable = |reason_a, reason_b| Cell::Unavailable { reason_a, reason_b };

        let cell = match (outcome_or_missing(collected.a), outcome_or_missing(collected.b)) {
            (Ok(ma), Ok(mb)) => {
                let corrector = SizeBiasCorrector::new();
                let policy = plugin.size_policy();
                match (
                    corrector.correct(ScoringInput::from_metric(&ma, policy)),
                    corrector.correct(ScoringInput::from_metric(&mb, policy)),
                ) {
                    (Ok(ia), Ok(ib)) => {
                        let prior = self
                            .settings
                            .prior_overrides
                            .get(&dimension)
                            .copied()
                            .unwrap_or_else(|| plugin.prior());
                        let reference = ReferenceDistribution::resolve(
                            self.settings.reference_mode,
                            &prior,
                            &[ia.value, ib.value],
                        );
                        let normalizer = ScoreNormalizer::new(self.settings.normalizer);
                        let polarity = plugin.polarity();
                        let min = plugin.min_sample_size();
                        match (
                            normalizer.score(&ma, &ia, &reference, polarity, min),
                            normalizer.score(&mb, &ib, &reference, polarity, min),
                        ) {
                            (Ok(sa), Ok(sb)) => {
                                if sa.no_signal {
                                    tracing::debug!(%dimension, "reference has no spread; scoring neutral");
                                }
                                Cell::Scored(ScoredDimension {
                                    dimension: dimension.clone(),
                                    a: sa,
                                    b: sb,
                                })
                            }
                            (ra, rb) => {
                                tracing::warn!(%dimension, "values could not be standardized");
                                unavailable(ra.err(), rb.err())
                            }
                        }
                    }
                    (ra, rb) => unavailable(ra.err(), rb.err()),
                }
            }
            (ra, rb) => unavailable(ra.err(), rb.err()),
        };

        Assessed {
            dimension,
            plugin,
            cell,
            evidence_a,
            evidence_b,
        }
    }
}

/// Group invocation results by dimension, in resolution order.
fn collect(
    active: &[Arc<dyn BenchmarkPlugin>],
    results: Vec<InvocationResult>,
) -> Vec<(Dimension, Collected)> {
    let mut by_dimension: BTreeMap<Dimension, Collected> = active
        .iter()
        .map(|p| {
            (
                p.dimension(),
                Collected {
                    plugin: Arc::clone(p),
                    a: None,
                    b: None,
                },
            )
        })
        .collect();
    for result in results {
        if let Some(c) = by_dimension.get_mut(&result.dimension) {
            match result.side {
                Side::A => c.a = Some(result.outcome),
                Side::B => c.b = Some(result.outcome),
            }
        }
    }
    by_dimension.into_iter().collect()
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
