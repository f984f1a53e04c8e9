//! Commit churn inside a recent time window, read through libgit2.

use super::{AnalysisOptions, BenchmarkPlugin};
use crate::core::{
    AnalysisFailure, Dimension, FailureReason, Language, PluginOutcome, Polarity, RawMetric,
    SizePolicy,
};
use crate::io::Codebase;
use crate::scoring::ReferenceDistribution;
use git2::{Repository, Sort};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Mean commits per changed source file inside the window.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHealthPlugin;

#[derive(Debug, Default)]
struct Churn {
    per_file: BTreeMap<PathBuf, u64>,
    commits: u64,
    authors: BTreeSet<String>,
}

impl Churn {
    fn mean_per_file(&self) -> f64 {
        let total: u64 = self.per_file.values().sum();
        total as f64 / self.per_file.len() as f64
    }

    fn hotspots(&self, n: usize) -> Vec<(&Path, u64)> {
        let mut files: Vec<(&Path, u64)> = self
            .per_file
            .iter()
            .map(|(p, c)| (p.as_path(), *c))
            .collect();
        files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        files.truncate(n);
        files
    }
}

fn git_failure(err: git2::Error) -> AnalysisFailure {
    AnalysisFailure::new(FailureReason::Io, format!("git: {}", err.message()))
}

fn not_applicable(message: impl Into<String>) -> AnalysisFailure {
    AnalysisFailure::new(FailureReason::NotApplicable, message)
}

fn collect_churn(root: &Path, since: i64) -> Result<Churn, AnalysisFailure> {
    let repo = Repository::discover(root)
        .map_err(|_| not_applicable(format!("{} is not inside a git repository", root.display())))?;
    let workdir = repo
        .workdir()
        .ok_or_else(|| not_applicable("bare repositories are not supported"))?;
    let workdir = workdir
        .canonicalize()
        .unwrap_or_else(|_| workdir.to_path_buf());
    let prefix = root.strip_prefix(&workdir).unwrap_or(Path::new("")).to_path_buf();

    let mut revwalk = repo.revwalk().map_err(git_failure)?;
    if revwalk.push_head().is_err() {
        return Err(AnalysisFailure::insufficient_data("repository has no commits"));
    }
    revwalk.set_sorting(Sort::TIME).map_err(git_failure)?;

    let mut churn = Churn::default();
    for oid in revwalk.filter_map(|oid| oid.ok()) {
        let commit = repo.find_commit(oid).map_err(git_failure)?;
        if commit.time().seconds() < since {
            break;
        }

        let tree = commit.tree().map_err(git_failure)?;
        let parent_tree = commit.parents().next().and_then(|p| p.tree().ok());
        let diff = repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
            .map_err(git_failure)?;

        let mut touched = false;
        for delta in diff.deltas() {
            let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) else {
                continue;
            };
            if !path.starts_with(&prefix) || Language::from_path(path) == Language::Unknown {
                continue;
            }
            *churn.per_file.entry(path.to_path_buf()).or_insert(0) += 1;
            touched = true;
        }

        if touched {
            churn.commits += 1;
            if let Some(email) = commit.author().email() {
                churn.authors.insert(email.to_string());
            }
        }
    }

    Ok(churn)
}

impl BenchmarkPlugin for GitHealthPlugin {
    fn dimension(&self) -> Dimension {
        Dimension::GitHealth
    }

    fn polarity(&self) -> Polarity {
        Polarity::LowerIsBetter
    }

    fn size_policy(&self) -> SizePolicy {
        SizePolicy::Absolute
    }

    fn min_sample_size(&self) -> u64 {
        5
    }

    fn prior(&self) -> ReferenceDistribution {
        ReferenceDistribution::prior(4.0, 3.0)
    }

    fn supported_languages(&self) -> Option<&[Language]> {
        None
    }

    fn description(&self) -> &str {
        "mean commits per changed source file in the recent window"
    }

    fn analyze(&self, codebase: &Codebase, options: &AnalysisOptions) -> PluginOutcome {
        let since = chrono::Duration::try_days(i64::from(options.git_window_days))
            .and_then(|window| options.reference_time.checked_sub_signed(window))
            .map(|start| start.timestamp())
            .ok_or_else(|| {
                AnalysisFailure::insufficient_data(format!(
                    "git window of {} days reaches before the earliest representable date",
                    options.git_window_days
                ))
            })?;
        let churn = collect_churn(codebase.root(), since)?;

        if churn.per_file.is_empty() {
            return Err(AnalysisFailure::insufficient_data(format!(
                "no commits touched source files in the last {} days",
                options.git_window_days
            )));
        }

        let mean = churn.mean_per_file();
        let mut evidence = vec![
            format!(
                "average churn: {mean:.1} commits per file over {} files in the last {} days",
                churn.per_file.len(),
                options.git_window_days
            ),
            format!("commits touching sources: {}", churn.commits),
            format!("bus factor (unique committers): {}", churn.authors.len()),
        ];
        evidence.extend(
            churn
                .hotspots(5)
                .into_iter()
                .map(|(path, count)| format!("{} changed {count} times", path.display())),
        );

        tracing::debug!(
            codebase = %codebase.id(),
            files = churn.per_file.len(),
            commits = churn.commits,
            "collected git churn"
        );

        Ok(RawMetric::new(self.dimension(), codebase.id().clone(), mean, churn.commits)
            .with_unit("commits per file")
            .with_evidence(evidence))
    }
}
