use super::dimension::Dimension;
use serde::{Deserialize, Serialize};

/// Stable identifier of a codebase within a comparison (its canonical path).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodebaseId(String);

impl CodebaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CodebaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reason code carried by every plugin failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Timeout,
    UnsupportedLanguage,
    MissingTool,
    ToolCrashed,
    InsufficientData,
    NotApplicable,
    Io,
    Cancelled,
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::Timeout => "timeout",
            FailureReason::UnsupportedLanguage => "unsupported_language",
            FailureReason::MissingTool => "missing_tool",
            FailureReason::ToolCrashed => "tool_crashed",
            FailureReason::InsufficientData => "insufficient_data",
            FailureReason::NotApplicable => "not_applicable",
            FailureReason::Io => "io",
            FailureReason::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Typed failure of a single plugin invocation.
///
/// Recovered locally: the affected (dimension, codebase) cell becomes
/// unavailable while the rest of the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{reason}: {message}")]
pub struct AnalysisFailure {
    pub reason: FailureReason,
    pub message: String,
}

impl AnalysisFailure {
    pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    pub fn timeout(limit: std::time::Duration) -> Self {
        Self::new(
            FailureReason::Timeout,
            format!("analysis exceeded {:.1}s", limit.as_secs_f64()),
        )
    }

    pub fn cancelled() -> Self {
        Self::new(FailureReason::Cancelled, "run cancelled before completion")
    }

    pub fn unsupported_language(detail: impl Into<String>) -> Self {
        Self::new(FailureReason::UnsupportedLanguage, detail)
    }

    pub fn insufficient_data(detail: impl Into<String>) -> Self {
        Self::new(FailureReason::InsufficientData, detail)
    }

    pub fn reason_code(&self) -> &'static str {
        self.reason.code()
    }
}

impl From<std::io::Error> for AnalysisFailure {
    fn from(err: std::io::Error) -> Self {
        Self::new(FailureReason::Io, err.to_string())
    }
}

/// One plugin's measurement of one codebase. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetric {
    dimension: Dimension,
    codebase_id: CodebaseId,
    value: f64,
    unit_hint: String,
    sample_size: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    evidence: Vec<String>,
}

impl RawMetric {
    pub fn new(dimension: Dimension, codebase_id: CodebaseId, value: f64, sample_size: u64) -> Self {
        Self {
            dimension,
            codebase_id,
            value,
            unit_hint: String::new(),
            sample_size,
            evidence: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit_hint: impl Into<String>) -> Self {
        self.unit_hint = unit_hint.into();
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn dimension(&self) -> &Dimension {
        &self.dimension
    }

    pub fn codebase_id(&self) -> &CodebaseId {
        &self.codebase_id
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit_hint(&self) -> &str {
        &self.unit_hint
    }

    pub fn sample_size(&self) -> u64 {
        self.sample_size
    }

    pub fn evidence(&self) -> &[String] {
        &self.evidence
    }
}

/// Outcome of `BenchmarkPlugin::analyze`; a failed invocation is the `Err` arm.
pub type PluginOutcome = Result<RawMetric, AnalysisFailure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_failure_reason() {
        let failure = AnalysisFailure::timeout(std::time::Duration::from_secs(2));
        assert_eq!(failure.reason_code(), "timeout");
    }

    #[test]
    fn test_failure_display_includes_reason_code() {
        let failure = AnalysisFailure::new(FailureReason::MissingTool, "bandit not on PATH");
        assert_eq!(failure.to_string(), "missing_tool: bandit not on PATH");
    }

    #[test]
    fn test_builder_sets_unit_and_evidence() {
        let metric = RawMetric::new(Dimension::Readability, CodebaseId::new("a"), 3.0, 120)
            .with_unit("overlong lines")
            .with_evidence(vec!["src/main.rs: 3".into()]);
        assert_eq!(metric.unit_hint(), "overlong lines");
        assert_eq!(metric.evidence().len(), 1);
    }
}
