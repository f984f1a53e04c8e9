//! Plugins backed by an external command declared in configuration.
//!
//! The command runs in the codebase root with `{path}` in its arguments
//! replaced by that root. The last non-empty line of stdout is the raw value.

use super::{AnalysisOptions, BenchmarkPlugin};
use crate::core::{
    AnalysisFailure, Dimension, FailureReason, Language, PluginOutcome, Polarity, RawMetric,
    SizePolicy,
};
use crate::io::Codebase;
use crate::scoring::ReferenceDistribution;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const PATH_PLACEHOLDER: &str = "{path}";
const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeKind {
    #[default]
    Absolute,
    Rate,
}

fn default_args() -> Vec<String> {
    vec![PATH_PLACEHOLDER.to_string()]
}

fn default_polarity() -> Polarity {
    Polarity::HigherIsBetter
}

fn default_prior() -> ReferenceDistribution {
    ReferenceDistribution::prior(5.0, 2.5)
}

/// `[[external]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalPluginSpec {
    pub name: String,
    pub command: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    #[serde(default = "default_polarity")]
    pub polarity: Polarity,
    #[serde(default)]
    pub size_policy: SizeKind,
    /// Units per rate, 1000 (per KLOC) when omitted.
    #[serde(default)]
    pub per_units: Option<f64>,
    /// Empty means any language.
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub min_sample_size: u64,
    #[serde(default = "default_prior")]
    pub prior: ReferenceDistribution,
    #[serde(default)]
    pub description: String,
}

impl ExternalPluginSpec {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("external plugin name must not be empty".to_string());
        }
        if self.command.trim().is_empty() {
            errors.push(format!("external plugin '{}' has an empty command", self.name));
        }
        if let Some(per_units) = self.per_units {
            if !(per_units.is_finite() && per_units > 0.0) {
                errors.push(format!(
                    "external plugin '{}': per_units must be positive",
                    self.name
                ));
            }
        }
        if let Err(e) = self.prior.validate() {
            errors.push(format!("external plugin '{}': {e}", self.name));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExternalPlugin {
    spec: ExternalPluginSpec,
    dimension: Dimension,
}

impl ExternalPlugin {
    pub fn new(spec: ExternalPluginSpec) -> Result<Self, String> {
        let dimension: Dimension = spec.name.parse()?;
        Ok(Self { spec, dimension })
    }

    pub fn spec(&self) -> &ExternalPluginSpec {
        &self.spec
    }

    fn resolve_program(&self) -> Result<PathBuf, AnalysisFailure> {
        which::which(&self.spec.command).map_err(|_| {
            AnalysisFailure::new(
                FailureReason::MissingTool,
                format!("'{}' not found in PATH", self.spec.command),
            )
        })
    }

    fn arguments(&self, root: &Path) -> Vec<String> {
        let root = root.display().to_string();
        self.spec
            .args
            .iter()
            .map(|arg| arg.replace(PATH_PLACEHOLDER, &root))
            .collect()
    }
}

struct ToolOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

fn drain<R: Read + Send + 'static>(reader: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut r) = reader {
            let _ = r.read_to_string(&mut buf);
        }
        buf
    })
}

/// Wait for `child`, killing it once `timeout` has elapsed.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> Result<ToolOutput, AnalysisFailure> {
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let start = Instant::now();

    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None if start.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AnalysisFailure::timeout(timeout));
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    };

    Ok(ToolOutput {
        success: status.success(),
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    })
}

/// The raw value printed by the tool: its last non-empty stdout line.
fn parse_value(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .and_then(|l| l.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

impl BenchmarkPlugin for ExternalPlugin {
    fn dimension(&self) -> Dimension {
        self.dimension.clone()
    }

    fn polarity(&self) -> Polarity {
        self.spec.polarity
    }

    fn size_policy(&self) -> SizePolicy {
        match self.spec.size_policy {
            SizeKind::Absolute => SizePolicy::Absolute,
            SizeKind::Rate => SizePolicy::Rate {
                per_units: self.spec.per_units.unwrap_or(1000.0),
            },
        }
    }

    fn min_sample_size(&self) -> u64 {
        self.spec.min_sample_size
    }

    fn prior(&self) -> ReferenceDistribution {
        self.spec.prior
    }

    fn supported_languages(&self) -> Option<&[Language]> {
        if self.spec.languages.is_empty() {
            None
        } else {
            Some(&self.spec.languages)
        }
    }

    fn description(&self) -> &str {
        &self.spec.description
    }

    fn analyze(&self, codebase: &Codebase, options: &AnalysisOptions) -> PluginOutcome {
        if !self.supports(codebase.languages()) {
            return Err(AnalysisFailure::unsupported_language(format!(
                "{} does not handle the languages in {}",
                self.spec.name,
                codebase.label()
            )));
        }
        let program = self.resolve_program()?;
        let args = self.arguments(codebase.root());
        tracing::debug!(tool = %program.display(), ?args, "running external plugin");

        let child = Command::new(&program)
            .args(&args)
            .current_dir(codebase.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                AnalysisFailure::new(
                    FailureReason::ToolCrashed,
                    format!("failed to start {}: {e}", self.spec.command),
                )
            })?;

        let output = wait_with_timeout(child, options.timeout)?;
        let value = match parse_value(&output.stdout) {
            Some(value) => value,
            None => {
                let detail = if output.success {
                    "no numeric value on the last stdout line".to_string()
                } else {
                    let stderr = output.stderr.trim();
                    format!(
                        "exited unsuccessfully{}",
                        if stderr.is_empty() {
                            String::new()
                        } else {
                            format!(": {}", stderr.lines().last().unwrap_or(stderr))
                        }
                    )
                };
                return Err(AnalysisFailure::new(
                    FailureReason::ToolCrashed,
                    format!("{}: {detail}", self.spec.command),
                ));
            }
        };

        let mut evidence = vec![format!("{} reported {value}", self.spec.command)];
        if !output.success {
            evidence.push("tool exited with a non-zero status".to_string());
        }
        Ok(
            RawMetric::new(self.dimension(), codebase.id().clone(), value, codebase.code_lines())
                .with_unit(self.spec.name.clone())
                .with_evidence(evidence),
        )
    }
}
