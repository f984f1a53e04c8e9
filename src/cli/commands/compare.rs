//! Compare command handler

use crate::cli::args::ReferenceArg;
use crate::cli::render::comparison_table;
use crate::cli::setup::{build_registry, load_cli_config, open_store};
use crate::comparison::{ComparisonReport, Orchestrator};
use crate::config::{CompareSettings, SettingsOverrides};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct CompareArgs {
    pub a: PathBuf,
    pub b: PathBuf,
    pub weights: Option<String>,
    pub skip: Vec<String>,
    pub export: Option<PathBuf>,
    pub confidence: Option<f64>,
    pub timeout: Option<f64>,
    pub jobs: Option<usize>,
    pub reference: Option<ReferenceArg>,
    pub config: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub no_store: bool,
}

impl CompareArgs {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            weights_json: self.weights.clone(),
            skip: self.skip.clone(),
            confidence_coefficient: self.confidence,
            timeout_secs: self.timeout,
            jobs: self.jobs,
            reference_mode: self.reference.map(|r| r.as_str().to_string()),
        }
    }
}

pub fn handle_compare_command(args: CompareArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = load_cli_config(args.config.as_deref(), &cwd)?;
    let settings = CompareSettings::resolve(&config, &args.overrides())?;
    let registry = build_registry(&config)?;
    let store = open_store(args.store.clone(), args.no_store)?;

    let orchestrator = Orchestrator::new(registry, settings, store);
    let run = orchestrator.compare(&args.a, &args.b)?;

    println!("{}", comparison_table(&run.report));
    println!("{}", run.report.summary_line());
    if let Some(id) = run.run_id.filter(|_| !args.no_store) {
        println!("Saved as run {id}");
    }

    if let Some(path) = &args.export {
        export_report(&run.report, path)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn export_report(report: &ComparisonReport, path: &Path) -> Result<()> {
    let json = report.to_json_pretty()?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::report::fixtures::report;
    use tempfile::TempDir;

    #[test]
    fn test_export_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let original = report();
        export_report(&original, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(ComparisonReport::from_json(&text).unwrap(), original);
    }

    #[test]
    fn test_overrides_carry_reference_mode() {
        let args = CompareArgs {
            reference: Some(ReferenceArg::Batch),
            skip: vec!["security".to_string()],
            ..CompareArgs::default()
        };
        let overrides = args.overrides();
        assert_eq!(overrides.reference_mode.as_deref(), Some("batch"));
        assert_eq!(overrides.skip, vec!["security".to_string()]);
    }
}
