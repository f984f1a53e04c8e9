//! Benchmark plugins: one analyzer per quality dimension.
//!
//! Every plugin conforms to [`BenchmarkPlugin`]. It declares how its raw value
//! behaves (polarity, size policy, minimum sample size, built-in prior) and
//! measures one codebase at a time. Failures come back as typed
//! [`AnalysisFailure`]s and never abort other invocations.

pub mod consistency;
pub mod documentation;
pub mod external;
pub mod git_health;
pub mod maintainability;
pub mod performance;
pub mod readability;
pub mod registry;
pub mod robustness;
pub mod scalability;
pub mod scan;
pub mod security;
pub mod testability;

use crate::core::{
    AnalysisFailure, Dimension, Language, LanguageSet, PluginOutcome, Polarity, SizePolicy,
};
use crate::io::{Codebase, SourceFile};
use crate::scoring::ReferenceDistribution;
use chrono::{DateTime, Utc};
use std::time::Duration;

pub use consistency::ConsistencyPlugin;
pub use documentation::DocumentationPlugin;
pub use external::{ExternalPlugin, ExternalPluginSpec};
pub use git_health::GitHealthPlugin;
pub use maintainability::MaintainabilityPlugin;
pub use performance::PerformancePlugin;
pub use readability::ReadabilityPlugin;
pub use registry::{PluginRegistry, Resolution};
pub use robustness::RobustnessPlugin;
pub use scalability::ScalabilityPlugin;
pub use security::SecurityPlugin;
pub use testability::TestabilityPlugin;

/// Per-run options handed to every invocation.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub timeout: Duration,
    pub git_window_days: u32,
    /// Fixed "now" for the run, so time windows agree across invocations.
    pub reference_time: DateTime<Utc>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            git_window_days: 180,
            reference_time: Utc::now(),
        }
    }
}

pub trait BenchmarkPlugin: Send + Sync {
    fn dimension(&self) -> Dimension;

    fn polarity(&self) -> Polarity;

    fn size_policy(&self) -> SizePolicy;

    /// Below this sample size the score is flagged low-confidence.
    fn min_sample_size(&self) -> u64;

    /// Built-in reference distribution, in size-corrected units.
    fn prior(&self) -> ReferenceDistribution;

    /// Languages this plugin can measure; `None` means any.
    fn supported_languages(&self) -> Option<&[Language]>;

    fn description(&self) -> &str {
        ""
    }

    fn supports(&self, languages: &LanguageSet) -> bool {
        match self.supported_languages() {
            None => true,
            Some(supported) => languages.iter().any(|l| supported.contains(l)),
        }
    }

    fn analyze(&self, codebase: &Codebase, options: &AnalysisOptions) -> PluginOutcome;
}

/// Sources the plugin can read in `codebase`.
///
/// Fails with `unsupported_language` when the codebase holds none of the
/// plugin's languages, and with `insufficient_data` when it holds no
/// recognized sources at all.
pub(crate) fn measured_sources<'a>(
    plugin: &dyn BenchmarkPlugin,
    codebase: &'a Codebase,
) -> Result<Vec<&'a SourceFile>, AnalysisFailure> {
    let sources: Vec<&SourceFile> = match plugin.supported_languages() {
        None => codebase.sources().iter().collect(),
        Some(languages) => {
            if !plugin.supports(codebase.languages()) {
                return Err(AnalysisFailure::unsupported_language(format!(
                    "{} supports {}; codebase has {}",
                    plugin.dimension(),
                    language_list(languages.iter()),
                    language_list(codebase.languages().iter()),
                )));
            }
            codebase
                .sources()
                .iter()
                .filter(|s| languages.contains(&s.language))
                .collect()
        }
    };
    if sources.is_empty() {
        return Err(AnalysisFailure::insufficient_data(
            "no recognized source files",
        ));
    }
    Ok(sources)
}

fn language_list<'a>(languages: impl Iterator<Item = &'a Language>) -> String {
    let names: Vec<&str> = languages.map(Language::name).collect();
    if names.is_empty() {
        "no known language".to_string()
    } else {
        names.join(", ")
    }
}

/// Every built-in plugin, in no particular order.
pub fn builtin_plugins() -> Vec<Box<dyn BenchmarkPlugin>> {
    vec![
        Box::new(ConsistencyPlugin),
        Box::new(DocumentationPlugin),
        Box::new(GitHealthPlugin),
        Box::new(MaintainabilityPlugin),
        Box::new(PerformancePlugin),
        Box::new(ReadabilityPlugin),
        Box::new(RobustnessPlugin),
        Box::new(ScalabilityPlugin),
        Box::new(SecurityPlugin),
        Box::new(TestabilityPlugin),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::CodebaseId;
    use std::path::PathBuf;

    pub fn codebase(files: &[(&str, &str)]) -> Codebase {
        let sources = files
            .iter()
            .map(|(path, content)| {
                SourceFile::new(*path, Language::from_path(std::path::Path::new(path)), *content)
            })
            .collect();
        Codebase::from_sources(
            CodebaseId::new("fixture"),
            "fixture",
            PathBuf::from("/nonexistent/fixture"),
            sources,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::codebase;
    use super::*;

    #[test]
    fn test_builtins_cover_every_builtin_dimension() {
        let mut dims: Vec<Dimension> = builtin_plugins().iter().map(|p| p.dimension()).collect();
        dims.sort();
        assert_eq!(dims, Dimension::BUILT_IN.to_vec());
    }

    #[test]
    fn test_measured_sources_rejects_unsupported_language() {
        let cb = codebase(&[("main.go", "package main\n")]);
        let err = measured_sources(&SecurityPlugin, &cb).unwrap_err();
        assert_eq!(err.reason_code(), "unsupported_language");
    }

    #[test]
    fn test_measured_sources_filters_languages() {
        let cb = codebase(&[("a.py", "x = 1\n"), ("b.go", "package b\n")]);
        let sources = measured_sources(&SecurityPlugin, &cb).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].language, Language::Python);
    }
}
