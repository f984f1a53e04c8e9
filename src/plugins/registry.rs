//! Plugin registry keyed by dimension.
//!
//! Resolution order is the lexicographic order of dimension names, never
//! registration order, so identical inputs produce identical reports.

use super::{builtin_plugins, BenchmarkPlugin, ExternalPlugin, ExternalPluginSpec};
use crate::core::{Dimension, LanguageSet};
use crate::errors::CompareError;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<Dimension, Arc<dyn BenchmarkPlugin>>,
}

/// Outcome of resolving the registry for one comparison.
#[derive(Clone, Default)]
pub struct Resolution {
    /// Plugins to run, ordered by dimension name.
    pub active: Vec<Arc<dyn BenchmarkPlugin>>,
    /// Registered dimensions excluded by the skip set.
    pub skipped: Vec<Dimension>,
    /// Requested dimensions none of whose languages appear in either codebase.
    pub unsupported: Vec<Dimension>,
}

impl Resolution {
    pub fn active_dimensions(&self) -> Vec<Dimension> {
        self.active.iter().map(|p| p.dimension()).collect()
    }
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("active", &self.active_dimensions())
            .field("skipped", &self.skipped)
            .field("unsupported", &self.unsupported)
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in plugin.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for plugin in builtin_plugins() {
            registry.plugins.insert(plugin.dimension(), Arc::from(plugin));
        }
        registry
    }

    /// Add a plugin; a second plugin for the same dimension is rejected.
    pub fn register(&mut self, plugin: Arc<dyn BenchmarkPlugin>) -> Result<(), CompareError> {
        let dimension = plugin.dimension();
        if self.plugins.contains_key(&dimension) {
            return Err(CompareError::config_with_field(
                format!("a plugin for dimension '{dimension}' is already registered"),
                "external",
            ));
        }
        self.plugins.insert(dimension, plugin);
        Ok(())
    }

    /// Register every declared external tool plugin.
    pub fn register_external(&mut self, specs: &[ExternalPluginSpec]) -> Result<(), CompareError> {
        for spec in specs {
            let plugin = ExternalPlugin::new(spec.clone())
                .map_err(|e| CompareError::config_with_field(e, "external.name"))?;
            self.register(Arc::new(plugin))?;
        }
        Ok(())
    }

    pub fn get(&self, dimension: &Dimension) -> Option<&Arc<dyn BenchmarkPlugin>> {
        self.plugins.get(dimension)
    }

    pub fn contains(&self, dimension: &Dimension) -> bool {
        self.plugins.contains_key(dimension)
    }

    /// Registered dimensions in resolution order.
    pub fn dimensions(&self) -> Vec<Dimension> {
        self.plugins.keys().cloned().collect()
    }

    pub fn plugins(&self) -> impl Iterator<Item = &Arc<dyn BenchmarkPlugin>> {
        self.plugins.values()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Active plugins for a comparison over `languages`.
    ///
    /// `languages` is the union of both codebases' detected languages.
    pub fn resolve(&self, skip: &BTreeSet<Dimension>, languages: &LanguageSet) -> Resolution {
        let mut resolution = Resolution::default();
        for (dimension, plugin) in &self.plugins {
            if skip.contains(dimension) {
                resolution.skipped.push(dimension.clone());
            } else if plugin.supports(languages) {
                resolution.active.push(Arc::clone(plugin));
            } else {
                resolution.unsupported.push(dimension.clone());
            }
        }
        tracing::debug!(?resolution, "resolved plugins");
        resolution
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("dimensions", &self.dimensions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Language;
    use crate::plugins::external::SizeKind;
    use crate::scoring::ReferenceDistribution;
    use crate::core::Polarity;
    use pretty_assertions::assert_eq;

    fn languages(langs: &[Language]) -> LanguageSet {
        langs.iter().copied().collect()
    }

    fn external(name: &str) -> ExternalPluginSpec {
        ExternalPluginSpec {
            name: name.to_string(),
            command: "true".to_string(),
            args: Vec::new(),
            polarity: Polarity::HigherIsBetter,
            size_policy: SizeKind::Absolute,
            per_units: None,
            languages: Vec::new(),
            min_sample_size: 0,
            prior: ReferenceDistribution::prior(1.0, 1.0),
            description: String::new(),
        }
    }

    #[test]
    fn test_resolution_is_ordered_by_dimension() {
        let registry = PluginRegistry::with_builtins();
        let resolution = registry.resolve(&BTreeSet::new(), &languages(&[Language::Python]));
        let dims = resolution.active_dimensions();
        let mut sorted = dims.clone();
        sorted.sort();
        assert_eq!(dims, sorted);
        assert_eq!(dims.len(), 10);
        assert!(resolution.unsupported.is_empty());
    }

    #[test]
    fn test_skip_excludes_dimension() {
        let registry = PluginRegistry::with_builtins();
        let skip: BTreeSet<_> = [Dimension::Security, Dimension::GitHealth].into_iter().collect();
        let resolution = registry.resolve(&skip, &languages(&[Language::Python]));
        assert_eq!(resolution.skipped, vec![Dimension::GitHealth, Dimension::Security]);
        assert!(!resolution.active_dimensions().contains(&Dimension::Security));
        assert_eq!(resolution.active.len(), 8);
    }

    #[test]
    fn test_language_filter_marks_unsupported() {
        let registry = PluginRegistry::with_builtins();
        let resolution = registry.resolve(&BTreeSet::new(), &languages(&[Language::C]));
        assert_eq!(
            resolution.unsupported,
            vec![
                Dimension::Consistency,
                Dimension::Performance,
                Dimension::Robustness,
                Dimension::Scalability,
                Dimension::Security,
            ]
        );
    }

    #[test]
    fn test_duplicate_dimension_rejected() {
        let mut registry = PluginRegistry::with_builtins();
        let err = registry.register_external(&[external("security")]).unwrap_err();
        assert_eq!(err.category(), "Config");
    }

    #[test]
    fn test_external_plugins_join_resolution_order() {
        let mut registry = PluginRegistry::with_builtins();
        registry.register_external(&[external("lint-score")]).unwrap();
        let dims = registry.dimensions();
        let pos = dims
            .iter()
            .position(|d| d.as_str() == "lint_score")
            .unwrap();
        assert_eq!(dims[pos - 1], Dimension::GitHealth);
        assert_eq!(dims[pos + 1], Dimension::Maintainability);
    }
}
