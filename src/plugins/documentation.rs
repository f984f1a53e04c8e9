use super::scan::{scan, LineKind};
use super::{measured_sources, AnalysisOptions, BenchmarkPlugin};
use crate::core::{Dimension, Language, PluginOutcome, Polarity, RawMetric, SizePolicy};
use crate::io::Codebase;
use crate::scoring::ReferenceDistribution;

/// Comment and docstring lines per KLOC of code.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentationPlugin;

impl BenchmarkPlugin for DocumentationPlugin {
    fn dimension(&self) -> Dimension {
        Dimension::Documentation
    }

    fn polarity(&self) -> Polarity {
        Polarity::HigherIsBetter
    }

    fn size_policy(&self) -> SizePolicy {
        SizePolicy::PER_KLOC
    }

    fn min_sample_size(&self) -> u64 {
        200
    }

    fn prior(&self) -> ReferenceDistribution {
        ReferenceDistribution::prior(150.0, 90.0)
    }

    fn supported_languages(&self) -> Option<&[Language]> {
        None
    }

    fn description(&self) -> &str {
        "comment and docstring lines per KLOC"
    }

    fn analyze(&self, codebase: &Codebase, _options: &AnalysisOptions) -> PluginOutcome {
        let sources = measured_sources(self, codebase)?;
        let mut comment_lines = 0u64;
        let mut code_lines = 0u64;
        let mut undocumented = Vec::new();

        for file in sources {
            let lines = scan(file);
            let comments = lines.iter().filter(|l| l.kind == LineKind::Comment).count() as u64;
            let code = lines.iter().filter(|l| l.kind == LineKind::Code).count() as u64;
            if comments == 0 && code > 0 {
                undocumented.push(file.path.display().to_string());
            }
            comment_lines += comments;
            code_lines += code;
        }

        let mut evidence = vec![format!(
            "{comment_lines} comment lines for {code_lines} code lines"
        )];
        if !undocumented.is_empty() {
            evidence.push(format!("{} files without any comments", undocumented.len()));
            evidence.extend(
                undocumented
                    .into_iter()
                    .take(5)
                    .map(|path| format!("no comments: {path}")),
            );
        }

        Ok(RawMetric::new(
            self.dimension(),
            codebase.id().clone(),
            comment_lines as f64,
            code_lines,
        )
        .with_unit("comment lines")
        .with_evidence(evidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::test_support::codebase;
    use indoc::indoc;

    #[test]
    fn test_counts_docstrings_and_comments() {
        let src = indoc! {r#"
            """Module docs."""

            # helper
            def f():
                """Return one."""
                return 1
        "#};
        let cb = codebase(&[("m.py", src), ("bare.py", "x = 1\n")]);
        let metric = DocumentationPlugin.analyze(&cb, &AnalysisOptions::default()).unwrap();
        assert_eq!(metric.value(), 3.0);
        assert_eq!(metric.sample_size(), 3);
        assert!(metric.evidence().iter().any(|e| e == "no comments: bare.py"));
    }
}
