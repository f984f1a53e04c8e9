use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// A quality axis scored independently for both codebases.
///
/// Built-in dimensions are a closed set; plugins declared in configuration
/// use [`Dimension::Custom`]. Ordering and equality go through the canonical
/// snake_case name, so a custom dimension named `security` is the same
/// dimension as [`Dimension::Security`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Dimension {
    Consistency,
    Documentation,
    GitHealth,
    Maintainability,
    Performance,
    Readability,
    Robustness,
    Scalability,
    Security,
    Testability,
    Custom(String),
}

impl Dimension {
    pub const BUILT_IN: [Dimension; 10] = [
        Dimension::Consistency,
        Dimension::Documentation,
        Dimension::GitHealth,
        Dimension::Maintainability,
        Dimension::Performance,
        Dimension::Readability,
        Dimension::Robustness,
        Dimension::Scalability,
        Dimension::Security,
        Dimension::Testability,
    ];

    /// Canonical snake_case name.
    pub fn as_str(&self) -> &str {
        match self {
            Dimension::Consistency => "consistency",
            Dimension::Documentation => "documentation",
            Dimension::GitHealth => "git_health",
            Dimension::Maintainability => "maintainability",
            Dimension::Performance => "performance",
            Dimension::Readability => "readability",
            Dimension::Robustness => "robustness",
            Dimension::Scalability => "scalability",
            Dimension::Security => "security",
            Dimension::Testability => "testability",
            Dimension::Custom(name) => name,
        }
    }

    /// Human-readable title, e.g. `GitHealth`.
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect()
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Dimension::Custom(_))
    }
}

/// Normalize `GitHealth`, `git-health` and `git_health` to `git_health`.
fn canonical_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev_lower = false;
    for ch in raw.trim().chars() {
        if ch == '-' || ch == ' ' || ch == '_' {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower = false;
        } else if ch.is_ascii_uppercase() {
            if prev_lower && !out.ends_with('_') {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }
    out.trim_end_matches('_').to_string()
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = canonical_name(s);
        if name.is_empty() {
            return Err("dimension name must not be empty".to_string());
        }
        let dimension = Dimension::BUILT_IN
            .iter()
            .find(|d| d.as_str() == name)
            .cloned()
            .unwrap_or(Dimension::Custom(name));
        Ok(dimension)
    }
}

impl TryFrom<String> for Dimension {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dimension> for String {
    fn from(value: Dimension) -> Self {
        value.as_str().to_string()
    }
}

impl PartialEq for Dimension {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Dimension {}

impl std::hash::Hash for Dimension {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl PartialOrd for Dimension {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Dimension {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction in which a raw metric improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

impl Polarity {
    /// Sign applied to a z-score so that higher is always better downstream.
    pub fn orientation(&self) -> f64 {
        match self {
            Polarity::HigherIsBetter => 1.0,
            Polarity::LowerIsBetter => -1.0,
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::HigherIsBetter => f.write_str("higher is better"),
            Polarity::LowerIsBetter => f.write_str("lower is better"),
        }
    }
}

/// How the size-bias corrector treats a dimension's raw value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SizePolicy {
    /// Divide by sample size, then scale to `per_units` (1000 = per KLOC).
    Rate { per_units: f64 },
    /// Z-score the raw value directly.
    Absolute,
}

impl SizePolicy {
    pub const PER_KLOC: SizePolicy = SizePolicy::Rate { per_units: 1000.0 };
}

impl std::fmt::Display for SizePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizePolicy::Rate { per_units } => write!(f, "rate per {per_units}"),
            SizePolicy::Absolute => f.write_str("absolute"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_title_kebab_and_snake_case() {
        assert_eq!("GitHealth".parse::<Dimension>(), Ok(Dimension::GitHealth));
        assert_eq!("git-health".parse::<Dimension>(), Ok(Dimension::GitHealth));
        assert_eq!("git_health".parse::<Dimension>(), Ok(Dimension::GitHealth));
        assert_eq!("Security".parse::<Dimension>(), Ok(Dimension::Security));
    }

    #[test]
    fn test_unknown_names_become_custom() {
        let dim: Dimension = "LintScore".parse().unwrap();
        assert_eq!(dim, Dimension::Custom("lint_score".to_string()));
        assert!(dim.is_custom());
        assert_eq!(dim.title(), "LintScore");
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!("  ".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_ordering_is_lexicographic_by_name() {
        let mut dims = vec![
            Dimension::Testability,
            Dimension::Custom("accessibility".into()),
            Dimension::GitHealth,
            Dimension::Consistency,
        ];
        dims.sort();
        let names: Vec<_> = dims.iter().map(Dimension::as_str).collect();
        assert_eq!(
            names,
            vec!["accessibility", "consistency", "git_health", "testability"]
        );
    }

    #[test]
    fn test_custom_with_builtin_name_equals_builtin() {
        assert_eq!(Dimension::Custom("security".into()), Dimension::Security);
    }

    #[test]
    fn test_serde_as_plain_string() {
        let json = serde_json::to_string(&Dimension::GitHealth).unwrap();
        assert_eq!(json, "\"git_health\"");
        let back: Dimension = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Dimension::GitHealth);
    }

    #[test]
    fn test_polarity_orientation() {
        assert_eq!(Polarity::HigherIsBetter.orientation(), 1.0);
        assert_eq!(Polarity::LowerIsBetter.orientation(), -1.0);
    }
}
