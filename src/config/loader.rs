use std::fs;
use std::path::{Path, PathBuf};

use super::core::CodebenchConfig;
use crate::errors::CompareError;

pub const CONFIG_FILE_NAME: &str = ".codebench.toml";

/// Ancestor directories searched for a config file, the start included.
const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse config file contents.
pub fn parse_config(contents: &str) -> Result<CodebenchConfig, String> {
    toml::from_str::<CodebenchConfig>(contents)
        .map_err(|e| format!("failed to parse {CONFIG_FILE_NAME}: {e}"))
}

/// Load an explicitly named config file. Any failure is a configuration error.
pub fn load_config_file(path: &Path) -> Result<CodebenchConfig, CompareError> {
    let contents =
        fs::read_to_string(path).map_err(|e| CompareError::config_file(e.to_string(), path))?;
    let config = parse_config(&contents).map_err(|e| CompareError::config_file(e, path))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// `start` followed by its ancestors, at most `max_depth` paths.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Nearest `.codebench.toml` at or above `start`.
pub fn discover_config_path(start: &Path) -> Option<PathBuf> {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// Explicit file if given, otherwise the discovered one, otherwise defaults.
/// A discovered file that fails to parse is an error.
pub fn load_config(explicit: Option<&Path>, start: &Path) -> Result<CodebenchConfig, CompareError> {
    if let Some(path) = explicit {
        return load_config_file(path);
    }
    match discover_config_path(start) {
        Some(path) => load_config_file(&path),
        None => {
            tracing::debug!(
                depth = MAX_TRAVERSAL_DEPTH,
                "no {CONFIG_FILE_NAME} found, using defaults"
            );
            Ok(CodebenchConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Dimension;
    use tempfile::TempDir;

    #[test]
    fn test_ancestors_are_bounded() {
        let deep: PathBuf = (0..15).fold(PathBuf::from("/"), |p, i| p.join(format!("d{i}")));
        let ancestors: Vec<_> = directory_ancestors(deep.clone(), 10).collect();
        assert_eq!(ancestors.len(), 10);
        assert_eq!(ancestors[0], deep);
    }

    #[test]
    fn test_discovers_config_in_parent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "skip = [\"security\"]\n").unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = load_config(None, &nested).unwrap();
        assert_eq!(config.skip, vec![Dimension::Security]);
    }

    #[test]
    fn test_explicit_missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml")), dir.path()).unwrap_err();
        assert_eq!(err.code().as_str(), "E022");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "weights = 3\n").unwrap();
        let err = load_config(None, dir.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }
}
