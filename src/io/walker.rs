use crate::core::Language;
use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// A file discovered under a codebase root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    pub path: PathBuf,
    pub language: Language,
}

/// Gitignore-aware traversal of one codebase directory.
pub struct FileWalker {
    root: PathBuf,
    ignore_patterns: Vec<glob::Pattern>,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ignore_patterns: vec![],
        }
    }

    /// Invalid glob patterns are dropped with a warning.
    pub fn with_ignore_patterns(mut self, patterns: &[String]) -> Self {
        self.ignore_patterns = patterns
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!(pattern = %p, error = %e, "ignoring invalid exclude pattern");
                    None
                }
            })
            .collect();
        self
    }

    /// Every regular file under the root, sorted by path, languages tagged.
    pub fn walk(&self) -> Result<Vec<WalkedFile>> {
        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .require_git(false)
            .build();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && !self.is_excluded(path) {
                files.push(WalkedFile {
                    path: path.to_path_buf(),
                    language: Language::from_path(path),
                });
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let relative_str = relative.to_string_lossy();
        self.ignore_patterns
            .iter()
            .any(|p| p.matches(&relative_str) || p.matches_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_walk_tags_languages_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("a.rs"), "fn main() {}\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();

        let files = FileWalker::new(dir.path().to_path_buf()).walk().unwrap();
        let langs: Vec<_> = files.iter().map(|f| f.language).collect();
        assert_eq!(
            langs,
            vec![Language::Rust, Language::Python, Language::Unknown]
        );
    }

    #[test]
    fn test_exclude_patterns() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("vendor")).unwrap();
        fs::write(dir.path().join("vendor/lib.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("main.py"), "x = 1\n").unwrap();

        let files = FileWalker::new(dir.path().to_path_buf())
            .with_ignore_patterns(&["vendor/*".to_string()])
            .walk()
            .unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("main.py"));
    }
}
