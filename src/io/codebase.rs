//! Loaded snapshot of one codebase, shared read-only by every plugin
//! invocation against it.

use super::walker::FileWalker;
use crate::core::{CodebaseId, Language, LanguageSet};
use crate::errors::CompareError;
use std::path::{Path, PathBuf};

/// Options controlling which files are loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub exclude: Vec<String>,
    pub max_file_bytes: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            max_file_bytes: 1_048_576,
        }
    }
}

/// A recognized source file and its content.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path relative to the codebase root.
    pub path: PathBuf,
    pub language: Language,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, language: Language, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language,
            content: content.into(),
        }
    }

    /// Non-blank lines.
    pub fn code_lines(&self) -> u64 {
        self.content.lines().filter(|l| !l.trim().is_empty()).count() as u64
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct Codebase {
    id: CodebaseId,
    label: String,
    root: PathBuf,
    languages: LanguageSet,
    sources: Vec<SourceFile>,
    total_files: usize,
}

impl Codebase {
    /// Validate and load a codebase directory.
    ///
    /// A missing path or a non-directory is a filesystem error; a directory
    /// without a single file is a configuration error.
    pub fn load(root: &Path, options: &LoadOptions) -> Result<Self, CompareError> {
        let metadata = std::fs::metadata(root).map_err(|e| CompareError::from_io_error(&e, root))?;
        if !metadata.is_dir() {
            return Err(CompareError::not_a_directory(root));
        }
        let canonical = root
            .canonicalize()
            .map_err(|e| CompareError::from_io_error(&e, root))?;

        let walked = FileWalker::new(canonical.clone())
            .with_ignore_patterns(&options.exclude)
            .walk()
            .map_err(|e| CompareError::filesystem(e.to_string(), &canonical))?;

        if walked.is_empty() {
            return Err(CompareError::empty_codebase(root));
        }

        let total_files = walked.len();
        let mut sources = Vec::new();
        for file in walked.into_iter().filter(|f| f.language != Language::Unknown) {
            match read_source(&file.path, options.max_file_bytes) {
                Some(content) => {
                    let relative = file
                        .path
                        .strip_prefix(&canonical)
                        .unwrap_or(&file.path)
                        .to_path_buf();
                    sources.push(SourceFile::new(relative, file.language, content));
                }
                None => tracing::debug!(path = %file.path.display(), "skipping unreadable or oversized file"),
            }
        }

        let label = canonical
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| canonical.display().to_string());
        let id = CodebaseId::new(canonical.display().to_string());

        tracing::debug!(
            codebase = %id,
            files = total_files,
            sources = sources.len(),
            "loaded codebase"
        );

        Ok(Self::from_sources(id, label, canonical, sources).with_total_files(total_files))
    }

    /// Build a snapshot from in-memory sources.
    pub fn from_sources(
        id: CodebaseId,
        label: impl Into<String>,
        root: PathBuf,
        sources: Vec<SourceFile>,
    ) -> Self {
        let languages = sources.iter().map(|s| s.language).collect();
        let total_files = sources.len();
        Self {
            id,
            label: label.into(),
            root,
            languages,
            sources,
            total_files,
        }
    }

    fn with_total_files(mut self, total_files: usize) -> Self {
        self.total_files = total_files;
        self
    }

    pub fn id(&self) -> &CodebaseId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn languages(&self) -> &LanguageSet {
        &self.languages
    }

    pub fn sources(&self) -> &[SourceFile] {
        &self.sources
    }

    pub fn total_files(&self) -> usize {
        self.total_files
    }

    /// Sources written in any of `languages`.
    pub fn sources_in<'a, 'b>(
        &'a self,
        languages: &'b [Language],
    ) -> impl Iterator<Item = &'a SourceFile> + 'b
    where
        'a: 'b,
    {
        self.sources
            .iter()
            .filter(move |s| languages.contains(&s.language))
    }

    pub fn code_lines(&self) -> u64 {
        self.sources.iter().map(SourceFile::code_lines).sum()
    }
}

fn read_source(path: &Path, max_bytes: u64) -> Option<String> {
    let len = std::fs::metadata(path).ok()?.len();
    if len > max_bytes {
        return None;
    }
    std::fs::read_to_string(path).ok()
}
