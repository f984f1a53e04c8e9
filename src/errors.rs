//! Run-level error types.
//!
//! Only two families of failure abort a comparison: configuration problems
//! detected before any plugin runs (including missing or empty codebase
//! paths) and the absence of any usable signal after exclusions. Plugin
//! failures never surface here; they are embedded in the report.
//!
//! # Error Codes
//!
//! - E001-E009: filesystem errors
//! - E020-E029: configuration errors
//! - E030-E039: aggregation errors
//! - E060: cancellation

use crate::core::Dimension;
use serde::Serialize;
use std::path::PathBuf;

/// Structured error code for documentation and programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorCode(&'static str);

impl ErrorCode {
    /// Filesystem error - path missing
    pub const FS_NOT_FOUND: ErrorCode = ErrorCode("E001");
    /// Filesystem error - path is not a directory
    pub const FS_NOT_A_DIRECTORY: ErrorCode = ErrorCode("E002");
    /// Filesystem error - generic
    pub const FS_GENERIC: ErrorCode = ErrorCode("E009");

    /// Config error - invalid value
    pub const CONFIG_INVALID: ErrorCode = ErrorCode("E020");
    /// Config error - empty codebase
    pub const CONFIG_EMPTY_CODEBASE: ErrorCode = ErrorCode("E021");
    /// Config error - config file unreadable
    pub const CONFIG_FILE: ErrorCode = ErrorCode("E022");
    /// Config error - no plugin left after resolution
    pub const CONFIG_NO_PLUGINS: ErrorCode = ErrorCode("E023");

    /// Aggregation error - no dimension could be scored
    pub const AGGREGATION_NO_SIGNAL: ErrorCode = ErrorCode("E030");

    /// Run cancelled by the caller
    pub const CANCELLED: ErrorCode = ErrorCode("E060");

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal failure of a comparison run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompareError {
    #[error("[{code}] configuration error: {message}")]
    Configuration {
        code: ErrorCode,
        message: String,
        field: Option<String>,
    },

    #[error("[{code}] filesystem error at {}: {message}", .path.display())]
    Filesystem {
        code: ErrorCode,
        message: String,
        path: PathBuf,
    },

    #[error("[{}] no usable signal: every dimension was unavailable ({})", ErrorCode::AGGREGATION_NO_SIGNAL, join_dimensions(.unavailable))]
    NoUsableSignal { unavailable: Vec<Dimension> },

    #[error("[{}] run cancelled", ErrorCode::CANCELLED)]
    Cancelled,
}

fn join_dimensions(dims: &[Dimension]) -> String {
    if dims.is_empty() {
        return "none active".to_string();
    }
    dims.iter()
        .map(Dimension::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl CompareError {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            code: ErrorCode::CONFIG_INVALID,
            message: message.into(),
            field: None,
        }
    }

    #[must_use]
    pub fn config_with_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Configuration {
            code: ErrorCode::CONFIG_INVALID,
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Collapse several validation messages into one configuration error.
    #[must_use]
    pub fn config_validations(errors: Vec<String>) -> Self {
        Self::Configuration {
            code: ErrorCode::CONFIG_INVALID,
            message: errors.join("; "),
            field: None,
        }
    }

    #[must_use]
    pub fn config_file(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::Configuration {
            code: ErrorCode::CONFIG_FILE,
            message: format!("{}: {}", path.display(), message.into()),
            field: None,
        }
    }

    #[must_use]
    pub fn empty_codebase(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::Configuration {
            code: ErrorCode::CONFIG_EMPTY_CODEBASE,
            message: format!("codebase {} contains no files", path.display()),
            field: None,
        }
    }

    #[must_use]
    pub fn no_plugins() -> Self {
        Self::Configuration {
            code: ErrorCode::CONFIG_NO_PLUGINS,
            message: "no benchmark plugin remains active after applying skip list and language filter"
                .to_string(),
            field: None,
        }
    }

    #[must_use]
    pub fn filesystem(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Filesystem {
            code: ErrorCode::FS_GENERIC,
            message: message.into(),
            path: path.into(),
        }
    }

    #[must_use]
    pub fn from_io_error(err: &std::io::Error, path: impl Into<PathBuf>) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FS_NOT_FOUND,
            _ => ErrorCode::FS_GENERIC,
        };
        Self::Filesystem {
            code,
            message: err.to_string(),
            path: path.into(),
        }
    }

    #[must_use]
    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::Filesystem {
            code: ErrorCode::FS_NOT_A_DIRECTORY,
            message: "codebase path must be a directory".to_string(),
            path: path.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration { code, .. } => *code,
            Self::Filesystem { code, .. } => *code,
            Self::NoUsableSignal { .. } => ErrorCode::AGGREGATION_NO_SIGNAL,
            Self::Cancelled => ErrorCode::CANCELLED,
        }
    }

    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "Config",
            Self::Filesystem { .. } => "Filesystem",
            Self::NoUsableSignal { .. } => "Aggregation",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Whether the caller can fix the problem by changing inputs.
    #[must_use]
    pub fn is_user_fixable(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Filesystem { .. })
    }
}

/// Persistence failure. Logged by the orchestrator, never fatal to a run.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
}
