//! Application layer errors.
//!
//! These errors represent failures in orchestration, not business logic.
//! Business logic errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// The engine never overwrites silently.
    #[error("{path} already exists")]
    AlreadyExists { path: PathBuf },

    #[error("{path} does not exist")]
    NotFound { path: PathBuf },

    /// The data directory holds no tabular sources.
    #[error("no CSV data sources found in {path}")]
    NoDataSources { path: PathBuf },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// In-memory store access failed (lock poisoned).
    #[error("Filesystem store lock poisoned")]
    StoreLockError,

    /// An external program could not be run or exited unsuccessfully.
    #[error("`{command}` failed: {reason}")]
    ExternalCommand { command: String, reason: String },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::AlreadyExists { path } => vec![
                format!("Remove or move {} and run the command again", path.display()),
                "Generated files are never overwritten".into(),
            ],
            Self::NotFound { path } => vec![
                format!("Check that {} exists", path.display()),
                "Run `odf init` before `odf create`, and `odf create` before `odf compose`".into(),
            ],
            Self::NoDataSources { path } => vec![
                format!("Put at least one .csv file into {}", path.display()),
                "Or point --data at a directory containing CSV files".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::StoreLockError => vec!["Try again in a moment".into()],
            Self::ExternalCommand { .. } => vec![
                "Check that Docker is installed and the daemon is running".into(),
                "Run `docker compose version` to verify the compose plugin".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AlreadyExists { .. } => ErrorCategory::Conflict,
            Self::NotFound { .. } | Self::NoDataSources { .. } => ErrorCategory::NotFound,
            Self::FilesystemError { .. } | Self::StoreLockError | Self::ExternalCommand { .. } => {
                ErrorCategory::Internal
            }
        }
    }
}
