//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `odf-adapters` crate provides implementations.

use std::path::{Path, PathBuf};

use crate::error::OdfResult;

/// Housekeeping entries never copied out of a template tree.
pub const IGNORE_PATTERNS: [&str; 5] = ["__pycache__", ".DS_Store", ".gitkeep", ".venv", "venv"];

/// Entry names skipped by [`Filesystem::copy_tree`], matched at every depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFilter {
    names: Vec<String>,
}

impl CopyFilter {
    /// Skip only [`IGNORE_PATTERNS`].
    pub fn housekeeping() -> Self {
        Self {
            names: IGNORE_PATTERNS.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Also skip entries called `name`.
    #[must_use]
    pub fn and(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn skips(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

impl Default for CopyFilter {
    fn default() -> Self {
        Self::housekeeping()
    }
}

/// Port for filesystem operations.
///
/// Implemented by:
/// - `odf_adapters::filesystem::LocalFilesystem` (production)
/// - `odf_adapters::filesystem::MemoryFilesystem` (testing)
///
/// Listing operations return paths sorted by name so that every merge is
/// deterministic.
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> OdfResult<()>;

    /// Write content to a file, replacing it.
    fn write_file(&self, path: &Path, content: &str) -> OdfResult<()>;

    fn read_to_string(&self, path: &Path) -> OdfResult<String>;

    /// Set file permissions.
    fn set_permissions(&self, path: &Path, executable: bool) -> OdfResult<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn remove_file(&self, path: &Path) -> OdfResult<()>;

    /// Remove a directory and all contents.
    fn remove_dir_all(&self, path: &Path) -> OdfResult<()>;

    /// Copy one file. The destination's parent must exist.
    fn copy_file(&self, from: &Path, to: &Path) -> OdfResult<()>;

    /// Recursively copy `from` into `to`, merging into existing directories.
    fn copy_tree(&self, from: &Path, to: &Path, filter: &CopyFilter) -> OdfResult<()>;

    /// Direct children of a directory.
    fn list_dir(&self, path: &Path) -> OdfResult<Vec<PathBuf>>;

    /// Every file below `root`, recursively.
    fn walk_files(&self, root: &Path) -> OdfResult<Vec<PathBuf>>;

    fn rename(&self, from: &Path, to: &Path) -> OdfResult<()>;
}

/// Port for sampling tabular sources.
#[cfg_attr(test, mockall::automock)]
pub trait SchemaReader: Send + Sync {
    /// The header zipped with the first data record, in header order.
    ///
    /// `None` when the source has a header but no data row.
    fn first_record(&self, text: &str) -> OdfResult<Option<Vec<(String, String)>>>;
}

/// Port for the container orchestration CLI.
#[cfg_attr(test, mockall::automock)]
pub trait ContainerRuntime: Send + Sync {
    /// Run one compose subcommand in `workdir`, e.g. `["--profile", "api", "build"]`.
    fn compose(&self, workdir: &Path, args: &[String]) -> OdfResult<()>;
}
