//! Local filesystem adapter using std::fs.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use odf_core::{
    application::{
        ApplicationError,
        ports::{CopyFilter, Filesystem},
    },
    error::{OdfError, OdfResult},
};

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn create_dir_all(&self, path: &Path) -> OdfResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn write_file(&self, path: &Path, content: &str) -> OdfResult<()> {
        std::fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn read_to_string(&self, path: &Path) -> OdfResult<String> {
        std::fs::read_to_string(path).map_err(|e| map_io_error(path, e, "read file"))
    }

    fn set_permissions(&self, path: &Path, executable: bool) -> OdfResult<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if executable {
                let metadata =
                    std::fs::metadata(path).map_err(|e| map_io_error(path, e, "get metadata"))?;
                let mut perms = metadata.permissions();
                let mode = perms.mode();
                perms.set_mode(mode | 0o111);
                std::fs::set_permissions(path, perms)
                    .map_err(|e| map_io_error(path, e, "set permissions"))?;
            }
        }
        #[cfg(windows)]
        {
            // Windows doesn't have executable bit in the same way
            let _ = executable; // Silence unused warning
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn remove_file(&self, path: &Path) -> OdfResult<()> {
        std::fs::remove_file(path).map_err(|e| map_io_error(path, e, "remove file"))
    }

    fn remove_dir_all(&self, path: &Path) -> OdfResult<()> {
        std::fs::remove_dir_all(path).map_err(|e| map_io_error(path, e, "remove directory"))
    }

    fn copy_file(&self, from: &Path, to: &Path) -> OdfResult<()> {
        std::fs::copy(from, to)
            .map(|_| ())
            .map_err(|e| map_io_error(from, e, "copy file"))
    }

    fn copy_tree(&self, from: &Path, to: &Path, filter: &CopyFilter) -> OdfResult<()> {
        let walker = WalkDir::new(from)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !skipped(entry, filter));

        for entry in walker {
            let entry = entry.map_err(|e| map_walk_error(from, e))?;
            let relative = entry
                .path()
                .strip_prefix(from)
                .map_err(|_| OdfError::Internal {
                    message: format!(
                        "failed to relativise '{}' against '{}'",
                        entry.path().display(),
                        from.display()
                    ),
                })?;
            let target = to.join(relative);

            if entry.file_type().is_dir() {
                self.create_dir_all(&target)?;
            } else {
                self.copy_file(entry.path(), &target)?;
            }
        }
        Ok(())
    }

    fn list_dir(&self, path: &Path) -> OdfResult<Vec<PathBuf>> {
        let mut children = std::fs::read_dir(path)
            .map_err(|e| map_io_error(path, e, "read directory"))?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<io::Result<Vec<_>>>()
            .map_err(|e| map_io_error(path, e, "read directory entry"))?;
        children.sort();
        Ok(children)
    }

    fn walk_files(&self, root: &Path) -> OdfResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| map_walk_error(root, e))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn rename(&self, from: &Path, to: &Path) -> OdfResult<()> {
        std::fs::rename(from, to).map_err(|e| map_io_error(from, e, "move file"))
    }
}

fn skipped(entry: &DirEntry, filter: &CopyFilter) -> bool {
    entry.file_name().to_str().is_some_and(|name| filter.skips(name))
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> OdfError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}

fn map_walk_error(root: &Path, e: walkdir::Error) -> OdfError {
    let path = e.path().unwrap_or(root).to_path_buf();
    ApplicationError::FilesystemError {
        path,
        reason: format!("directory walk error: {e}"),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("superset/database/postgres")).unwrap();
        std::fs::create_dir_all(root.join("superset/__pycache__")).unwrap();
        std::fs::write(root.join("superset/setup.sh"), "echo setup\n").unwrap();
        std::fs::write(root.join("superset/.gitkeep"), "").unwrap();
        std::fs::write(root.join("superset/__pycache__/x.pyc"), "").unwrap();
        std::fs::write(root.join("superset/database/postgres/create.sh"), "create\n").unwrap();
        dir
    }

    #[test]
    fn copy_tree_applies_filter_at_every_depth() {
        let src = tree();
        let dst = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();

        let to = dst.path().join("superset");
        fs.copy_tree(
            &src.path().join("superset"),
            &to,
            &CopyFilter::housekeeping().and("database"),
        )
        .unwrap();

        assert!(to.join("setup.sh").is_file());
        assert!(!to.join(".gitkeep").exists());
        assert!(!to.join("__pycache__").exists());
        assert!(!to.join("database").exists());
    }

    #[test]
    fn copy_tree_merges_into_existing_directories() {
        let src = tree();
        let dst = TempDir::new().unwrap();
        std::fs::write(dst.path().join("keep.txt"), "kept").unwrap();

        LocalFilesystem::new()
            .copy_tree(src.path(), dst.path(), &CopyFilter::housekeeping())
            .unwrap();

        assert!(dst.path().join("keep.txt").is_file());
        assert!(dst.path().join("superset/database/postgres/create.sh").is_file());
    }

    #[test]
    fn walk_files_is_sorted_and_recursive() {
        let src = tree();
        let files = LocalFilesystem::new().walk_files(src.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(src.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(names.first(), Some(&PathBuf::from("superset/.gitkeep")));
        assert!(names.contains(&PathBuf::from("superset/database/postgres/create.sh")));
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn list_dir_returns_direct_children() {
        let src = tree();
        let children = LocalFilesystem::new().list_dir(src.path()).unwrap();
        assert_eq!(children, vec![src.path().join("superset")]);
    }

    #[test]
    fn missing_file_maps_to_filesystem_error() {
        let err = LocalFilesystem::new()
            .read_to_string(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(
            err,
            OdfError::Application(ApplicationError::FilesystemError { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn set_permissions_marks_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let script = dir.path().join("setup.sh");
        std::fs::write(&script, "#!/bin/bash\n").unwrap();

        LocalFilesystem::new().set_permissions(&script, true).unwrap();
        let mode = std::fs::metadata(&script).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
