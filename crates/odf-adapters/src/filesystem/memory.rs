//! In-memory filesystem adapter for testing.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use odf_core::{
    application::{
        ApplicationError,
        ports::{CopyFilter, Filesystem},
    },
    error::OdfResult,
};

/// In-memory filesystem for testing.
///
/// Clones share the same store, so a test can keep one handle and hand the
/// other to a service.
#[derive(Debug, Clone)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, String>,
    directories: BTreeSet<PathBuf>,
    executables: BTreeSet<PathBuf>,
}

impl MemoryFilesystemInner {
    fn add_dir_all(&mut self, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            self.directories.insert(current.clone());
        }
    }

    fn check_parent(&self, path: &Path) -> OdfResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !self.directories.contains(parent) {
                return Err(ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "Parent directory does not exist".into(),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryFilesystemInner::default())),
        }
    }

    /// Seed a file, creating its parent directories (testing helper).
    pub fn with_file(self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            let path = path.as_ref();
            if let Some(parent) = path.parent() {
                inner.add_dir_all(parent);
            }
            inner.files.insert(path.to_path_buf(), content.into());
        }
        self
    }

    /// Read a file's content (testing helper).
    pub fn read_file(&self, path: &Path) -> Option<String> {
        let inner = self.inner.read().ok()?;
        inner.files.get(path).cloned()
    }

    /// Check if a file is marked executable.
    pub fn is_executable(&self, path: &Path) -> bool {
        self.inner
            .read()
            .is_ok_and(|inner| inner.executables.contains(path))
    }

    /// List all files.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn read_guard(&self) -> OdfResult<RwLockReadGuard<'_, MemoryFilesystemInner>> {
        self.inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError.into())
    }

    fn write_guard(&self) -> OdfResult<RwLockWriteGuard<'_, MemoryFilesystemInner>> {
        self.inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError.into())
    }
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for MemoryFilesystem {
    fn create_dir_all(&self, path: &Path) -> OdfResult<()> {
        self.write_guard()?.add_dir_all(path);
        Ok(())
    }

    fn write_file(&self, path: &Path, content: &str) -> OdfResult<()> {
        let mut inner = self.write_guard()?;
        inner.check_parent(path)?;
        inner.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> OdfResult<String> {
        self.read_guard()?.files.get(path).cloned().ok_or_else(|| {
            ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "No such file".into(),
            }
            .into()
        })
    }

    fn set_permissions(&self, path: &Path, executable: bool) -> OdfResult<()> {
        let mut inner = self.write_guard()?;

        if executable {
            inner.executables.insert(path.to_path_buf());
        } else {
            inner.executables.remove(path);
        }

        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner
            .read()
            .is_ok_and(|inner| inner.files.contains_key(path) || inner.directories.contains(path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner
            .read()
            .is_ok_and(|inner| inner.directories.contains(path))
    }

    fn remove_file(&self, path: &Path) -> OdfResult<()> {
        let mut inner = self.write_guard()?;
        if inner.files.remove(path).is_none() {
            return Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "No such file".into(),
            }
            .into());
        }
        inner.executables.remove(path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> OdfResult<()> {
        let mut inner = self.write_guard()?;

        inner.directories.retain(|p| !p.starts_with(path));
        inner.files.retain(|p, _| !p.starts_with(path));
        inner.executables.retain(|p| !p.starts_with(path));

        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> OdfResult<()> {
        let content = self.read_to_string(from)?;
        self.write_file(to, &content)
    }

    fn copy_tree(&self, from: &Path, to: &Path, filter: &CopyFilter) -> OdfResult<()> {
        let mut inner = self.write_guard()?;
        let kept = |path: &Path| -> Option<PathBuf> {
            let relative = path.strip_prefix(from).ok()?;
            let skipped = relative
                .components()
                .any(|c| c.as_os_str().to_str().is_some_and(|name| filter.skips(name)));
            (!skipped).then(|| to.join(relative))
        };

        let directories: Vec<PathBuf> = inner
            .directories
            .iter()
            .filter_map(|dir| kept(dir))
            .collect();
        let files: Vec<(PathBuf, String)> = inner
            .files
            .iter()
            .filter_map(|(path, content)| kept(path).map(|target| (target, content.clone())))
            .collect();

        inner.add_dir_all(to);
        for dir in directories {
            inner.add_dir_all(&dir);
        }
        for (path, content) in files {
            inner.files.insert(path, content);
        }
        Ok(())
    }

    fn list_dir(&self, path: &Path) -> OdfResult<Vec<PathBuf>> {
        let inner = self.read_guard()?;
        let mut children: BTreeSet<PathBuf> = inner
            .files
            .keys()
            .chain(inner.directories.iter())
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        children.remove(path);
        Ok(children.into_iter().collect())
    }

    fn walk_files(&self, root: &Path) -> OdfResult<Vec<PathBuf>> {
        let inner = self.read_guard()?;
        Ok(inner
            .files
            .keys()
            .filter(|p| p.starts_with(root))
            .cloned()
            .collect())
    }

    fn rename(&self, from: &Path, to: &Path) -> OdfResult<()> {
        let mut inner = self.write_guard()?;
        inner.check_parent(to)?;
        let content = inner.files.remove(from).ok_or_else(|| ApplicationError::FilesystemError {
            path: from.to_path_buf(),
            reason: "No such file".into(),
        })?;
        inner.files.insert(to.to_path_buf(), content);
        if inner.executables.remove(from) {
            inner.executables.insert(to.to_path_buf());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_requires_parent_directory() {
        let fs = MemoryFilesystem::new();
        assert!(fs.write_file(Path::new("/p/settings.json"), "{}").is_err());

        fs.create_dir_all(Path::new("/p")).unwrap();
        fs.write_file(Path::new("/p/settings.json"), "{}").unwrap();
        assert_eq!(fs.read_file(Path::new("/p/settings.json")).as_deref(), Some("{}"));
    }

    #[test]
    fn copy_tree_filters_and_reroots() {
        let fs = MemoryFilesystem::new()
            .with_file("/t/analytics/superset/setup.sh", "echo\n")
            .with_file("/t/analytics/superset/database/postgres/setup.sh", "db\n")
            .with_file("/t/analytics/superset/.DS_Store", "");

        fs.copy_tree(
            Path::new("/t/analytics/superset"),
            Path::new("/p/platform/analytics/superset"),
            &CopyFilter::housekeeping().and("database"),
        )
        .unwrap();

        assert!(fs.exists(Path::new("/p/platform/analytics/superset/setup.sh")));
        assert!(!fs.exists(Path::new("/p/platform/analytics/superset/database")));
        assert!(!fs.exists(Path::new("/p/platform/analytics/superset/.DS_Store")));
    }

    #[test]
    fn list_dir_and_walk_are_sorted() {
        let fs = MemoryFilesystem::new()
            .with_file("/d/b.csv", "")
            .with_file("/d/a.csv", "")
            .with_file("/d/raw/c.csv", "");

        assert_eq!(
            fs.list_dir(Path::new("/d")).unwrap(),
            vec![
                PathBuf::from("/d/a.csv"),
                PathBuf::from("/d/b.csv"),
                PathBuf::from("/d/raw")
            ]
        );
        assert_eq!(fs.walk_files(Path::new("/d")).unwrap().len(), 3);
    }

    #[test]
    fn rename_moves_content() {
        let fs = MemoryFilesystem::new().with_file("/d/a.csv", "x");
        fs.create_dir_all(Path::new("/d/raw")).unwrap();
        fs.rename(Path::new("/d/a.csv"), Path::new("/d/raw/a.csv"))
            .unwrap();

        assert!(!fs.exists(Path::new("/d/a.csv")));
        assert_eq!(fs.read_file(Path::new("/d/raw/a.csv")).as_deref(), Some("x"));
    }
}
