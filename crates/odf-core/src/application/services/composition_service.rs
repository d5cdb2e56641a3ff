//! Composition Service - turns a settings document into a platform tree.
//!
//! `create` runs three stages in order:
//! 1. Layout: seed the project root with the layout's directories
//! 2. Materialize: one [`Materializer`] per catalog component
//! 3. Collect: merge every copied fragment into the platform artifacts
//!
//! There is no rollback. A failure leaves whatever was written so far, and a
//! rerun stops at the first destination that already exists.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::{
    application::{
        ApplicationError,
        ports::{CopyFilter, Filesystem},
        services::{
            materializers::{MaterializeContext, PLATFORM_DIR, materializer},
            project_service::{DATA_DIR, read_settings},
        },
    },
    domain::{
        Catalog, ComposeManifest, Layer, Layout, Role, ScriptArtifact, Settings, Substitutions,
    },
    error::OdfResult,
};

const README: &str = "README.md";
const LAYOUTS_DIR: &str = "layouts";
const RAW_DIR: &str = "raw";

/// What a `create` run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositionReport {
    /// Materialized component subtrees, in catalog order.
    pub components: Vec<PathBuf>,
    /// Merged platform artifacts and files copied to the project root.
    pub artifacts: Vec<PathBuf>,
}

pub struct CompositionService {
    filesystem: Box<dyn Filesystem>,
    catalog: Catalog,
}

impl CompositionService {
    pub fn new(filesystem: Box<dyn Filesystem>, catalog: Catalog) -> Self {
        Self {
            filesystem,
            catalog,
        }
    }

    /// Build `root/platform` from `root/settings.json` and the template tree
    /// at `templates`.
    #[instrument(skip_all, fields(root = %root.display(), templates = %templates.display()))]
    pub fn create(&self, root: &Path, templates: &Path) -> OdfResult<CompositionReport> {
        let settings = read_settings(self.filesystem.as_ref(), root)?;
        if !self.filesystem.is_dir(templates) {
            return Err(ApplicationError::NotFound {
                path: templates.to_path_buf(),
            }
            .into());
        }

        self.apply_layout(root, templates, settings.layout())?;

        let platform = root.join(PLATFORM_DIR);
        self.filesystem.create_dir_all(&platform)?;

        let ctx = MaterializeContext {
            filesystem: self.filesystem.as_ref(),
            catalog: &self.catalog,
            settings: &settings,
            templates,
            platform: &platform,
        };
        let mut report = CompositionReport::default();
        for def in self.catalog.components() {
            report
                .components
                .extend(materializer(def.component).materialize(&ctx)?);
        }

        report.artifacts = self.collect(root, templates, &settings)?;
        info!(
            components = report.components.len(),
            artifacts = report.artifacts.len(),
            "platform created"
        );
        Ok(report)
    }

    /// Copy the layout tree into `root` and move the seeded sources into
    /// `data/raw`. The custom layout adds nothing.
    #[instrument(skip(self, root, templates))]
    fn apply_layout(&self, root: &Path, templates: &Path, layout: Layout) -> OdfResult<()> {
        if layout == Layout::Custom {
            return Ok(());
        }

        let from = templates.join(LAYOUTS_DIR).join(layout.as_str());
        if !self.filesystem.is_dir(&from) {
            return Err(ApplicationError::NotFound { path: from }.into());
        }

        self.filesystem
            .copy_tree(&from, root, &CopyFilter::housekeeping().and(DATA_DIR))?;

        let data = root.join(DATA_DIR);
        let layout_data = from.join(DATA_DIR);
        if self.filesystem.is_dir(&layout_data) {
            self.filesystem
                .copy_tree(&layout_data, &data, &CopyFilter::housekeeping())?;
        }

        let raw = data.join(RAW_DIR);
        self.filesystem.create_dir_all(&raw)?;
        for source in self.filesystem.list_dir(&data)? {
            if self.filesystem.is_dir(&source) || !source.extension().is_some_and(|ext| ext == "csv") {
                continue;
            }
            let Some(file_name) = source.file_name() else {
                continue;
            };
            let target = raw.join(file_name);
            self.filesystem.rename(&source, &target)?;
            info!(file = %source.display(), to = %target.display(), "moved");
        }

        info!(%layout, "layout created");
        Ok(())
    }

    /// Merge base artifacts with every layer and component fragment.
    #[instrument(skip_all)]
    fn collect(&self, root: &Path, templates: &Path, settings: &Settings) -> OdfResult<Vec<PathBuf>> {
        let platform = root.join(PLATFORM_DIR);
        let project = settings.project();
        let mut written = Vec::new();

        for role in Role::SCRIPTED
            .into_iter()
            .filter(Role::is_shell_script)
            .chain([Role::Deployment])
        {
            self.copy_new(&templates.join(role.file_name()), &platform.join(role.file_name()))?;
        }

        let requirements = root.join(Role::Dependencies.file_name());
        let base_requirements = self.read(&templates.join(Role::Dependencies.file_name()))?;
        let mut dependencies = if self.filesystem.exists(&requirements) {
            ScriptArtifact::headerless(&self.filesystem.read_to_string(&requirements)?)
        } else {
            ScriptArtifact::default()
        };
        dependencies.append(&base_requirements);

        let readme = root.join(README);
        if self.filesystem.exists(&readme) {
            return Err(ApplicationError::AlreadyExists { path: readme }.into());
        }
        let text = Substitutions::new(project).apply(&self.read(&templates.join(README))?);
        self.filesystem.write_file(&readme, &text)?;
        written.push(readme);

        let mut scripts = BTreeMap::new();
        for role in Role::SCRIPTED.into_iter().filter(Role::is_shell_script) {
            let text = self.filesystem.read_to_string(&platform.join(role.file_name()))?;
            scripts.insert(role, ScriptArtifact::parse(&text));
        }
        scripts.insert(Role::Dependencies, dependencies);

        let mut manifest =
            ComposeManifest::parse(&self.filesystem.read_to_string(&platform.join(Role::Deployment.file_name()))?)?;
        let mut consumed = Vec::new();

        for layer_def in self.catalog.layers() {
            let layer = layer_def.layer;
            let target = platform.join(layer.as_str());
            if !layer_def.merges_fragments || !self.filesystem.is_dir(&target) {
                continue;
            }

            let source = templates.join(layer.as_str());
            if !self.filesystem.is_dir(&source) {
                return Err(ApplicationError::NotFound { path: source }.into());
            }

            for file_name in layer_def.root_files {
                let to = root.join(file_name);
                self.copy_new(&source.join(file_name), &to)?;
                written.push(to);
            }

            let fragments = self.component_fragments(&target)?;

            for (role, artifact) in scripts.iter_mut() {
                let mut blocks = Vec::new();
                let layer_fragment = source.join(role.file_name());
                if self.filesystem.exists(&layer_fragment) {
                    blocks.push(self.filesystem.read_to_string(&layer_fragment)?);
                }
                for path in fragments.get(role).into_iter().flatten() {
                    blocks.push(self.filesystem.read_to_string(path)?);
                }

                let prelude = layer == Layer::Storage && *role == Role::Setup;
                for block in &blocks {
                    if prelude {
                        artifact.splice_prelude(block);
                    } else {
                        artifact.append(block);
                    }
                }
                if !blocks.is_empty() {
                    debug!(%layer, %role, fragments = blocks.len(), "merged");
                }
            }

            for path in fragments.get(&Role::Deployment).into_iter().flatten() {
                let fragment = ComposeManifest::parse(&self.filesystem.read_to_string(path)?)?;
                manifest.merge_fragment(fragment)?;
                debug!(%layer, fragment = %path.display(), "compose fragment merged");
            }

            consumed.extend(fragments.into_values().flatten());
        }

        for path in &consumed {
            self.filesystem.remove_file(path)?;
        }
        debug!(count = consumed.len(), "consumed fragments removed");

        manifest.with_project_network(project);
        manifest.substitute(&Substitutions::new(project));
        let compose = platform.join(Role::Deployment.file_name());
        self.filesystem.write_file(&compose, &manifest.render()?)?;
        written.push(compose);

        let subs = Substitutions::new(project);
        for (role, artifact) in &scripts {
            let path = match role {
                Role::Dependencies => requirements.clone(),
                _ => platform.join(role.file_name()),
            };
            self.filesystem.write_file(&path, &subs.apply(&artifact.render()))?;
            if role.is_shell_script() {
                self.filesystem.set_permissions(&path, true)?;
            }
            written.push(path);
        }

        Ok(written)
    }

    /// Fragment files inside the component subtrees of a layer, by role.
    /// Files sitting directly in the layer directory are not fragments.
    fn component_fragments(&self, layer_dir: &Path) -> OdfResult<BTreeMap<Role, Vec<PathBuf>>> {
        let mut fragments: BTreeMap<Role, Vec<PathBuf>> = BTreeMap::new();
        for path in self.filesystem.walk_files(layer_dir)? {
            if path.parent() == Some(layer_dir) {
                continue;
            }
            let role = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(Role::from_file_name);
            if let Some(role) = role {
                fragments.entry(role).or_default().push(path);
            }
        }
        Ok(fragments)
    }

    fn read(&self, path: &Path) -> OdfResult<String> {
        if !self.filesystem.exists(path) {
            return Err(ApplicationError::NotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        self.filesystem.read_to_string(path)
    }

    /// Copy one file; the source must exist and the destination must not.
    fn copy_new(&self, from: &Path, to: &Path) -> OdfResult<()> {
        if !self.filesystem.exists(from) {
            return Err(ApplicationError::NotFound {
                path: from.to_path_buf(),
            }
            .into());
        }
        if self.filesystem.exists(to) {
            return Err(ApplicationError::AlreadyExists {
                path: to.to_path_buf(),
            }
            .into());
        }
        self.filesystem.copy_file(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockFilesystem;
    use crate::domain::Identifier;
    use crate::error::OdfError;
    use mockall::predicate::*;

    #[test]
    fn create_requires_settings() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().returning(|_| false);

        let service = CompositionService::new(Box::new(fs), Catalog::builtin());
        let err = service
            .create(Path::new("/p"), Path::new("/templates"))
            .unwrap_err();
        assert!(matches!(
            err,
            OdfError::Application(ApplicationError::NotFound { ref path })
                if path == Path::new("/p/settings.json")
        ));
    }

    #[test]
    fn create_requires_template_tree() {
        let json = Settings::new(Identifier::parse("demo").unwrap())
            .to_json()
            .unwrap();

        let mut fs = MockFilesystem::new();
        fs.expect_exists().returning(|_| true);
        fs.expect_read_to_string()
            .returning(move |_| Ok(json.clone()));
        fs.expect_is_dir().returning(|_| false);
        fs.expect_create_dir_all().never();

        let service = CompositionService::new(Box::new(fs), Catalog::builtin());
        let err = service
            .create(Path::new("/p"), Path::new("/templates"))
            .unwrap_err();
        assert!(matches!(
            err,
            OdfError::Application(ApplicationError::NotFound { ref path })
                if path == Path::new("/templates")
        ));
    }

    #[test]
    fn fragments_are_grouped_by_role_below_component_dirs() {
        let mut fs = MockFilesystem::new();
        fs.expect_walk_files()
            .with(eq(Path::new("/p/platform/api")))
            .returning(|_| {
                Ok(vec![
                    PathBuf::from("/p/platform/api/setup.sh"),
                    PathBuf::from("/p/platform/api/api-postgres/events/app/main.py"),
                    PathBuf::from("/p/platform/api/api-postgres/events/docker-compose.yaml"),
                    PathBuf::from("/p/platform/api/api-postgres/orders/docker-compose.yaml"),
                ])
            });

        let service = CompositionService::new(Box::new(fs), Catalog::builtin());
        let fragments = service
            .component_fragments(Path::new("/p/platform/api"))
            .unwrap();

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[&Role::Deployment].len(), 2);
    }

    #[test]
    fn custom_layout_touches_nothing() {
        let fs = MockFilesystem::new();
        let service = CompositionService::new(Box::new(fs), Catalog::builtin());
        service
            .apply_layout(Path::new("/p"), Path::new("/templates"), Layout::Custom)
            .unwrap();
    }

    #[test]
    fn research_layout_moves_sources_into_raw() {
        let mut fs = MockFilesystem::new();
        fs.expect_is_dir().returning(|path| {
            matches!(
                path.to_str(),
                Some("/t/layouts/research" | "/t/layouts/research/data" | "/p/data/raw")
            )
        });
        fs.expect_copy_tree()
            .with(eq(Path::new("/t/layouts/research")), eq(Path::new("/p")), always())
            .times(1)
            .returning(|_, _, filter| {
                assert!(filter.skips("data"));
                Ok(())
            });
        fs.expect_copy_tree()
            .with(
                eq(Path::new("/t/layouts/research/data")),
                eq(Path::new("/p/data")),
                always(),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_list_dir().returning(|_| {
            Ok(vec![
                PathBuf::from("/p/data/events.csv"),
                PathBuf::from("/p/data/raw"),
            ])
        });
        fs.expect_rename()
            .with(
                eq(Path::new("/p/data/events.csv")),
                eq(Path::new("/p/data/raw/events.csv")),
            )
            .times(1)
            .returning(|_, _| Ok(()));

        let service = CompositionService::new(Box::new(fs), Catalog::builtin());
        service
            .apply_layout(Path::new("/p"), Path::new("/t"), Layout::Research)
            .unwrap();
    }
}
