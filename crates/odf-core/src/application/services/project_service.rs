//! Project Service - workspace preparation and settings persistence.
//!
//! Covers the first half of the pipeline:
//! 1. Create the project directory and seed `data/` with CSV sources
//! 2. Turn every source into an entity draft with default names
//! 3. Sample each source and build its `EntityModel`
//! 4. Persist / load `settings.json`

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{Filesystem, SchemaReader},
    },
    domain::{DomainError, EntityModel, Identifier, Profile, SETTINGS_FILE, Settings},
    error::{OdfError, OdfResult},
};

/// Directory, under the project root, holding the tabular sources.
pub const DATA_DIR: &str = "data";

const SOURCE_EXTENSION: &str = "csv";

/// A discovered data source with proposed entity naming, editable before the
/// entity is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDraft {
    pub source: PathBuf,
    pub name: String,
    pub plural_name: String,
    pub description: String,
}

impl EntityDraft {
    /// File name of the source, for display.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub struct ProjectService {
    filesystem: Box<dyn Filesystem>,
    reader: Box<dyn SchemaReader>,
}

impl ProjectService {
    pub fn new(filesystem: Box<dyn Filesystem>, reader: Box<dyn SchemaReader>) -> Self {
        Self { filesystem, reader }
    }

    /// `<parent>/<project>`.
    pub fn project_root(parent: &Path, project: &Identifier) -> PathBuf {
        parent.join(project.as_str())
    }

    /// Create the project directory and, on first run, seed `data/` with every
    /// CSV file of `data_source`.
    #[instrument(skip_all, fields(project = %project, parent = %parent.display()))]
    pub fn prepare_workspace(
        &self,
        parent: &Path,
        project: &Identifier,
        data_source: &Path,
    ) -> OdfResult<PathBuf> {
        if !self.filesystem.is_dir(parent) {
            return Err(ApplicationError::NotFound {
                path: parent.to_path_buf(),
            }
            .into());
        }

        let root = Self::project_root(parent, project);
        if !self.filesystem.exists(&root) {
            self.filesystem.create_dir_all(&root)?;
            info!(path = %root.display(), "created");
        }

        let data = root.join(DATA_DIR);
        if self.filesystem.exists(&data) {
            debug!(path = %data.display(), "data directory already present");
            return Ok(root);
        }

        if !self.filesystem.is_dir(data_source) {
            return Err(ApplicationError::NotFound {
                path: data_source.to_path_buf(),
            }
            .into());
        }

        self.filesystem.create_dir_all(&data)?;
        info!(path = %data.display(), "created");

        for source in self.csv_files(data_source)? {
            let Some(file_name) = source.file_name() else {
                continue;
            };
            let target = data.join(file_name);
            if self.filesystem.exists(&target) {
                return Err(ApplicationError::AlreadyExists { path: target }.into());
            }
            self.filesystem.copy_file(&source, &target)?;
            info!(file = %target.display(), "copied");
        }

        Ok(root)
    }

    /// Every `data/*.csv` under `root`, in name order, with default naming
    /// for `profile`.
    #[instrument(skip(self), fields(root = %root.display()))]
    pub fn discover_sources(&self, root: &Path, profile: Profile) -> OdfResult<Vec<EntityDraft>> {
        let data = root.join(DATA_DIR);
        if !self.filesystem.is_dir(&data) {
            return Err(ApplicationError::NotFound { path: data }.into());
        }

        let definition = profile.definition();
        let drafts: Vec<EntityDraft> = self
            .csv_files(&data)?
            .into_iter()
            .filter_map(|source| {
                let stem = source.file_stem()?.to_string_lossy().into_owned();
                let (name, plural_name) = definition.names_for(&stem);
                let description = definition.description_for(&plural_name);
                Some(EntityDraft {
                    source,
                    name,
                    plural_name,
                    description,
                })
            })
            .collect();

        if drafts.is_empty() {
            return Err(ApplicationError::NoDataSources { path: data }.into());
        }
        debug!(count = drafts.len(), "data sources discovered");
        Ok(drafts)
    }

    /// Validate the draft's names and sample its source.
    ///
    /// A source without data rows is reported as a warning and yields an
    /// entity with no fields.
    #[instrument(skip_all, fields(source = %draft.source.display()))]
    pub fn build_entity(&self, draft: &EntityDraft) -> OdfResult<EntityModel> {
        let mut entity = EntityModel::new(&draft.name, &draft.plural_name, &draft.source)?
            .with_description(draft.description.clone());

        let text = self.filesystem.read_to_string(&draft.source)?;
        let record = self.reader.first_record(&text)?;

        match entity.read_schema(record) {
            Ok(()) => debug!(fields = entity.fields().len(), "schema inferred"),
            Err(err @ DomainError::EmptySource { .. }) => warn!("{err}"),
            Err(err) => return Err(err.into()),
        }
        Ok(entity)
    }

    /// Write `settings.json` into `root`. Never overwrites.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn persist(&self, root: &Path, settings: &Settings) -> OdfResult<PathBuf> {
        let path = root.join(SETTINGS_FILE);
        if self.filesystem.exists(&path) {
            return Err(ApplicationError::AlreadyExists { path }.into());
        }
        self.filesystem.write_file(&path, &settings.to_json()?)?;
        info!(path = %path.display(), "created");
        Ok(path)
    }

    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn load(&self, root: &Path) -> OdfResult<Settings> {
        read_settings(self.filesystem.as_ref(), root)
    }

    /// Fail early when `root` already holds a settings document.
    pub fn ensure_not_initialized(&self, root: &Path) -> OdfResult<()> {
        let path = root.join(SETTINGS_FILE);
        if self.filesystem.exists(&path) {
            return Err(ApplicationError::AlreadyExists { path }.into());
        }
        Ok(())
    }

    fn csv_files(&self, dir: &Path) -> OdfResult<Vec<PathBuf>> {
        Ok(self
            .filesystem
            .list_dir(dir)?
            .into_iter()
            .filter(|path| {
                path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
                    && !self.filesystem.is_dir(path)
            })
            .collect())
    }
}

/// Read and validate `root/settings.json`.
pub(crate) fn read_settings(filesystem: &dyn Filesystem, root: &Path) -> OdfResult<Settings> {
    let path = root.join(SETTINGS_FILE);
    if !filesystem.exists(&path) {
        return Err(ApplicationError::NotFound { path }.into());
    }
    let text = filesystem.read_to_string(&path)?;
    Settings::from_json(&text).map_err(OdfError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockFilesystem, MockSchemaReader};
    use crate::domain::{FieldType, Layout};
    use mockall::predicate::*;

    fn pairs(items: &[(&str, &str)]) -> Option<Vec<(String, String)>> {
        Some(
            items
                .iter()
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn prepare_workspace_requires_existing_parent() {
        let mut fs = MockFilesystem::new();
        fs.expect_is_dir().returning(|_| false);

        let service = ProjectService::new(Box::new(fs), Box::new(MockSchemaReader::new()));
        let err = service
            .prepare_workspace(
                Path::new("/missing"),
                &Identifier::parse("demo").unwrap(),
                Path::new("/data"),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            OdfError::Application(ApplicationError::NotFound { .. })
        ));
    }

    #[test]
    fn prepare_workspace_copies_only_csv_files() {
        let mut fs = MockFilesystem::new();
        fs.expect_is_dir()
            .returning(|path| matches!(path.to_str(), Some("/work" | "/src")));
        fs.expect_exists().returning(|_| false);
        fs.expect_create_dir_all().times(2).returning(|_| Ok(()));
        fs.expect_list_dir()
            .with(eq(Path::new("/src")))
            .returning(|_| {
                Ok(vec![
                    PathBuf::from("/src/events.csv"),
                    PathBuf::from("/src/notes.txt"),
                ])
            });
        fs.expect_copy_file()
            .with(
                eq(Path::new("/src/events.csv")),
                eq(Path::new("/work/demo/data/events.csv")),
            )
            .times(1)
            .returning(|_, _| Ok(()));

        let service = ProjectService::new(Box::new(fs), Box::new(MockSchemaReader::new()));
        let root = service
            .prepare_workspace(
                Path::new("/work"),
                &Identifier::parse("demo").unwrap(),
                Path::new("/src"),
            )
            .unwrap();
        assert_eq!(root, PathBuf::from("/work/demo"));
    }

    #[test]
    fn discover_sources_fails_without_csv() {
        let mut fs = MockFilesystem::new();
        fs.expect_is_dir()
            .returning(|path| path == Path::new("/p/data"));
        fs.expect_list_dir()
            .returning(|_| Ok(vec![PathBuf::from("/p/data/readme.md")]));

        let service = ProjectService::new(Box::new(fs), Box::new(MockSchemaReader::new()));
        let err = service
            .discover_sources(Path::new("/p"), Profile::Custom)
            .unwrap_err();
        assert!(matches!(
            err,
            OdfError::Application(ApplicationError::NoDataSources { .. })
        ));
    }

    #[test]
    fn discover_sources_proposes_names() {
        let mut fs = MockFilesystem::new();
        fs.expect_is_dir()
            .returning(|path| path == Path::new("/p/data"));
        fs.expect_list_dir().returning(|_| {
            Ok(vec![
                PathBuf::from("/p/data/events.csv"),
                PathBuf::from("/p/data/glass.csv"),
            ])
        });

        let service = ProjectService::new(Box::new(fs), Box::new(MockSchemaReader::new()));
        let drafts = service
            .discover_sources(Path::new("/p"), Profile::Research)
            .unwrap();

        assert_eq!(drafts[0].name, "event");
        assert_eq!(drafts[0].plural_name, "events");
        assert_eq!(drafts[0].description, "events research");
        assert_eq!(drafts[1].plural_name, "glass");
        assert_eq!(drafts[1].file_name(), "glass.csv");
    }

    #[test]
    fn build_entity_samples_first_record() {
        let mut fs = MockFilesystem::new();
        fs.expect_read_to_string()
            .returning(|_| Ok("id,logged_at\n1,2024-01-01 00:00:00\n".into()));
        let mut reader = MockSchemaReader::new();
        reader
            .expect_first_record()
            .returning(|_| Ok(pairs(&[("id", "1"), ("logged_at", "2024-01-01 00:00:00")])));

        let service = ProjectService::new(Box::new(fs), Box::new(reader));
        let entity = service
            .build_entity(&EntityDraft {
                source: PathBuf::from("/p/data/events.csv"),
                name: "Event".into(),
                plural_name: "events".into(),
                description: String::new(),
            })
            .unwrap();

        assert_eq!(entity.name().as_str(), "event");
        assert_eq!(entity.fields().get("id").unwrap().field_type, FieldType::Int);
    }

    #[test]
    fn build_entity_tolerates_empty_source() {
        let mut fs = MockFilesystem::new();
        fs.expect_read_to_string().returning(|_| Ok("id\n".into()));
        let mut reader = MockSchemaReader::new();
        reader.expect_first_record().returning(|_| Ok(None));

        let service = ProjectService::new(Box::new(fs), Box::new(reader));
        let entity = service
            .build_entity(&EntityDraft {
                source: PathBuf::from("/p/data/empty.csv"),
                name: "empty".into(),
                plural_name: "empties".into(),
                description: String::new(),
            })
            .unwrap();
        assert!(entity.fields().is_empty());
    }

    #[test]
    fn build_entity_rejects_invalid_name_before_reading() {
        let fs = MockFilesystem::new();
        let service = ProjectService::new(Box::new(fs), Box::new(MockSchemaReader::new()));
        let err = service
            .build_entity(&EntityDraft {
                source: PathBuf::from("/p/data/x.csv"),
                name: "not valid".into(),
                plural_name: "xs".into(),
                description: String::new(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            OdfError::Domain(DomainError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn persist_never_overwrites() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().returning(|_| true);
        fs.expect_write_file().never();

        let service = ProjectService::new(Box::new(fs), Box::new(MockSchemaReader::new()));
        let settings = Settings::new(Identifier::parse("demo").unwrap());
        let err = service.persist(Path::new("/p"), &settings).unwrap_err();
        assert!(matches!(
            err,
            OdfError::Application(ApplicationError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn load_reports_missing_settings() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().returning(|_| false);

        let service = ProjectService::new(Box::new(fs), Box::new(MockSchemaReader::new()));
        assert!(matches!(
            service.load(Path::new("/p")),
            Err(OdfError::Application(ApplicationError::NotFound { .. }))
        ));
    }

    #[test]
    fn load_parses_persisted_document() {
        let settings = Settings::new(Identifier::parse("demo").unwrap());
        let json = settings.to_json().unwrap();

        let mut fs = MockFilesystem::new();
        fs.expect_exists().returning(|_| true);
        fs.expect_read_to_string()
            .with(eq(Path::new("/p/settings.json")))
            .returning(move |_| Ok(json.clone()));

        let service = ProjectService::new(Box::new(fs), Box::new(MockSchemaReader::new()));
        let loaded = service.load(Path::new("/p")).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.layout(), Layout::Custom);
    }
}
