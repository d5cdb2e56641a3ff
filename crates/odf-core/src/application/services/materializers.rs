//! Per-component materializers.
//!
//! A materializer copies its component's template subtree into
//! `platform/<layer>/<component>` (or one subtree per entity for per-entity
//! components) and rewrites the placeholders embedded in the copied files.
//! Merging the copied fragments into platform artifacts happens later, in
//! [`CompositionService`](super::CompositionService).

use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    application::{
        ApplicationError,
        ports::{CopyFilter, Filesystem},
    },
    domain::{
        Catalog, Component, ComponentDef, ComposeManifest, DomainError, DomainResult, EntityDocument,
        Identifier, Layer, Port, Role, Settings, StatusPage, Substitutions, field::RESERVED_FIELDS,
    },
    error::{OdfError, OdfResult},
};

/// Directory, under the project root, receiving every materialized subtree.
pub const PLATFORM_DIR: &str = "platform";

const ENV_FILE: &str = ".env";

// superset
const DATABASE_DIR: &str = "database";
const CREATE_SCRIPT: &str = "create.sh";
const TABLE_TOKEN: &str = "table-name";
const EMPTY_SECRET: &str = r#"SUPERSET_SECRET_KEY="""#;

// api-postgres
const ENTITY_TOKEN: &str = "entity";
const ENTITIES_TOKEN: &str = "entities";
const ENTITY_CLASS_TOKEN: &str = "Entity";
const EXTRA_FIELDS_TOKEN: &str = "# extra fields";
const DESCRIPTION_TOKEN: &str = "description";

// devcontainers
const DEVCONTAINER_DIR: &str = ".devcontainer";
const DEVCONTAINER_FILE: &str = "devcontainer.json";

// nginx
const STATUS_PAGE: [&str; 2] = ["static", "index.html"];

/// Everything a materializer reads from.
pub struct MaterializeContext<'a> {
    pub filesystem: &'a dyn Filesystem,
    pub catalog: &'a Catalog,
    pub settings: &'a Settings,
    pub templates: &'a Path,
    pub platform: &'a Path,
}

impl<'a> MaterializeContext<'a> {
    fn definition(&self, component: Component) -> OdfResult<&'static ComponentDef> {
        self.catalog
            .component(component)
            .ok_or_else(|| OdfError::Internal {
                message: format!("component `{component}` missing from the catalog"),
            })
    }

    /// `templates/<layer>/<component>`.
    pub fn source(&self, def: &ComponentDef) -> PathBuf {
        self.templates
            .join(def.layer.as_str())
            .join(def.component.as_str())
    }

    /// `platform/<layer>/<component>`.
    pub fn destination(&self, def: &ComponentDef) -> PathBuf {
        self.platform
            .join(def.layer.as_str())
            .join(def.component.as_str())
    }

    /// Entities registering `def`, by plural name.
    pub fn entities_using(
        &self,
        def: &ComponentDef,
    ) -> impl Iterator<Item = (&'a Identifier, &'a EntityDocument)> + 'a {
        let (layer, component) = (def.layer, def.component);
        self.settings
            .entities()
            .iter()
            .filter(move |(_, entity)| entity.uses(layer, component))
    }

    fn substitutions(&self) -> Substitutions {
        Substitutions::new(self.settings.project())
    }

    /// `(catalog default, allocated)` for a singleton component.
    fn singleton_port(&self, def: &ComponentDef) -> Option<(Port, Port)> {
        def.default_port().zip(self.settings.port(def.component))
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

    fn copy_subtree(&self, def: &ComponentDef, to: &Path, filter: &CopyFilter) -> OdfResult<()> {
        let from = self.source(def);
        if !self.filesystem.is_dir(&from) {
            return Err(ApplicationError::NotFound { path: from }.into());
        }
        if self.filesystem.exists(to) {
            return Err(ApplicationError::AlreadyExists {
                path: to.to_path_buf(),
            }
            .into());
        }
        self.filesystem.copy_tree(&from, to, filter)
    }

    /// Copy a singleton's subtree once, or return `None` when no entity uses
    /// the component.
    fn copy_singleton(&self, def: &ComponentDef, filter: &CopyFilter) -> OdfResult<Option<PathBuf>> {
        if self.entities_using(def).next().is_none() {
            debug!(component = %def.component, "not used by any entity, skipped");
            return Ok(None);
        }
        let to = self.destination(def);
        self.copy_subtree(def, &to, filter)?;
        Ok(Some(to))
    }

    fn rewrite_text(&self, path: &Path, subs: &Substitutions) -> OdfResult<()> {
        let text = self.read(path)?;
        self.filesystem.write_file(path, &subs.apply(&text))
    }

    fn rewrite_manifest(
        &self,
        path: &Path,
        edit: impl FnOnce(&mut ComposeManifest) -> DomainResult<()>,
    ) -> OdfResult<()> {
        let mut manifest = ComposeManifest::parse(&self.read(path)?)?;
        edit(&mut manifest)?;
        self.filesystem.write_file(path, &manifest.render()?)
    }
}

/// Materializes one catalog component.
pub trait Materializer: Send + Sync {
    fn component(&self) -> Component;

    /// Materialize the component for every entity using it and return the
    /// created subtrees.
    fn materialize(&self, ctx: &MaterializeContext<'_>) -> OdfResult<Vec<PathBuf>>;
}

/// The materializer responsible for `component`.
pub fn materializer(component: Component) -> &'static dyn Materializer {
    match component {
        Component::Superset => &Superset,
        Component::ApiPostgres => &ApiPostgres,
        Component::Python => &Devcontainer(Component::Python),
        Component::R => &Devcontainer(Component::R),
        Component::Postgres => &Postgres,
        Component::Nginx => &Nginx,
        Component::Texlive => &Texlive,
    }
}

// ── analytics ────────────────────────────────────────────────────────────────

struct Superset;

impl Materializer for Superset {
    fn component(&self) -> Component {
        Component::Superset
    }

    fn materialize(&self, ctx: &MaterializeContext<'_>) -> OdfResult<Vec<PathBuf>> {
        let def = ctx.definition(self.component())?;
        let filter = CopyFilter::housekeeping().and(DATABASE_DIR);
        let Some(to) = ctx.copy_singleton(def, &filter)? else {
            return Ok(Vec::new());
        };

        let database = ctx.source(def).join(DATABASE_DIR);
        let setup_path = to.join(Role::Setup.file_name());
        let mut setup = ctx.read(&setup_path)?;

        for (plural_name, entity) in ctx.entities_using(def) {
            let storages: Vec<Component> = entity
                .components_in(Layer::Storage)
                .map(|(component, _)| *component)
                .collect();

            for storage in storages {
                let scripts = database.join(storage.as_str());
                let storage_setup = scripts.join(Role::Setup.file_name());
                if !ctx.filesystem.exists(&storage_setup) {
                    debug!(%storage, "no database setup for storage");
                    continue;
                }

                setup.push_str("&& ");
                setup.push_str(&ctx.read(&storage_setup)?);
                setup.push_str("&& ");
                setup.push_str(
                    &ctx.read(&scripts.join(CREATE_SCRIPT))?
                        .replace(TABLE_TOKEN, plural_name.as_str()),
                );

                let storage_def = ctx.definition(storage)?;
                if let Some((default, allocated)) = ctx.singleton_port(storage_def) {
                    setup = setup.replace(&default.to_string(), &allocated.to_string());
                }
            }
        }
        // fragments end in a line continuation; a blank line closes the chain
        setup.push('\n');

        let port = ctx.singleton_port(def);
        let mut script_subs = ctx.substitutions();
        if let Some((default, allocated)) = port.filter(|(default, allocated)| default != allocated) {
            script_subs = script_subs.literal(default.to_string(), allocated.to_string());
        }
        ctx.filesystem
            .write_file(&setup_path, &script_subs.apply(&setup))?;

        let env_path = to.join(ENV_FILE);
        let env = ctx.read(&env_path)?.replace(
            EMPTY_SECRET,
            &format!(r#"SUPERSET_SECRET_KEY="{}""#, Uuid::new_v4()),
        );
        ctx.filesystem.write_file(&env_path, &env)?;

        let mut subs = ctx.substitutions().hostname(def.component);
        if let Some((default, allocated)) = port {
            subs = subs.port(default, allocated);
        }
        ctx.rewrite_manifest(&to.join(Role::Deployment.file_name()), |manifest| {
            manifest.substitute(&subs);
            Ok(())
        })?;

        info!(path = %to.display(), "created");
        Ok(vec![to])
    }
}

// ── api ──────────────────────────────────────────────────────────────────────

/// One subtree per entity, under `platform/api/api-postgres/<plural>`.
struct ApiPostgres;

impl Materializer for ApiPostgres {
    fn component(&self) -> Component {
        Component::ApiPostgres
    }

    fn materialize(&self, ctx: &MaterializeContext<'_>) -> OdfResult<Vec<PathBuf>> {
        let def = ctx.definition(self.component())?;
        let postgres_port = ctx.singleton_port(ctx.definition(Component::Postgres)?);
        let mut created = Vec::new();

        for (plural_name, entity) in ctx.entities_using(def) {
            let to = ctx.destination(def).join(plural_name.as_str());
            ctx.copy_subtree(def, &to, &CopyFilter::housekeeping())?;

            let name = entity.name.as_str();
            let class_name = entity.name.capitalized();
            let app = to.join("app");

            let mut compose = ctx
                .substitutions()
                .hostname(def.component)
                .literal(ENTITY_TOKEN, plural_name.as_str());
            if let Some((default, allocated)) = def
                .default_port()
                .zip(entity.port_of(def.layer, def.component))
            {
                compose = compose.port(default, allocated);
            }
            ctx.rewrite_manifest(&to.join(Role::Deployment.file_name()), |manifest| {
                manifest.substitute(&compose);
                Ok(())
            })?;

            let models = ctx
                .substitutions()
                .literal(ENTITIES_TOKEN, plural_name.as_str())
                .literal(ENTITY_CLASS_TOKEN, class_name.as_str())
                .verbatim(EXTRA_FIELDS_TOKEN, model_fields(entity)?);
            ctx.rewrite_text(&app.join("models.py"), &models)?;

            let code = ctx
                .substitutions()
                .literal(ENTITY_TOKEN, name)
                .literal(ENTITIES_TOKEN, plural_name.as_str())
                .literal(ENTITY_CLASS_TOKEN, class_name.as_str());
            ctx.rewrite_text(&app.join("crud.py"), &code)?;
            ctx.rewrite_text(&app.join("router.py"), &code)?;

            let mut env = ctx
                .substitutions()
                .literal(DESCRIPTION_TOKEN, entity.description.as_str());
            if let Some((default, allocated)) = postgres_port {
                env = env.literal(default.to_string(), allocated.to_string());
            }
            ctx.rewrite_text(&to.join(ENV_FILE), &env)?;

            ctx.rewrite_text(
                &app.join("main.py"),
                &ctx.substitutions().literal(ENTITY_TOKEN, name),
            )?;

            info!(path = %to.display(), "created");
            created.push(to);
        }
        Ok(created)
    }
}

/// The `# fields` block of the entity model: one `name: type` line per field.
fn model_fields(entity: &EntityDocument) -> DomainResult<String> {
    let mut block = String::from("# fields");
    for field in entity.fields.iter() {
        if RESERVED_FIELDS.contains(&field.name.as_str()) {
            return Err(DomainError::InvalidIdentifier {
                value: field.name.as_str().to_string(),
                reason: format!("`{}` are reserved field names", RESERVED_FIELDS.join("`, `")),
            });
        }
        block.push_str("\n    ");
        block.push_str(field.name.as_str());
        block.push_str(": ");
        block.push_str(field.field_type.base_name());
    }
    Ok(block)
}

// ── devcontainers ────────────────────────────────────────────────────────────

struct Devcontainer(Component);

impl Materializer for Devcontainer {
    fn component(&self) -> Component {
        self.0
    }

    fn materialize(&self, ctx: &MaterializeContext<'_>) -> OdfResult<Vec<PathBuf>> {
        let def = ctx.definition(self.component())?;
        let Some(to) = ctx.copy_singleton(def, &CopyFilter::housekeeping())? else {
            return Ok(Vec::new());
        };

        let Some(mount) = ctx.settings.mounts().get(&def.component) else {
            debug!(component = %def.component, "no mount settings");
            return Ok(vec![to]);
        };

        let path = to.join(DEVCONTAINER_DIR).join(DEVCONTAINER_FILE);
        let mut config: JsonValue =
            serde_json::from_str(&ctx.read(&path)?).map_err(|e| malformed_json(&path, e))?;
        let object = config.as_object_mut().ok_or_else(|| DomainError::MalformedTemplate {
            template: path.display().to_string(),
            reason: "top level must be an object".into(),
        })?;

        object.insert(
            "name".into(),
            JsonValue::from(ctx.settings.project().as_str()),
        );
        if let JsonValue::Object(resolved) =
            serde_json::to_value(mount).map_err(|e| malformed_json(&path, e))?
        {
            object.extend(resolved);
        }

        let rendered = serde_json::to_string_pretty(&config).map_err(|e| malformed_json(&path, e))?;
        ctx.filesystem.write_file(&path, &rendered)?;

        info!(path = %to.display(), "created");
        Ok(vec![to])
    }
}

fn malformed_json(path: &Path, err: serde_json::Error) -> DomainError {
    DomainError::MalformedTemplate {
        template: path.display().to_string(),
        reason: err.to_string(),
    }
}

// ── storage ──────────────────────────────────────────────────────────────────

struct Postgres;

impl Materializer for Postgres {
    fn component(&self) -> Component {
        Component::Postgres
    }

    fn materialize(&self, ctx: &MaterializeContext<'_>) -> OdfResult<Vec<PathBuf>> {
        let def = ctx.definition(self.component())?;
        let Some(to) = ctx.copy_singleton(def, &CopyFilter::housekeeping())? else {
            return Ok(Vec::new());
        };

        let mut subs = ctx.substitutions().hostname(def.component);
        if let Some((default, allocated)) = ctx.singleton_port(def) {
            subs = subs.port(default, allocated);
        }
        ctx.rewrite_manifest(&to.join(Role::Deployment.file_name()), |manifest| {
            manifest.substitute(&subs);
            Ok(())
        })?;
        ctx.rewrite_text(&to.join(Role::Setup.file_name()), &ctx.substitutions())?;

        info!(path = %to.display(), "created");
        Ok(vec![to])
    }
}

// ── utility ──────────────────────────────────────────────────────────────────

/// Reverse proxy plus a status page listing every published port.
struct Nginx;

impl Materializer for Nginx {
    fn component(&self) -> Component {
        Component::Nginx
    }

    fn materialize(&self, ctx: &MaterializeContext<'_>) -> OdfResult<Vec<PathBuf>> {
        let def = ctx.definition(self.component())?;
        let Some(to) = ctx.copy_singleton(def, &CopyFilter::housekeeping())? else {
            return Ok(Vec::new());
        };

        let mut subs = ctx.substitutions();
        if let Some((default, allocated)) = ctx.singleton_port(def) {
            subs = subs.port(default, allocated);
        }
        ctx.rewrite_manifest(&to.join(Role::Deployment.file_name()), |manifest| {
            manifest.substitute(&subs);
            Ok(())
        })?;

        let page_path = STATUS_PAGE.iter().fold(to.clone(), |path, part| path.join(part));
        let html = ctx.substitutions().apply(&ctx.read(&page_path)?);
        let mut page = StatusPage::parse(&page_path.display().to_string(), &html)?;

        for (component, port) in ctx.settings.ports() {
            let Some(layer) = ctx.catalog.layer_of(*component) else {
                continue;
            };
            if let Some(badge) = ctx.catalog.badge(layer) {
                page.push_row(badge, layer, component.as_str(), *port);
            }
        }

        for (plural_name, entity) in ctx.entities_using(def) {
            for (layer, components) in &entity.layers {
                let Some(badge) = ctx.catalog.badge(*layer) else {
                    continue;
                };
                for (component, config) in components {
                    if let Some(port) = config.port {
                        page.push_row(badge, *layer, &format!("{component} | {plural_name}"), port);
                    }
                }
            }
        }

        debug!(rows = page.row_count(), "status page rendered");
        ctx.filesystem.write_file(&page_path, &page.render())?;

        info!(path = %to.display(), "created");
        Ok(vec![to])
    }
}

struct Texlive;

impl Materializer for Texlive {
    fn component(&self) -> Component {
        Component::Texlive
    }

    fn materialize(&self, ctx: &MaterializeContext<'_>) -> OdfResult<Vec<PathBuf>> {
        let def = ctx.definition(self.component())?;
        let Some(to) = ctx.copy_singleton(def, &CopyFilter::housekeeping())? else {
            return Ok(Vec::new());
        };

        let bindings = ctx.settings.volumes().get(&def.component);
        let subs = ctx.substitutions();
        ctx.rewrite_manifest(&to.join(Role::Deployment.file_name()), |manifest| {
            if let Some(bindings) = bindings {
                manifest.add_volumes(bindings)?;
            }
            manifest.substitute(&subs);
            Ok(())
        })?;

        info!(path = %to.display(), "created");
        Ok(vec![to])
    }
}
