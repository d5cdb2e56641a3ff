//! The settings document and the aggregate that builds it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::allocation::{MountConfig, PortAllocator, resolve_mount, resolve_volumes};
use crate::domain::catalog::Catalog;
use crate::domain::entities::entity::{EntityDocument, EntityModel};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::value_objects::{Component, Identifier, Layout, Port, Profile};

/// File name of the persisted settings document.
pub const SETTINGS_FILE: &str = "settings.json";

/// Top-level keys a settings document must carry.
pub const REQUIRED_KEYS: [&str; 8] = [
    "framework_version",
    "project",
    "profile",
    "layout",
    "entities",
    "mounts",
    "volumes",
    "ports",
];

/// Version stamped into new settings documents.
pub const FRAMEWORK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The single persisted source of truth for a generated platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    framework_version: String,
    project: Identifier,
    profile: Profile,
    layout: Layout,
    entities: BTreeMap<Identifier, EntityDocument>,
    mounts: BTreeMap<Component, MountConfig>,
    volumes: BTreeMap<Component, BTreeMap<String, String>>,
    ports: BTreeMap<Component, Port>,
}

impl Settings {
    pub fn new(project: Identifier) -> Self {
        Self {
            framework_version: FRAMEWORK_VERSION.to_string(),
            project,
            profile: Profile::default(),
            layout: Layout::default(),
            entities: BTreeMap::new(),
            mounts: BTreeMap::new(),
            volumes: BTreeMap::new(),
            ports: BTreeMap::new(),
        }
    }

    /// Parse and validate a settings document.
    ///
    /// Every key in [`REQUIRED_KEYS`] must be present. `layout` and `profile`
    /// are matched case-insensitively.
    pub fn from_json(text: &str) -> DomainResult<Self> {
        let mut value: Value = serde_json::from_str(text).map_err(malformed)?;

        let object = value.as_object_mut().ok_or_else(|| DomainError::MalformedSettings {
            reason: "top level must be an object".into(),
        })?;

        if let Some(missing) = REQUIRED_KEYS.iter().find(|key| !object.contains_key(**key)) {
            return Err(DomainError::MissingField {
                field: (*missing).to_string(),
            });
        }

        let layout: Layout = text_field(object, "layout")?.parse()?;
        let profile: Profile = text_field(object, "profile")?.parse()?;
        object.insert("layout".into(), Value::from(layout.as_str()));
        object.insert("profile".into(), Value::from(profile.as_str()));

        serde_json::from_value(value).map_err(malformed)
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_json(&self) -> DomainResult<String> {
        serde_json::to_string_pretty(self).map_err(malformed)
    }

    pub fn framework_version(&self) -> &str {
        &self.framework_version
    }

    pub fn project(&self) -> &Identifier {
        &self.project
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn entities(&self) -> &BTreeMap<Identifier, EntityDocument> {
        &self.entities
    }

    pub fn entity(&self, plural_name: &str) -> Option<&EntityDocument> {
        self.entities
            .iter()
            .find(|(key, _)| key.as_str() == plural_name)
            .map(|(_, document)| document)
    }

    pub fn mounts(&self) -> &BTreeMap<Component, MountConfig> {
        &self.mounts
    }

    pub fn volumes(&self) -> &BTreeMap<Component, BTreeMap<String, String>> {
        &self.volumes
    }

    /// Project-wide ports of singleton components.
    pub fn ports(&self) -> &BTreeMap<Component, Port> {
        &self.ports
    }

    pub fn port(&self, component: Component) -> Option<Port> {
        self.ports.get(&component).copied()
    }

    /// `true` if any entity registers `component`.
    pub fn uses(&self, component: Component) -> bool {
        self.entities
            .values()
            .any(|entity| entity.layers.values().any(|c| c.contains_key(&component)))
    }
}

fn malformed(err: serde_json::Error) -> DomainError {
    DomainError::MalformedSettings {
        reason: err.to_string(),
    }
}

fn text_field<'a>(object: &'a serde_json::Map<String, Value>, key: &str) -> DomainResult<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| DomainError::MalformedSettings {
            reason: format!("`{key}` must be a string"),
        })
}

// ── ProjectModel ─────────────────────────────────────────────────────────────

/// Aggregate that folds entities into the settings document.
#[derive(Debug, Clone)]
pub struct ProjectModel {
    settings: Settings,
    allocator: PortAllocator,
}

impl ProjectModel {
    pub fn new(project: &str) -> DomainResult<Self> {
        Ok(Self::from_settings(Settings::new(Identifier::parse(project)?)))
    }

    /// Continue from a loaded document. API port allocation starts over.
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            settings,
            allocator: PortAllocator::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    pub fn name(&self) -> &Identifier {
        &self.settings.project
    }

    pub fn layout(&self) -> Layout {
        self.settings.layout
    }

    pub fn set_layout(&mut self, value: &str) -> DomainResult<()> {
        self.settings.layout = value.parse()?;
        Ok(())
    }

    pub fn set_profile(&mut self, value: &str) -> DomainResult<()> {
        self.settings.profile = value.parse()?;
        Ok(())
    }

    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.settings.layout = layout;
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.settings.profile = profile;
        self
    }

    /// Fold `entity` into the document.
    ///
    /// Mounts, volumes and singleton ports are recorded the first time any
    /// entity registers a component. Every per-entity API registration gets a
    /// fresh port. Nothing is committed if any step fails.
    pub fn register(&mut self, catalog: &Catalog, entity: &EntityModel) -> DomainResult<()> {
        let (plural_name, mut document) = entity.to_document();

        if self.settings.entities.contains_key(&plural_name) {
            return Err(DomainError::DuplicateEntity {
                plural_name: plural_name.to_string(),
            });
        }

        let mut allocator = self.allocator.clone();
        let mut mounts = Vec::new();
        let mut volumes = Vec::new();
        let mut ports = Vec::new();

        for (layer, components) in &mut document.layers {
            for (component, config) in components.iter_mut() {
                let def = catalog.ensure(*layer, *component)?;

                if let Some(mount) = resolve_mount(def, &self.settings.project) {
                    mounts.push((*component, mount));
                }
                if let Some(bindings) = resolve_volumes(def, self.settings.layout) {
                    volumes.push((*component, bindings));
                }

                let Some(base) = def.default_port() else {
                    continue;
                };
                if layer.is_per_entity() {
                    config.port = Some(allocator.allocate(*component, base)?);
                } else {
                    ports.push((*component, base));
                }
            }
        }

        for (component, mount) in mounts {
            self.settings.mounts.entry(component).or_insert(mount);
        }
        for (component, bindings) in volumes {
            self.settings.volumes.entry(component).or_insert(bindings);
        }
        for (component, port) in ports {
            self.settings.ports.entry(component).or_insert(port);
        }
        self.allocator = allocator;
        self.settings.entities.insert(plural_name, document);
        Ok(())
    }
}
