//! A modeled dataset: inferred schema plus per-layer component registrations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::catalog::Catalog;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::field::{Field, FieldMap};
use crate::domain::value_objects::{Component, Identifier, Layer, Port};

/// Per-registration component settings. Only per-entity API components carry
/// a port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<Port>,
}

/// `layer -> component -> config`, iterated in catalog order.
pub type LayerMap = BTreeMap<Layer, BTreeMap<Component, ComponentConfig>>;

/// Persisted form of an entity, stored under its plural name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDocument {
    pub name: Identifier,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default)]
    pub layers: LayerMap,
}

impl EntityDocument {
    pub fn uses(&self, layer: Layer, component: Component) -> bool {
        self.layers
            .get(&layer)
            .is_some_and(|components| components.contains_key(&component))
    }

    /// Components registered in `layer`, in catalog order.
    pub fn components_in(&self, layer: Layer) -> impl Iterator<Item = (&Component, &ComponentConfig)> {
        self.layers.get(&layer).into_iter().flatten()
    }

    /// Port allocated to a per-entity component, if any.
    pub fn port_of(&self, layer: Layer, component: Component) -> Option<Port> {
        self.layers
            .get(&layer)
            .and_then(|components| components.get(&component))
            .and_then(|config| config.port)
    }
}

/// One tabular dataset and the components it opts into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityModel {
    name: Identifier,
    plural_name: Identifier,
    description: String,
    source: PathBuf,
    fields: FieldMap,
    layers: LayerMap,
}

impl EntityModel {
    pub fn new(name: &str, plural_name: &str, source: impl Into<PathBuf>) -> DomainResult<Self> {
        Ok(Self {
            name: Identifier::parse(name)?,
            plural_name: Identifier::parse(plural_name)?,
            description: String::new(),
            source: source.into(),
            fields: FieldMap::new(),
            layers: LayerMap::new(),
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &Identifier {
        &self.name
    }

    pub fn plural_name(&self) -> &Identifier {
        &self.plural_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn layers(&self) -> &LayerMap {
        &self.layers
    }

    /// On error the current name is kept.
    pub fn set_name(&mut self, value: &str) -> DomainResult<()> {
        self.name = Identifier::parse(value)?;
        Ok(())
    }

    /// On error the current plural name is kept.
    pub fn set_plural_name(&mut self, value: &str) -> DomainResult<()> {
        self.plural_name = Identifier::parse(value)?;
        Ok(())
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.description = value.into();
    }

    /// Replace the schema from the source's first data record, given as
    /// `(header, sample)` pairs in header order.
    ///
    /// `None` means the source has a header but no data row: the schema is
    /// left empty and [`DomainError::EmptySource`] is returned for the caller
    /// to report. Any invalid column leaves the previous schema untouched.
    pub fn read_schema(&mut self, record: Option<Vec<(String, String)>>) -> DomainResult<()> {
        let Some(record) = record else {
            self.fields = FieldMap::new();
            return Err(DomainError::EmptySource {
                source_name: self.source.display().to_string(),
            });
        };

        let mut fields = FieldMap::new();
        for (header, sample) in &record {
            fields.insert(Field::from_sample(header, sample)?)?;
        }
        self.fields = fields;
        Ok(())
    }

    pub fn has_component(&self, layer: Layer, component: Component) -> bool {
        self.layers
            .get(&layer)
            .is_some_and(|components| components.contains_key(&component))
    }

    /// Register `component` in `layer`, then every transitive dependency not
    /// already present.
    pub fn register(&mut self, catalog: &Catalog, layer: Layer, component: Component) -> DomainResult<()> {
        catalog.ensure(layer, component)?;

        if self.has_component(layer, component) {
            return Err(DomainError::DuplicateComponent {
                layer: layer.to_string(),
                component: component.to_string(),
            });
        }

        let dependencies = catalog.dependency_closure(component)?;

        self.layers
            .entry(layer)
            .or_default()
            .insert(component, ComponentConfig::default());

        for (dep_layer, dep_component) in dependencies {
            self.layers
                .entry(dep_layer)
                .or_default()
                .entry(dep_component)
                .or_default();
        }
        Ok(())
    }

    /// The serializable form, keyed by plural name.
    pub fn to_document(&self) -> (Identifier, EntityDocument) {
        (
            self.plural_name.clone(),
            EntityDocument {
                name: self.name.clone(),
                description: self.description.clone(),
                fields: self.fields.clone(),
                layers: self.layers.clone(),
            },
        )
    }
}

/// Entity name derived from a source file stem: one trailing `s` is dropped.
pub fn singular_from_stem(stem: &str) -> String {
    stem.strip_suffix('s').unwrap_or(stem).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> EntityModel {
        EntityModel::new("Event", "Events", "data/events.csv").unwrap()
    }

    fn record(pairs: &[(&str, &str)]) -> Option<Vec<(String, String)>> {
        Some(
            pairs
                .iter()
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn names_are_lower_cased() {
        let entity = event();
        assert_eq!(entity.name().as_str(), "event");
        assert_eq!(entity.plural_name().as_str(), "events");
    }

    #[test]
    fn invalid_name_keeps_previous_value() {
        let mut entity = event();
        assert!(matches!(
            entity.set_name("bad name"),
            Err(DomainError::InvalidIdentifier { .. })
        ));
        assert_eq!(entity.name().as_str(), "event");
        assert!(entity.set_plural_name("").is_err());
        assert_eq!(entity.plural_name().as_str(), "events");
    }

    #[test]
    fn read_schema_types_fields_in_header_order() {
        let mut entity = event();
        entity
            .read_schema(record(&[
                ("id", "1"),
                ("name", "boot"),
                ("value", "0.5"),
                ("Logged At", "2024-01-01 00:00:00"),
            ]))
            .unwrap();

        let rendered: Vec<String> = entity
            .fields()
            .iter()
            .map(|f| format!("{}:{}", f.name, f.field_type))
            .collect();
        assert_eq!(
            rendered,
            [
                "id:int",
                "name:str",
                "value:float",
                "logged_at:datetime|%Y-%m-%d %H:%M:%S"
            ]
        );
    }

    #[test]
    fn empty_source_yields_zero_fields() {
        let mut entity = event();
        let err = entity.read_schema(None).unwrap_err();
        assert!(matches!(err, DomainError::EmptySource { .. }));
        assert!(entity.fields().is_empty());
    }

    #[test]
    fn reserved_column_aborts_without_partial_schema() {
        let mut entity = event();
        entity.read_schema(record(&[("a", "1")])).unwrap();
        assert!(entity.read_schema(record(&[("b", "1"), ("ts", "x")])).is_err());
        assert!(entity.fields().get("a").is_some());
        assert!(entity.fields().get("b").is_none());
    }

    #[test]
    fn register_expands_dependencies() {
        let catalog = Catalog::builtin();
        let mut entity = event();
        entity
            .register(&catalog, Layer::Api, Component::ApiPostgres)
            .unwrap();

        assert!(entity.has_component(Layer::Api, Component::ApiPostgres));
        assert!(entity.has_component(Layer::Storage, Component::Postgres));
    }

    #[test]
    fn register_twice_is_a_duplicate() {
        let catalog = Catalog::builtin();
        let mut entity = event();
        entity
            .register(&catalog, Layer::Api, Component::ApiPostgres)
            .unwrap();

        assert!(matches!(
            entity.register(&catalog, Layer::Api, Component::ApiPostgres),
            Err(DomainError::DuplicateComponent { .. })
        ));
        // dependency was auto-registered, so explicit registration is a duplicate too
        assert!(matches!(
            entity.register(&catalog, Layer::Storage, Component::Postgres),
            Err(DomainError::DuplicateComponent { .. })
        ));
    }

    #[test]
    fn register_with_dependency_already_present() {
        let catalog = Catalog::builtin();
        let mut entity = event();
        entity
            .register(&catalog, Layer::Storage, Component::Postgres)
            .unwrap();
        entity
            .register(&catalog, Layer::Api, Component::ApiPostgres)
            .unwrap();
        assert_eq!(entity.layers()[&Layer::Storage].len(), 1);
    }

    #[test]
    fn register_rejects_component_outside_its_layer() {
        let catalog = Catalog::builtin();
        let mut entity = event();
        assert!(matches!(
            entity.register(&catalog, Layer::Storage, Component::Nginx),
            Err(DomainError::UnknownComponent { .. })
        ));
        assert!(entity.layers().is_empty());
    }

    #[test]
    fn document_serializes_layers_and_fields() {
        let catalog = Catalog::builtin();
        let mut entity = event().with_description("system events");
        entity.read_schema(record(&[("id", "1")])).unwrap();
        entity
            .register(&catalog, Layer::Api, Component::ApiPostgres)
            .unwrap();

        let (key, document) = entity.to_document();
        assert_eq!(key.as_str(), "events");

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "event",
                "description": "system events",
                "fields": {"id": "int"},
                "layers": {
                    "api": {"api-postgres": {}},
                    "storage": {"postgres": {}}
                }
            })
        );
    }

    #[test]
    fn singular_drops_one_trailing_s() {
        assert_eq!(singular_from_stem("events"), "event");
        assert_eq!(singular_from_stem("Status"), "statu");
        assert_eq!(singular_from_stem("glass"), "glas");
        assert_eq!(singular_from_stem("data"), "data");
    }
}
