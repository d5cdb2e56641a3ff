//! Structured compose manifests.
//!
//! Manifests are parsed into YAML values, merged service by service and
//! rewritten field by field, then serialized once. Fragment headers (every
//! top-level key other than `services` and `volumes`) are discarded on
//! merge so only the base document's header survives.

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use crate::domain::artifacts::placeholder::Substitutions;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::value_objects::Identifier;

const SERVICES: &str = "services";
const VOLUMES: &str = "volumes";
const NETWORKS: &str = "networks";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeManifest {
    header: Mapping,
    services: Mapping,
    volumes: Mapping,
    networks: Mapping,
}

impl ComposeManifest {
    pub fn parse(text: &str) -> DomainResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let document: Value = serde_yaml::from_str(text).map_err(|e| malformed(e.to_string()))?;
        let root = match document {
            Value::Null => Mapping::new(),
            Value::Mapping(map) => map,
            _ => return Err(malformed("top level must be a mapping")),
        };

        let mut manifest = Self::default();
        for (key, value) in root {
            match key.as_str() {
                Some(SERVICES) => manifest.services = section(SERVICES, value)?,
                Some(VOLUMES) => manifest.volumes = section(VOLUMES, value)?,
                Some(NETWORKS) => manifest.networks = section(NETWORKS, value)?,
                _ => {
                    manifest.header.insert(key, value);
                }
            }
        }
        Ok(manifest)
    }

    /// Service names in merge order.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().filter_map(Value::as_str)
    }

    pub fn service(&self, name: &str) -> Option<&Value> {
        self.services.get(name)
    }

    pub fn network_names(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().filter_map(Value::as_str)
    }

    /// Append the services and named volumes of `fragment`.
    ///
    /// A service name already present is a [`DomainError::ConflictingService`];
    /// nothing is merged in that case.
    pub fn merge_fragment(&mut self, fragment: ComposeManifest) -> DomainResult<()> {
        if let Some(name) = fragment
            .services
            .keys()
            .find(|name| self.services.contains_key(*name))
        {
            return Err(DomainError::ConflictingService {
                service: name.as_str().unwrap_or_default().to_string(),
            });
        }

        self.services.extend(fragment.services);
        for (name, volume) in fragment.volumes {
            if !self.volumes.contains_key(&name) {
                self.volumes.insert(name, volume);
            }
        }
        Ok(())
    }

    /// Add `host:container` bindings to every service.
    pub fn add_volumes(&mut self, bindings: &BTreeMap<String, String>) -> DomainResult<()> {
        for (name, service) in self.services.iter_mut() {
            let Value::Mapping(service) = service else {
                return Err(malformed(format!(
                    "service `{}` is not a mapping",
                    name.as_str().unwrap_or_default()
                )));
            };

            let entry = service
                .entry(Value::from(VOLUMES))
                .or_insert_with(|| Value::Sequence(Vec::new()));
            let Value::Sequence(list) = entry else {
                return Err(malformed("service volumes must be a list"));
            };
            list.extend(
                bindings
                    .iter()
                    .map(|(host, container)| Value::from(format!("{host}:{container}"))),
            );
        }
        Ok(())
    }

    /// Declare the project-scoped `<project>_default` network.
    pub fn with_project_network(&mut self, project: &Identifier) {
        let name = format!("{project}_default");
        let mut network = Mapping::new();
        network.insert(Value::from("name"), Value::from(name.clone()));
        self.networks.insert(Value::from(name), Value::Mapping(network));
    }

    /// Rewrite placeholders in every key and string scalar.
    pub fn substitute(&mut self, subs: &Substitutions) {
        for section in [
            &mut self.header,
            &mut self.services,
            &mut self.volumes,
            &mut self.networks,
        ] {
            substitute_mapping(section, subs);
        }
    }

    pub fn render(&self) -> DomainResult<String> {
        let mut root = self.header.clone();
        root.insert(Value::from(SERVICES), Value::Mapping(self.services.clone()));
        if !self.volumes.is_empty() {
            root.insert(Value::from(VOLUMES), Value::Mapping(self.volumes.clone()));
        }
        if !self.networks.is_empty() {
            root.insert(Value::from(NETWORKS), Value::Mapping(self.networks.clone()));
        }
        serde_yaml::to_string(&root).map_err(|e| malformed(e.to_string()))
    }
}

fn section(key: &str, value: Value) -> DomainResult<Mapping> {
    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(map) => Ok(map),
        _ => Err(malformed(format!("`{key}` must be a mapping"))),
    }
}

fn substitute_mapping(map: &mut Mapping, subs: &Substitutions) {
    let entries = std::mem::take(map);
    for (key, value) in entries {
        let is_hostname = key.as_str() == Some("hostname");
        let key = match key {
            Value::String(text) => Value::String(subs.apply(&text)),
            other => other,
        };
        let value = match value {
            Value::String(text) if is_hostname => Value::String(subs.apply_hostname(&text)),
            mut other => {
                substitute_value(&mut other, subs);
                other
            }
        };
        map.insert(key, value);
    }
}

fn substitute_value(value: &mut Value, subs: &Substitutions) {
    match value {
        Value::String(text) => *text = subs.apply(text),
        Value::Sequence(items) => items.iter_mut().for_each(|item| substitute_value(item, subs)),
        Value::Mapping(map) => substitute_mapping(map, subs),
        Value::Tagged(tagged) => substitute_value(&mut tagged.value, subs),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn malformed(reason: impl Into<String>) -> DomainError {
    DomainError::MalformedManifest {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Component, Port};

    const BASE: &str = "name: project_name\nservices: {}\n";

    const POSTGRES: &str = r#"
name: ignored
services:
  postgres:
    image: postgres:16
    hostname: project_name-postgres
    container_name: project_name-postgres
    ports:
      - "5432:5432"
volumes:
  pgdata: {}
"#;

    const API: &str = r#"
services:
  api-entity:
    hostname: project_name-api-postgres
    ports:
      - "8000:8000"
"#;

    fn demo() -> Identifier {
        Identifier::parse("my_demo").unwrap()
    }

    #[test]
    fn merge_keeps_base_header_and_fragment_order() {
        let mut base = ComposeManifest::parse(BASE).unwrap();
        base.merge_fragment(ComposeManifest::parse(API).unwrap()).unwrap();
        base.merge_fragment(ComposeManifest::parse(POSTGRES).unwrap()).unwrap();

        let names: Vec<&str> = base.service_names().collect();
        assert_eq!(names, ["api-entity", "postgres"]);

        let rendered = base.render().unwrap();
        assert!(rendered.starts_with("name: project_name\n"));
        assert!(!rendered.contains("ignored"));
        assert!(rendered.contains("pgdata"));
    }

    #[test]
    fn conflicting_service_is_rejected() {
        let mut base = ComposeManifest::parse(BASE).unwrap();
        base.merge_fragment(ComposeManifest::parse(POSTGRES).unwrap()).unwrap();
        let err = base
            .merge_fragment(ComposeManifest::parse(POSTGRES).unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::ConflictingService {
                service: "postgres".into()
            }
        );
    }

    #[test]
    fn substitution_rewrites_keys_hostnames_and_ports() {
        let mut fragment = ComposeManifest::parse(API).unwrap();
        let subs = Substitutions::new(&demo())
            .hostname(Component::ApiPostgres)
            .port(Port::new(8000), Port::new(8001))
            .literal("entity", "events");
        fragment.substitute(&subs);

        let names: Vec<&str> = fragment.service_names().collect();
        assert_eq!(names, ["api-events"]);

        let service = fragment.service("api-events").unwrap();
        assert_eq!(service["hostname"].as_str(), Some("my-demo-api-postgres"));
        assert_eq!(service["ports"][0].as_str(), Some("8001:8000"));
    }

    #[test]
    fn volumes_are_added_to_every_service() {
        let mut manifest = ComposeManifest::parse(
            "services:\n  texlive:\n    image: texlive\n  helper:\n    volumes:\n      - ./a:/a\n",
        )
        .unwrap();
        let bindings = BTreeMap::from([("../paper".to_string(), "/mnt/paper".to_string())]);
        manifest.add_volumes(&bindings).unwrap();

        let texlive = manifest.service("texlive").unwrap();
        assert_eq!(texlive["volumes"][0].as_str(), Some("../paper:/mnt/paper"));
        let helper = manifest.service("helper").unwrap();
        assert_eq!(helper["volumes"].as_sequence().map(Vec::len), Some(2));
    }

    #[test]
    fn project_network_is_rendered_last() {
        let mut manifest = ComposeManifest::parse(BASE).unwrap();
        manifest.merge_fragment(ComposeManifest::parse(POSTGRES).unwrap()).unwrap();
        manifest.with_project_network(&demo());

        let rendered = manifest.render().unwrap();
        assert!(rendered.ends_with("networks:\n  my_demo_default:\n    name: my_demo_default\n"));
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(ComposeManifest::parse("- a\n- b\n").is_err());
        assert!(ComposeManifest::parse("services: [a]\n").is_err());
        assert!(ComposeManifest::parse("services: {a: [}\n").is_err());
        assert_eq!(ComposeManifest::parse("\n").unwrap(), ComposeManifest::default());
    }
}
