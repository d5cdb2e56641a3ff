//! Port, mount and volume resolution for component registrations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{ComponentDef, MountTemplate};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::value_objects::{Component, Identifier, Layout, Port};

const PROJECT_TOKEN: &str = "{project}";

/// Hands out per-entity API ports.
///
/// The sequence is global: the first allocation returns the requesting
/// component's base port, every later one the previous port plus one,
/// whichever component asks. State lives only as long as the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortAllocator {
    allocated: Vec<Port>,
}

impl PortAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, component: Component, base: Port) -> DomainResult<Port> {
        let port = match self.allocated.last() {
            None => base,
            Some(last) => last.next().ok_or(DomainError::PortExhausted {
                component: component.to_string(),
                last: last.get(),
            })?,
        };
        self.allocated.push(port);
        Ok(port)
    }

    /// Ports handed out so far, in allocation order.
    pub fn allocated(&self) -> &[Port] {
        &self.allocated
    }
}

/// Resolved devcontainer mount settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfig {
    #[serde(rename = "workspaceMount")]
    pub workspace_mount: String,
    #[serde(rename = "workspaceFolder")]
    pub workspace_folder: String,
    pub mounts: Vec<String>,
}

impl MountConfig {
    fn from_template(template: &MountTemplate, project: &Identifier) -> Self {
        let fill = |raw: &str| raw.replace(PROJECT_TOKEN, project.as_str());
        Self {
            workspace_mount: fill(template.workspace_mount),
            workspace_folder: fill(template.workspace_folder),
            mounts: template.mounts.iter().copied().map(fill).collect(),
        }
    }
}

/// Mount settings for `def`, if it declares a mount template.
pub fn resolve_mount(def: &ComponentDef, project: &Identifier) -> Option<MountConfig> {
    def.mount
        .as_ref()
        .map(|template| MountConfig::from_template(template, project))
}

/// Volume bindings for `def` under `layout`.
///
/// Components without any volume template yield `None`; a component whose
/// template lacks this layout yields an empty map.
pub fn resolve_volumes(def: &ComponentDef, layout: Layout) -> Option<BTreeMap<String, String>> {
    if def.volumes.is_empty() {
        return None;
    }
    Some(
        def.volumes_for(layout)
            .iter()
            .map(|(host, container)| ((*host).to_string(), (*container).to_string()))
            .collect(),
    )
}
