//! Component catalog.
//!
//! Every layer and component is described exactly once, in a static table.
//! [`Catalog`] is an immutable view over those tables, built once at start-up
//! and passed explicitly to whatever needs it. There is no ambient global
//! lookup: models and services take `&Catalog`.
//!
//! # Adding a New Component
//!
//! 1. Add a variant to `Component` in `value_objects.rs`
//! 2. Add one [`ComponentDef`] entry to [`COMPONENT_REGISTRY`]
//! 3. Add a materializer in `application::services::materializers`

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::value_objects::{Component, Layer, Layout, Port};

// ── Definitions ──────────────────────────────────────────────────────────────

/// Devcontainer mount template. `{project}` is replaced by the project name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountTemplate {
    pub workspace_mount: &'static str,
    pub workspace_folder: &'static str,
    pub mounts: &'static [&'static str],
}

/// Volume bindings (`host`, `container`) for one layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeTemplate {
    pub layout: Layout,
    pub bindings: &'static [(&'static str, &'static str)],
}

/// Components another component needs inside one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub layer: Layer,
    pub components: &'static [Component],
}

/// Everything the domain needs to know about one component.
#[derive(Debug, Clone, Copy)]
pub struct ComponentDef {
    pub component: Component,
    pub layer: Layer,
    pub description: &'static str,
    /// Fixed port for singletons, base port for per-entity API components.
    pub default_port: Option<u16>,
    pub mount: Option<MountTemplate>,
    pub volumes: &'static [VolumeTemplate],
    /// Registering this component also registers these, transitively.
    pub dependencies: &'static [Dependency],
}

impl ComponentDef {
    pub fn default_port(&self) -> Option<Port> {
        self.default_port.map(Port::new)
    }

    /// Volume bindings for `layout`, empty if the component declares none.
    pub fn volumes_for(&self, layout: Layout) -> &'static [(&'static str, &'static str)] {
        self.volumes
            .iter()
            .find(|v| v.layout == layout)
            .map(|v| v.bindings)
            .unwrap_or(&[])
    }
}

/// Per-layer facts used by the composition engine.
#[derive(Debug, Clone, Copy)]
pub struct LayerDef {
    pub layer: Layer,
    /// CSS classes of the status-page badge.
    pub badge: Option<&'static str>,
    /// Files copied from the layer template directory to the project root.
    pub root_files: &'static [&'static str],
    /// Whether the layer's fragments are merged into platform artifacts.
    pub merges_fragments: bool,
}

// ── Tables ───────────────────────────────────────────────────────────────────

const DEVCONTAINER_MOUNT: MountTemplate = MountTemplate {
    workspace_mount: "source=${localWorkspaceFolder},target=/{project},type=bind",
    workspace_folder: "/{project}",
    mounts: &["source=${localWorkspaceFolder}/../../../data,target=/{project}/data,type=bind,consistency=cached"],
};

/// Layers in catalog order.
pub static LAYER_REGISTRY: &[LayerDef] = &[
    LayerDef {
        layer: Layer::Analytics,
        badge: Some("badge badge-info gap-2"),
        root_files: &[],
        merges_fragments: true,
    },
    LayerDef {
        layer: Layer::Api,
        badge: Some("badge badge-accent gap-2"),
        root_files: &["ingest.py"],
        merges_fragments: true,
    },
    LayerDef {
        layer: Layer::Devcontainers,
        badge: None,
        root_files: &[],
        merges_fragments: false,
    },
    LayerDef {
        layer: Layer::Storage,
        badge: Some("badge badge-warning gap-2"),
        root_files: &[],
        merges_fragments: true,
    },
    LayerDef {
        layer: Layer::Utility,
        badge: Some("badge badge-secondary gap-2"),
        root_files: &[],
        merges_fragments: true,
    },
];

/// Components, grouped by layer in catalog order.
pub static COMPONENT_REGISTRY: &[ComponentDef] = &[
    // ── analytics ────────────────────────────────────────────────────────────
    ComponentDef {
        component: Component::Superset,
        layer: Layer::Analytics,
        description: "Apache Superset is a modern, enterprise-ready business intelligence web application",
        default_port: Some(8088),
        mount: None,
        volumes: &[],
        dependencies: &[],
    },
    // ── api ──────────────────────────────────────────────────────────────────
    ComponentDef {
        component: Component::ApiPostgres,
        layer: Layer::Api,
        description: "REST Data Access for Postgres",
        default_port: Some(8000),
        mount: None,
        volumes: &[],
        dependencies: &[Dependency {
            layer: Layer::Storage,
            components: &[Component::Postgres],
        }],
    },
    // ── devcontainers ────────────────────────────────────────────────────────
    ComponentDef {
        component: Component::Python,
        layer: Layer::Devcontainers,
        description: "VS Code devcontainer for Python",
        default_port: None,
        mount: Some(DEVCONTAINER_MOUNT),
        volumes: &[],
        dependencies: &[],
    },
    ComponentDef {
        component: Component::R,
        layer: Layer::Devcontainers,
        description: "VS Code devcontainer for R",
        default_port: None,
        mount: Some(DEVCONTAINER_MOUNT),
        volumes: &[],
        dependencies: &[],
    },
    // ── storage ──────────────────────────────────────────────────────────────
    ComponentDef {
        component: Component::Postgres,
        layer: Layer::Storage,
        description: "Advanced Relational Database",
        default_port: Some(5432),
        mount: None,
        volumes: &[],
        dependencies: &[],
    },
    // ── utility ──────────────────────────────────────────────────────────────
    ComponentDef {
        component: Component::Nginx,
        layer: Layer::Utility,
        description: "HTTP and reverse proxy server",
        default_port: Some(80),
        mount: None,
        volumes: &[],
        dependencies: &[],
    },
    ComponentDef {
        component: Component::Texlive,
        layer: Layer::Utility,
        description: "TeX Live is intended to be a straightforward way to get up and running with the TeX document production system",
        default_port: None,
        mount: None,
        volumes: &[
            VolumeTemplate {
                layout: Layout::Custom,
                bindings: &[
                    ("./utility/texlive/mnt", "/usr/src/app/mnt"),
                    ("../data", "/usr/src/app/mnt/data"),
                ],
            },
            VolumeTemplate {
                layout: Layout::Research,
                bindings: &[
                    ("../output", "/usr/src/app/mnt/output"),
                    ("../paper", "/usr/src/app/mnt/paper"),
                ],
            },
        ],
        dependencies: &[],
    },
];

// ── Catalog ──────────────────────────────────────────────────────────────────

/// Immutable registry of layers and components.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    layers: &'static [LayerDef],
    components: &'static [ComponentDef],
}

impl Catalog {
    /// The catalog shipped with odf.
    pub fn builtin() -> Self {
        Self::from_tables(LAYER_REGISTRY, COMPONENT_REGISTRY)
    }

    /// Build a catalog over arbitrary tables. Call [`Catalog::validate`] to
    /// check its integrity.
    pub fn from_tables(layers: &'static [LayerDef], components: &'static [ComponentDef]) -> Self {
        Self { layers, components }
    }

    /// Check that every component sits in a declared layer, every dependency
    /// resolves, and the dependency graph is acyclic.
    pub fn validate(&self) -> DomainResult<()> {
        for def in self.components {
            if self.layer(def.layer).is_none() {
                return Err(DomainError::UnknownLayer {
                    layer: def.layer.to_string(),
                });
            }
            for dep in def.dependencies {
                for component in dep.components {
                    self.ensure(dep.layer, *component)?;
                }
            }
            self.dependency_closure(def.component)?;
        }
        Ok(())
    }

    /// Layer definitions in catalog order.
    pub fn layers(&self) -> impl Iterator<Item = &'static LayerDef> {
        self.layers.iter()
    }

    pub fn layer(&self, layer: Layer) -> Option<&'static LayerDef> {
        self.layers.iter().find(|def| def.layer == layer)
    }

    /// All component definitions in catalog order.
    pub fn components(&self) -> impl Iterator<Item = &'static ComponentDef> {
        self.components.iter()
    }

    /// Components of one layer, in catalog order.
    pub fn components_of(&self, layer: Layer) -> impl Iterator<Item = &'static ComponentDef> {
        self.components.iter().filter(move |def| def.layer == layer)
    }

    pub fn component(&self, component: Component) -> Option<&'static ComponentDef> {
        self.components.iter().find(|def| def.component == component)
    }

    /// Fail unless `component` is a member of `layer`.
    pub fn ensure(&self, layer: Layer, component: Component) -> DomainResult<&'static ComponentDef> {
        if self.layer(layer).is_none() {
            return Err(DomainError::UnknownLayer {
                layer: layer.to_string(),
            });
        }
        self.components_of(layer)
            .find(|def| def.component == component)
            .ok_or_else(|| DomainError::UnknownComponent {
                layer: layer.to_string(),
                component: component.to_string(),
            })
    }

    /// Resolve user-supplied names to a catalog entry.
    pub fn resolve(&self, layer: &str, component: &str) -> DomainResult<(Layer, Component)> {
        let layer: Layer = layer.parse()?;
        let component = Component::parse_in(layer.as_str(), component)?;
        self.ensure(layer, component)?;
        Ok((layer, component))
    }

    /// Every `(layer, component)` reachable through declared dependencies,
    /// depth-first, without duplicates and excluding `component` itself.
    ///
    /// A cycle fails with [`DomainError::DependencyCycle`] instead of looping.
    pub fn dependency_closure(&self, component: Component) -> DomainResult<Vec<(Layer, Component)>> {
        let mut path = vec![component];
        let mut closure = Vec::new();
        self.visit(component, &mut path, &mut closure)?;
        Ok(closure)
    }

    fn visit(
        &self,
        component: Component,
        path: &mut Vec<Component>,
        closure: &mut Vec<(Layer, Component)>,
    ) -> DomainResult<()> {
        let Some(def) = self.component(component) else {
            return Ok(());
        };

        for dep in def.dependencies {
            for &next in dep.components {
                if path.contains(&next) {
                    let cycle = path
                        .iter()
                        .chain(std::iter::once(&next))
                        .map(Component::as_str)
                        .collect::<Vec<_>>()
                        .join(" -> ");
                    return Err(DomainError::DependencyCycle { path: cycle });
                }
                if closure.contains(&(dep.layer, next)) {
                    continue;
                }
                closure.push((dep.layer, next));
                path.push(next);
                self.visit(next, path, closure)?;
                path.pop();
            }
        }
        Ok(())
    }

    pub fn badge(&self, layer: Layer) -> Option<&'static str> {
        self.layer(layer).and_then(|def| def.badge)
    }

    pub fn layer_of(&self, component: Component) -> Option<Layer> {
        self.component(component).map(|def| def.layer)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
