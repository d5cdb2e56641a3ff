//! Profile Service - builds and persists the settings document for `odf init`.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::{
    application::services::project_service::{EntityDraft, ProjectService},
    domain::{Catalog, Component, Identifier, Layer, Layout, Profile, ProjectModel, Settings},
    error::OdfResult,
};

/// One entity to register: its draft plus the selected components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityPlan {
    pub draft: EntityDraft,
    pub components: Vec<(Layer, Component)>,
}

impl EntityPlan {
    pub fn new(draft: EntityDraft) -> Self {
        Self {
            draft,
            components: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_component(mut self, layer: Layer, component: Component) -> Self {
        self.components.push((layer, component));
        self
    }
}

pub struct ProfileService {
    projects: ProjectService,
    catalog: Catalog,
}

impl ProfileService {
    pub fn new(projects: ProjectService, catalog: Catalog) -> Self {
        Self { projects, catalog }
    }

    pub fn projects(&self) -> &ProjectService {
        &self.projects
    }

    /// Register every plan on a fresh project and persist it under `root`.
    ///
    /// A selected component already pulled in as a dependency of an earlier
    /// selection is skipped.
    #[instrument(skip_all, fields(project = %project, layout = %layout, entities = plans.len()))]
    pub fn init_custom(
        &self,
        root: &Path,
        project: &Identifier,
        layout: Layout,
        plans: &[EntityPlan],
    ) -> OdfResult<Settings> {
        let model = ProjectModel::new(project.as_str())?
            .with_profile(Profile::Custom)
            .with_layout(layout);
        self.init(root, model, plans)
    }

    /// Apply the research preset to every source found under `root/data`.
    #[instrument(skip_all, fields(project = %project))]
    pub fn init_research(&self, root: &Path, project: &Identifier) -> OdfResult<Settings> {
        let definition = Profile::Research.definition();
        let plans: Vec<EntityPlan> = self
            .projects
            .discover_sources(root, Profile::Research)?
            .into_iter()
            .map(|draft| EntityPlan {
                draft,
                components: definition.components.to_vec(),
            })
            .collect();

        let model = ProjectModel::new(project.as_str())?
            .with_profile(Profile::Research)
            .with_layout(definition.layout.unwrap_or_default());
        self.init(root, model, &plans)
    }

    fn init(&self, root: &Path, mut model: ProjectModel, plans: &[EntityPlan]) -> OdfResult<Settings> {
        self.projects.ensure_not_initialized(root)?;

        for plan in plans {
            let mut entity = self.projects.build_entity(&plan.draft)?;
            for &(layer, component) in &plan.components {
                if entity.has_component(layer, component) {
                    debug!(%layer, %component, "already registered through a dependency");
                    continue;
                }
                entity.register(&self.catalog, layer, component)?;
            }
            model.register(&self.catalog, &entity)?;
            info!(entity = %entity.plural_name(), "registered");
        }

        let settings = model.into_settings();
        self.projects.persist(root, &settings)?;
        Ok(settings)
    }
}
