//! Domain model and use cases of odf, the data platform generator.
//!
//! CSV sources become entities, entities get components from the catalog,
//! and the resulting `settings.json` is materialized into a docker compose
//! platform. All I/O goes through the ports in [`application::ports`].
//!
//! ## Layers
//!
//! ```text
//!  odf-cli ──► application services ──► domain (catalog, models, artifacts)
//!                    │
//!                    ▼ ports
//!  odf-adapters: LocalFilesystem, CsvSchemaReader, DockerComposeRuntime
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use odf_core::{
//!     application::{EntityPlan, ProfileService, ProjectService},
//!     domain::{Catalog, Component, Identifier, Layer, Layout, Profile},
//! };
//!
//! # fn run(projects: ProjectService) -> odf_core::error::OdfResult<()> {
//! let project = Identifier::parse("demo")?;
//! let drafts = projects.discover_sources("demo".as_ref(), Profile::Custom)?;
//! let plans: Vec<EntityPlan> = drafts
//!     .into_iter()
//!     .map(|draft| EntityPlan::new(draft).with_component(Layer::Api, Component::ApiPostgres))
//!     .collect();
//!
//! let profiles = ProfileService::new(projects, Catalog::builtin());
//! profiles.init_custom("demo".as_ref(), &project, Layout::Custom, &plans)?;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod domain;
pub mod error;

/// The types a driving adapter usually needs, in one import.
pub mod prelude {
    pub use crate::application::{
        ComposeAction, CompositionReport, CompositionService, EntityDraft, EntityPlan,
        OrchestrationService, ProfileService, ProjectService,
        ports::{ContainerRuntime, CopyFilter, Filesystem, SchemaReader},
    };
    pub use crate::domain::{
        Catalog, Component, ComponentDef, EntityModel, FieldType, Identifier, Layer, LayerDef,
        Layout, Port, Profile, ProjectModel, Settings,
    };
    pub use crate::error::{ErrorCategory, OdfError, OdfResult};
}
