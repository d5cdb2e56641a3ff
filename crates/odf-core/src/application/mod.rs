//! Use cases of odf and the ports they drive.
//!
//! `init` is [`ProjectService`] plus [`ProfileService`], `create` is
//! [`CompositionService`], `compose` is [`OrchestrationService`]. The rules
//! they apply live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::{ContainerRuntime, CopyFilter, Filesystem, SchemaReader};
pub use services::{
    ComposeAction, CompositionReport, CompositionService, EntityDraft, EntityPlan,
    OrchestrationService, ProfileService, ProjectService,
};
