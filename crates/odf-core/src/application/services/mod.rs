//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish the
//! high-level use cases: initialize a project, compose its platform, and
//! drive the container runtime.

pub mod composition_service;
pub mod materializers;
pub mod orchestration_service;
pub mod profile_service;
pub mod project_service;

pub use composition_service::{CompositionReport, CompositionService};
pub use materializers::{MaterializeContext, Materializer, PLATFORM_DIR, materializer};
pub use orchestration_service::{ComposeAction, OrchestrationService};
pub use profile_service::{EntityPlan, ProfileService};
pub use project_service::{DATA_DIR, EntityDraft, ProjectService};
