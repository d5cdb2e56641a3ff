// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for odf.
//!
//! This module contains pure business logic. All I/O is handled via ports
//! (traits) defined in the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or process calls
//! - **Explicit catalog**: the component registry is a value passed by reference
//! - **Validate then commit**: failed operations leave models unchanged
//!
// Public API - what the world sees
pub mod allocation;
pub mod artifacts;
pub mod catalog;
pub mod entities;
pub mod error;
pub mod field;
pub mod profiles;
pub mod value_objects;

// Re-exports for convenience
pub use allocation::{MountConfig, PortAllocator};
pub use artifacts::{ComposeManifest, PROJECT_SENTINEL, ScriptArtifact, StatusPage, Substitutions};
pub use catalog::{Catalog, ComponentDef, LayerDef};
pub use entities::{
    ComponentConfig, EntityDocument, EntityModel, ProjectModel, REQUIRED_KEYS, SETTINGS_FILE,
    Settings,
};
pub use error::{DomainError, DomainResult, ErrorCategory};
pub use field::{Field, FieldMap, FieldName, FieldType, normalize_field_name};
pub use profiles::ProfileDef;
pub use value_objects::{Component, Identifier, Layer, Layout, Port, Profile, Role};
