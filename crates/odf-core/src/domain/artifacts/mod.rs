//! Merged platform artifacts and placeholder substitution.

pub mod dashboard;
pub mod manifest;
pub mod placeholder;
pub mod script;

pub use dashboard::StatusPage;
pub use manifest::ComposeManifest;
pub use placeholder::{PROJECT_SENTINEL, Substitutions};
pub use script::{HEADER_LINES, ScriptArtifact};
