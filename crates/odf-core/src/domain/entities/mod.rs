pub mod entity;
pub mod project;

pub use entity::{ComponentConfig, EntityDocument, EntityModel, LayerMap, singular_from_stem};
pub use project::{FRAMEWORK_VERSION, ProjectModel, REQUIRED_KEYS, SETTINGS_FILE, Settings};
