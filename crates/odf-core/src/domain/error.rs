// ============================================================================
// domain/error.rs - DOMAIN ERROR TAXONOMY
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (they travel inside reports and test assertions)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },

    #[error("invalid field type '{value}'")]
    InvalidFieldType { value: String },

    #[error("invalid layout '{value}', valid layouts are: {valid}")]
    InvalidLayout { value: String, valid: String },

    #[error("invalid profile '{value}', valid profiles are: {valid}")]
    InvalidProfile { value: String, valid: String },

    #[error("settings document is missing required field `{field}`")]
    MissingField { field: String },

    #[error("malformed settings document: {reason}")]
    MalformedSettings { reason: String },

    #[error("malformed compose manifest: {reason}")]
    MalformedManifest { reason: String },

    #[error("malformed template '{template}': {reason}")]
    MalformedTemplate { template: String, reason: String },

    #[error("malformed data source: {reason}")]
    MalformedSource { reason: String },

    // ========================================================================
    // Catalog Lookups
    // ========================================================================
    #[error("layer `{layer}` not found")]
    UnknownLayer { layer: String },

    #[error("component `{component}` not found in layer `{layer}`")]
    UnknownComponent { layer: String, component: String },

    #[error("dependency cycle detected: {path}")]
    DependencyCycle { path: String },

    // ========================================================================
    // Conflicts
    // ========================================================================
    #[error("component `{component}` already registered in layer `{layer}`")]
    DuplicateComponent { layer: String, component: String },

    #[error("entity `{plural_name}` already exists")]
    DuplicateEntity { plural_name: String },

    #[error("service `{service}` is defined by more than one fragment")]
    ConflictingService { service: String },

    #[error("no port left after {last} for `{component}`")]
    PortExhausted { component: String, last: u16 },

    // ========================================================================
    // Soft conditions
    // ========================================================================
    /// The tabular source has a header but no data row. Callers treat this as
    /// a warning: the entity simply ends up with zero fields.
    #[error("source '{source_name}' has no data rows")]
    EmptySource { source_name: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidIdentifier { value, .. } => vec![
                format!("'{value}' must only contain letters, digits and underscores"),
                "Field names `uid` and `ts` are reserved".into(),
            ],
            Self::InvalidLayout { valid, .. } => vec![format!("Use one of: {valid}")],
            Self::InvalidProfile { valid, .. } => vec![format!("Use one of: {valid}")],
            Self::UnknownLayer { .. } | Self::UnknownComponent { .. } => vec![
                "List the available components with: odf components".into(),
            ],
            Self::DuplicateComponent { component, .. } => vec![
                format!("`{component}` is already selected for this entity"),
                "Dependencies are registered automatically; do not select them twice".into(),
            ],
            Self::DuplicateEntity { plural_name } => vec![
                format!("Choose a different plural name than `{plural_name}`"),
            ],
            Self::MissingField { field } => vec![
                format!("Add the `{field}` key to settings.json"),
                "Or re-create the settings with: odf init".into(),
            ],
            Self::MalformedSettings { .. } => vec![
                "settings.json is not valid; fix it or re-run odf init".into(),
            ],
            Self::MalformedManifest { .. } | Self::MalformedTemplate { .. } => vec![
                "The template tree appears to be corrupted".into(),
                "Point --templates at a pristine template directory".into(),
            ],
            Self::ConflictingService { service } => vec![format!(
                "Rename `{service}` in one of the component compose fragments"
            )],
            Self::MalformedSource { .. } => vec![
                "Data sources must be comma-separated with a header row".into(),
            ],
            Self::EmptySource { source_name } => {
                vec![format!("Add at least one data row to '{source_name}'")]
            }
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidIdentifier { .. }
            | Self::InvalidFieldType { .. }
            | Self::InvalidLayout { .. }
            | Self::InvalidProfile { .. }
            | Self::MissingField { .. }
            | Self::MalformedSettings { .. }
            | Self::MalformedSource { .. }
            | Self::EmptySource { .. } => ErrorCategory::Validation,
            Self::DuplicateComponent { .. }
            | Self::DuplicateEntity { .. }
            | Self::ConflictingService { .. }
            | Self::PortExhausted { .. } => ErrorCategory::Conflict,
            Self::UnknownLayer { .. } | Self::UnknownComponent { .. } => ErrorCategory::NotFound,
            Self::DependencyCycle { .. }
            | Self::MalformedManifest { .. }
            | Self::MalformedTemplate { .. } => ErrorCategory::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Internal,
}

/// Result alias used throughout the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;
