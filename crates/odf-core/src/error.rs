//! [`OdfError`]: what every fallible `odf-core` operation returns.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OdfError {
    /// A catalog, naming or settings rule was broken.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The filesystem, a template tree or docker compose let us down.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A broken invariant inside odf itself.
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl OdfError {
    /// Hints printed under the error message.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Fix the setting and rerun: {message}"),
                "Show the active configuration: odf config list".into(),
            ],
            Self::Internal { .. } => vec!["This appears to be a bug in odf".into()],
        }
    }

    /// Drives the CLI exit status.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => e.category().into(),
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Configuration,
    Internal,
}

impl From<crate::domain::ErrorCategory> for ErrorCategory {
    fn from(category: crate::domain::ErrorCategory) -> Self {
        use crate::domain::ErrorCategory as Domain;
        match category {
            Domain::Validation => Self::Validation,
            Domain::Conflict => Self::Conflict,
            Domain::NotFound => Self::NotFound,
            Domain::Internal => Self::Internal,
        }
    }
}

pub type OdfResult<T> = Result<T, OdfError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn domain_errors_keep_their_message() {
        let err: OdfError = DomainError::UnknownLayer {
            layer: "queue".into(),
        }
        .into();
        assert_eq!(err.to_string(), "layer `queue` not found");
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn already_exists_is_a_conflict() {
        let err: OdfError = ApplicationError::AlreadyExists {
            path: PathBuf::from("demo/settings.json"),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert!(err.to_string().contains("demo/settings.json"));
    }

    #[test]
    fn infrastructure_failures_are_internal() {
        assert_eq!(
            OdfError::from(ApplicationError::StoreLockError).category(),
            ErrorCategory::Internal
        );
        let err = OdfError::Configuration {
            message: "defaults.layout".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.suggestions().iter().any(|s| s.contains("odf config list")));
    }
}
