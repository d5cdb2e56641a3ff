//! Errors surfaced by the `odf` binary, their suggestions and exit codes.

use std::error::Error as _;

use owo_colors::OwoColorize;
use thiserror::Error;

use odf_core::error::{ErrorCategory as CoreCategory, OdfError};

pub type CliResult<T> = Result<T, CliError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum CliError {
    /// Arguments that parse but make no sense together.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// A `--with` value that does not name a catalog component.
    #[error("Invalid component selection '{value}': {reason}")]
    InvalidSelection { value: String, reason: String },

    /// Unreadable, unparsable or unwritable configuration.
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error(transparent)]
    Core(#[from] OdfError),

    #[error("{message}")]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// The terminal went away mid-prompt.
    #[error("Prompt failed: {message}")]
    Prompt { message: String },

    /// Escape pressed at a prompt.
    #[error("Cancelled at the prompt, nothing was written")]
    Cancelled,
}

impl From<std::io::Error> for CliError {
    fn from(source: std::io::Error) -> Self {
        Self::IoError {
            message: format!("I/O error: {source}"),
            source,
        }
    }
}

#[cfg(feature = "interactive")]
impl From<dialoguer::Error> for CliError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Prompt {
            message: err.to_string(),
        }
    }
}

impl CliError {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidInput { .. } => vec!["See the accepted arguments: odf --help".into()],
            Self::InvalidSelection { .. } => vec![
                "Selections are written LAYER/COMPONENT, e.g. api/api-postgres".into(),
                "List the catalog: odf components".into(),
            ],
            Self::ConfigError { .. } => vec![
                "Show the config location: odf config path".into(),
                "Write a fresh default file: odf config init --force".into(),
            ],
            Self::Core(core) => core.suggestions(),
            Self::IoError { .. } => vec![
                "Check that the project directory is writable".into(),
            ],
            Self::Prompt { .. } => vec![
                "Run from an interactive terminal".into(),
                "Or pass --yes (with --with selections) to skip the prompts".into(),
            ],
            Self::Cancelled => Vec::new(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } | Self::InvalidSelection { .. } | Self::Cancelled => {
                ErrorCategory::UserError
            }
            Self::ConfigError { .. } => ErrorCategory::Configuration,
            Self::Core(core) => core.category().into(),
            Self::IoError { .. } | Self::Prompt { .. } => ErrorCategory::Internal,
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.category().exit_code()
    }

    /// Coloured report for a terminal.
    pub fn format_colored(&self, verbose: bool) -> String {
        self.report(verbose, &Palette::COLOURED)
    }

    /// The same report without ANSI codes.
    pub fn format_plain(&self, verbose: bool) -> String {
        self.report(verbose, &Palette::PLAIN)
    }

    fn report(&self, verbose: bool, palette: &Palette) -> String {
        let mut out = format!("\n{}\n", (palette.title)(&format!("Error: {self}")));

        if verbose {
            let mut cause = self.source();
            while let Some(err) = cause {
                out.push_str(&format!("  {}\n", (palette.dim)(&format!("Caused by: {err}"))));
                cause = err.source();
            }
        }

        let hints = self.suggestions();
        if !hints.is_empty() {
            out.push_str(&format!("\n{}\n", (palette.heading)("Suggestions:")));
            for hint in hints {
                out.push_str(&format!("  {hint}\n"));
            }
        }

        if !verbose {
            out.push_str(&format!(
                "\n{}\n",
                (palette.dim)("Use -v / --verbose for more details.")
            ));
        }
        out
    }

    /// Record the failure as a tracing event, before it is printed.
    pub fn log(&self) {
        let category = self.category();
        match category {
            ErrorCategory::UserError | ErrorCategory::NotFound => {
                tracing::warn!(?category, exit_code = self.exit_code(), "{self}")
            }
            ErrorCategory::Configuration | ErrorCategory::Internal => {
                tracing::error!(?category, exit_code = self.exit_code(), "{self}")
            }
        }
        if let Some(source) = self.source() {
            tracing::debug!(cause = %source, "error source");
        }
    }
}

/// Styling for [`CliError::report`].
struct Palette {
    title: fn(&str) -> String,
    heading: fn(&str) -> String,
    dim: fn(&str) -> String,
}

impl Palette {
    const PLAIN: Self = Self {
        title: str::to_owned,
        heading: str::to_owned,
        dim: str::to_owned,
    };

    const COLOURED: Self = Self {
        title: |s| s.red().bold().to_string(),
        heading: |s| s.yellow().bold().to_string(),
        dim: |s| s.dimmed().to_string(),
    };
}

/// How a failure maps onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad arguments, an invalid name, an already initialised project: `2`.
    UserError,
    /// Missing project, sources, templates or platform: `3`.
    NotFound,
    /// `4`.
    Configuration,
    /// Everything else: `1`.
    Internal,
}

impl ErrorCategory {
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Internal => 1,
            Self::UserError => 2,
            Self::NotFound => 3,
            Self::Configuration => 4,
        }
    }
}

impl From<CoreCategory> for ErrorCategory {
    fn from(category: CoreCategory) -> Self {
        match category {
            CoreCategory::Validation | CoreCategory::Conflict => Self::UserError,
            CoreCategory::NotFound => Self::NotFound,
            CoreCategory::Configuration => Self::Configuration,
            CoreCategory::Internal => Self::Internal,
        }
    }
}

// ── IntoCli ───────────────────────────────────────────────────────────────────

/// Attach a context message while converting a foreign error into [`CliError`].
pub trait IntoCli<T> {
    fn with_cli_context<F, S>(self, context: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IntoCli<T> for Result<T, std::io::Error> {
    fn with_cli_context<F, S>(self, context: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| CliError::IoError {
            message: context().into(),
            source,
        })
    }
}

/// Serialising the configuration back to TOML.
impl<T> IntoCli<T> for Result<T, toml::ser::Error> {
    fn with_cli_context<F, S>(self, context: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| CliError::ConfigError {
            message: context().into(),
            source: Some(Box::new(source)),
        })
    }
}
