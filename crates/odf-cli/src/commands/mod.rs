//! Command handlers, one module per subcommand.
//!
//! Handlers translate parsed arguments into core service calls and print the
//! results. No business logic lives here.

pub mod completions;
pub mod components;
pub mod compose;
pub mod config;
pub mod create;
pub mod init;

use std::path::PathBuf;

use odf_core::{domain::Identifier, error::OdfError};

use crate::error::CliResult;

/// Validate a project name and resolve its parent directory.
pub(crate) fn project_location(
    project: &str,
    path: Option<PathBuf>,
) -> CliResult<(Identifier, PathBuf)> {
    let project = Identifier::parse(project).map_err(OdfError::from)?;
    Ok((project, path.unwrap_or_else(|| PathBuf::from("."))))
}
