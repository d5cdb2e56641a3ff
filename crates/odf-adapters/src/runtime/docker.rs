//! `docker compose` runtime adapter.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use odf_core::{
    application::{ApplicationError, ports::ContainerRuntime},
    error::OdfResult,
};

/// Runs `docker compose <args>` with inherited stdio, so build and start
/// progress stream straight to the terminal.
#[derive(Debug, Clone)]
pub struct DockerComposeRuntime {
    program: String,
}

impl DockerComposeRuntime {
    pub fn new() -> Self {
        Self::with_program("docker")
    }

    /// Use another docker-compatible binary (e.g. `podman`).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Check if the compose plugin is available.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .args(["compose", "version"])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn command_line(&self, args: &[String]) -> String {
        std::iter::once(self.program.as_str())
            .chain(std::iter::once("compose"))
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for DockerComposeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerRuntime for DockerComposeRuntime {
    fn compose(&self, workdir: &Path, args: &[String]) -> OdfResult<()> {
        let command = self.command_line(args);
        debug!(%command, workdir = %workdir.display(), "running");

        let status = Command::new(&self.program)
            .arg("compose")
            .args(args)
            .current_dir(workdir)
            .status()
            .map_err(|e| ApplicationError::ExternalCommand {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(ApplicationError::ExternalCommand {
                command,
                reason: status.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
