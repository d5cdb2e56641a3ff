//! Orchestration Service - drives the container runtime over a generated
//! platform, one compose profile per layer.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::{
    application::{
        ApplicationError,
        ports::{ContainerRuntime, Filesystem},
        services::materializers::PLATFORM_DIR,
    },
    domain::{Catalog, Role},
    error::OdfResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeAction {
    Build,
    Start,
    Stop,
    Status,
}

impl ComposeAction {
    /// Compose subcommand run for this action.
    pub const fn subcommand(&self) -> &'static [&'static str] {
        match self {
            Self::Build => &["build"],
            Self::Start => &["up", "-d"],
            Self::Stop => &["stop"],
            Self::Status => &["ps", "--all"],
        }
    }

    /// Whether the action runs once per layer profile.
    pub const fn is_per_layer(&self) -> bool {
        !matches!(self, Self::Status)
    }
}

impl fmt::Display for ComposeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Build => "build",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Status => "status",
        })
    }
}

pub struct OrchestrationService {
    filesystem: Box<dyn Filesystem>,
    runtime: Box<dyn ContainerRuntime>,
    catalog: Catalog,
}

impl OrchestrationService {
    pub fn new(
        filesystem: Box<dyn Filesystem>,
        runtime: Box<dyn ContainerRuntime>,
        catalog: Catalog,
    ) -> Self {
        Self {
            filesystem,
            runtime,
            catalog,
        }
    }

    /// Run `action` in `root/platform`. Layers run sequentially in catalog
    /// order; the first failure stops the run.
    #[instrument(skip(self), fields(root = %root.display()))]
    pub fn run(&self, root: &Path, action: ComposeAction) -> OdfResult<()> {
        let platform = self.platform(root)?;

        if !action.is_per_layer() {
            return self.runtime.compose(&platform, &to_args(action.subcommand()));
        }

        for layer in self.catalog.layers() {
            let mut args = vec!["--profile".to_string(), layer.layer.to_string()];
            args.extend(to_args(action.subcommand()));
            info!(layer = %layer.layer, %action, "compose");
            self.runtime.compose(&platform, &args)?;
        }
        Ok(())
    }

    fn platform(&self, root: &Path) -> OdfResult<PathBuf> {
        let platform = root.join(PLATFORM_DIR);
        let compose = platform.join(Role::Deployment.file_name());
        if !self.filesystem.exists(&compose) {
            return Err(ApplicationError::NotFound { path: compose }.into());
        }
        Ok(platform)
    }
}

fn to_args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| (*part).to_string()).collect()
}
