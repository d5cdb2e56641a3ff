//! Implementation of the `odf compose` command.

use tracing::{instrument, warn};

use odf_adapters::{DockerComposeRuntime, LocalFilesystem};
use odf_core::{
    application::{ComposeAction, OrchestrationService, ProjectService},
    domain::Catalog,
};

use crate::{cli::ComposeArgs, commands::project_location, error::CliResult, output::OutputManager};

/// Run one compose action over `<path>/<project>/platform`.
#[instrument(skip_all, fields(project = %args.project))]
pub fn execute(args: ComposeArgs, output: OutputManager) -> CliResult<()> {
    let (project, parent) = project_location(&args.project, args.path)?;
    let root = ProjectService::project_root(&parent, &project);
    let action = ComposeAction::from(args.action);

    let runtime = DockerComposeRuntime::new();
    if !runtime.is_available() {
        warn!("`docker compose version` failed");
        output.warning("docker compose does not seem to be available")?;
    }

    output.header(&format!("compose {action} '{project}'"))?;
    let service = OrchestrationService::new(
        Box::new(LocalFilesystem::new()),
        Box::new(runtime),
        Catalog::builtin(),
    );
    output.info(&format!(
        "docker compose in {}",
        root.join("platform").display()
    ))?;
    if let Err(err) = service.run(&root, action) {
        output.error(&format!("compose {action} failed"))?;
        return Err(err.into());
    }

    output.success(&format!("compose {action} finished"))?;
    Ok(())
}
