//! Implementation of the `odf create` command.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use odf_adapters::LocalFilesystem;
use odf_core::{
    application::{CompositionReport, CompositionService, ProjectService},
    domain::Catalog,
};

use crate::{
    cli::{CreateArgs, OutputFormat},
    commands::project_location,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Materialize `<path>/<project>/platform` from its `settings.json`.
#[instrument(skip_all, fields(project = %args.project))]
pub fn execute(args: CreateArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let (project, parent) = project_location(&args.project, args.path)?;
    let root = ProjectService::project_root(&parent, &project);
    let templates = template_tree(
        args.templates.or(config.defaults.templates_dir),
        AppConfig::bundled_templates(),
    )?;
    info!(templates = %templates.display(), "using template tree");

    output.header(&format!("Creating platform for '{project}'..."))?;
    let service = CompositionService::new(Box::new(LocalFilesystem::new()), Catalog::builtin());
    let report = service.create(&root, &templates)?;

    if output.format() == OutputFormat::Json {
        output.data(&report_json(&root, &report).to_string())?;
        return Ok(());
    }

    output.print("Components:")?;
    for path in &report.components {
        output.print(&format!("  {}", relative(&root, path)))?;
    }
    output.print("Artifacts:")?;
    for path in &report.artifacts {
        output.print(&format!("  {}", relative(&root, path)))?;
    }
    output.print("")?;

    output.success(&format!("Platform created at {}", root.join("platform").display()))?;
    output.print("")?;
    output.print("Next steps:")?;
    output.print(&format!("  odf compose build {project}"))?;
    output.print(&format!("  odf compose start {project}"))?;
    Ok(())
}

/// An explicit tree is handed to the core as is; the build-time fallback
/// must still exist.
fn template_tree(explicit: Option<PathBuf>, bundled: PathBuf) -> CliResult<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if !bundled.is_dir() {
        warn!(path = %bundled.display(), "build-time template tree is missing");
        return Err(CliError::ConfigError {
            message: format!(
                "no template tree configured and the build-time default '{}' does not exist; \
                 pass --templates or set defaults.templates_dir",
                bundled.display()
            ),
            source: None,
        });
    }
    Ok(bundled)
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn report_json(root: &Path, report: &CompositionReport) -> serde_json::Value {
    let paths = |paths: &[PathBuf]| -> Vec<String> {
        paths.iter().map(|path| relative(root, path)).collect()
    };
    serde_json::json!({
        "root": root.display().to_string(),
        "components": paths(&report.components),
        "artifacts": paths(&report.artifacts),
    })
}
