//! Implementation of the `odf init` command.
//!
//! Responsibility: prepare the project workspace, decide every entity's
//! naming and components (prompts or flags), then hand over to the profile
//! service, which writes `settings.json`.

use std::io::IsTerminal;
use std::str::FromStr;

use tracing::{debug, info, instrument};

use odf_adapters::{CsvSchemaReader, LocalFilesystem};
use odf_core::{
    application::{EntityDraft, EntityPlan, ProfileService, ProjectService},
    domain::{Catalog, Component, Layer, Layout, Profile, Settings},
    error::OdfError,
};

use crate::{
    cli::{GlobalArgs, InitArgs, OutputFormat},
    commands::project_location,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute the `odf init` command.
///
/// 1. Validate the project name and the `--with` selections
/// 2. Create `<path>/<project>/data` from the CSV sources
/// 3. Build one plan per source (prompts, or defaults plus `--with`)
/// 4. Register everything and persist `settings.json`
#[instrument(skip_all, fields(project = %args.project))]
pub fn execute(
    args: InitArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let (project, parent) = project_location(&args.project, args.path)?;
    let data = args.data.unwrap_or_else(|| config.defaults.data_dir.clone());
    let profile = match args.profile {
        Some(profile) => profile.into(),
        None => parse_default::<Profile>("defaults.profile", &config.defaults.profile)?,
    };

    let catalog = Catalog::builtin();
    let selections = args
        .with
        .iter()
        .map(|value| parse_selection(&catalog, value))
        .collect::<CliResult<Vec<_>>>()?;

    let projects = ProjectService::new(
        Box::new(LocalFilesystem::new()),
        Box::new(CsvSchemaReader::new()),
    );
    projects.ensure_not_initialized(&ProjectService::project_root(&parent, &project))?;
    let root = projects.prepare_workspace(&parent, &project, &data)?;
    debug!(root = %root.display(), %profile, "workspace ready");

    let profiles = ProfileService::new(projects, catalog);
    let settings = match profile {
        Profile::Research => {
            if !selections.is_empty() {
                output.warning("--with is ignored by the research profile")?;
            }
            profiles.init_research(&root, &project)?
        }
        Profile::Custom => {
            let layout = match args.layout {
                Some(layout) => layout.into(),
                None => parse_default::<Layout>("defaults.layout", &config.defaults.layout)?,
            };
            let drafts = profiles
                .projects()
                .discover_sources(&root, Profile::Custom)?;
            let interactive = !args.yes && !global.quiet && std::io::stdin().is_terminal();
            let (layout, plans) = plan_entities(&catalog, drafts, &selections, layout, interactive)?;
            profiles.init_custom(&root, &project, layout, &plans)?
        }
    };
    info!(entities = settings.entities().len(), "settings written");

    if output.format() == OutputFormat::Json {
        output.data(&settings.to_json().map_err(OdfError::from)?)?;
        return Ok(());
    }

    show_entities(&settings, &output)?;
    output.success(&format!(
        "Project '{project}' initialised at {}",
        root.display()
    ))?;
    output.print("")?;
    output.print("Next steps:")?;
    output.print(&format!("  odf create {project}"))?;
    Ok(())
}

/// Parse `LAYER/COMPONENT` against the catalog.
pub(crate) fn parse_selection(catalog: &Catalog, value: &str) -> CliResult<(Layer, Component)> {
    let (layer, component) = value
        .split_once('/')
        .ok_or_else(|| CliError::InvalidSelection {
            value: value.into(),
            reason: "expected LAYER/COMPONENT".into(),
        })?;
    catalog
        .resolve(layer.trim(), component.trim())
        .map_err(|e| CliError::InvalidSelection {
            value: value.into(),
            reason: e.to_string(),
        })
}

fn parse_default<T>(key: &str, value: &str) -> CliResult<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(value).map_err(|e| CliError::ConfigError {
        message: format!("{key} = '{value}'"),
        source: Some(Box::new(e)),
    })
}

fn plan_entities(
    catalog: &Catalog,
    drafts: Vec<EntityDraft>,
    selections: &[(Layer, Component)],
    layout: Layout,
    interactive: bool,
) -> CliResult<(Layout, Vec<EntityPlan>)> {
    #[cfg(feature = "interactive")]
    {
        if interactive {
            return prompt::plan(catalog, drafts, selections, layout);
        }
    }
    #[cfg(not(feature = "interactive"))]
    {
        if interactive {
            debug!("built without prompts, using defaults");
        }
        let _ = catalog;
    }
    Ok((layout, default_plans(drafts, selections)))
}

/// Every draft keeps its inferred naming and gets every selection.
fn default_plans(drafts: Vec<EntityDraft>, selections: &[(Layer, Component)]) -> Vec<EntityPlan> {
    drafts
        .into_iter()
        .map(|draft| {
            selections
                .iter()
                .fold(EntityPlan::new(draft), |plan, &(layer, component)| {
                    plan.with_component(layer, component)
                })
        })
        .collect()
}

fn show_entities(settings: &Settings, out: &OutputManager) -> CliResult<()> {
    out.header("Entities")?;
    for (plural_name, entity) in settings.entities() {
        let components: Vec<String> = entity
            .layers
            .iter()
            .flat_map(|(layer, components)| {
                components.keys().map(move |component| format!("{layer}/{component}"))
            })
            .collect();
        out.print(&format!(
            "  {plural_name:<16} {:>3} fields  {}",
            entity.fields.len(),
            if components.is_empty() {
                "-".to_string()
            } else {
                components.join(", ")
            }
        ))?;
    }
    out.print("")?;
    Ok(())
}

#[cfg(feature = "interactive")]
mod prompt {
    use dialoguer::{Input, MultiSelect, Select, theme::ColorfulTheme};

    use odf_core::{
        application::{EntityDraft, EntityPlan},
        domain::{Catalog, Component, ComponentDef, Layer, Layout},
    };

    use crate::error::{CliError, CliResult};

    /// Ask for the layout, then every entity's naming and components.
    pub fn plan(
        catalog: &Catalog,
        drafts: Vec<EntityDraft>,
        selections: &[(Layer, Component)],
        layout: Layout,
    ) -> CliResult<(Layout, Vec<EntityPlan>)> {
        let theme = ColorfulTheme::default();

        let layouts: Vec<&str> = Layout::ALL.iter().map(Layout::as_str).collect();
        let current = Layout::ALL.iter().position(|l| *l == layout).unwrap_or(0);
        let picked = Select::with_theme(&theme)
            .with_prompt("Layout")
            .items(&layouts)
            .default(current)
            .interact_opt()?
            .ok_or(CliError::Cancelled)?;
        let layout = Layout::ALL.get(picked).copied().unwrap_or(layout);

        let components: Vec<&ComponentDef> = catalog.components().collect();
        let labels: Vec<String> = components
            .iter()
            .map(|def| format!("{}/{}  {}", def.layer, def.component, def.description))
            .collect();

        let mut plans = Vec::with_capacity(drafts.len());
        for mut draft in drafts {
            let file = draft.file_name();
            draft.name = Input::<String>::with_theme(&theme)
                .with_prompt(format!("{file}: entity name"))
                .default(draft.name.clone())
                .interact_text()?;
            draft.plural_name = Input::<String>::with_theme(&theme)
                .with_prompt(format!("{file}: plural name"))
                .default(draft.plural_name.clone())
                .interact_text()?;
            draft.description = Input::<String>::with_theme(&theme)
                .with_prompt(format!("{file}: description"))
                .default(draft.description.clone())
                .allow_empty(true)
                .interact_text()?;

            let checked: Vec<bool> = components
                .iter()
                .map(|def| selections.contains(&(def.layer, def.component)))
                .collect();
            let chosen = MultiSelect::with_theme(&theme)
                .with_prompt(format!("{file}: components (space toggles, enter confirms)"))
                .items(&labels)
                .defaults(&checked)
                .interact_opt()?
                .ok_or(CliError::Cancelled)?;

            let plan = chosen
                .into_iter()
                .filter_map(|index| components.get(index))
                .fold(EntityPlan::new(draft), |plan, def| {
                    plan.with_component(def.layer, def.component)
                });
            plans.push(plan);
        }
        Ok((layout, plans))
    }
}
