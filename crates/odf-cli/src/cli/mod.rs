//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use odf_core::application::ComposeAction;
use odf_core::domain::{Layer, Layout, Profile};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "odf",
    bin_name = "odf",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Data platform generator",
    long_about = "odf turns a directory of CSV files into a docker compose \
                  data platform: storage, REST APIs, analytics dashboards, \
                  devcontainers and utilities, one entity per file.",
    after_help = "EXAMPLES:\n\
        \x20 odf init demo --data ./csv --with api/api-postgres --with analytics/superset --yes\n\
        \x20 odf create demo\n\
        \x20 odf compose build demo && odf compose start demo\n\
        \x20 odf init study --profile research --yes",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer entities from CSV sources and write `settings.json`.
    #[command(
        about = "Initialise a project from CSV sources",
        after_help = "EXAMPLES:\n\
            \x20 odf init demo                                   # interactive\n\
            \x20 odf init demo --with api/api-postgres --yes     # every entity gets an API\n\
            \x20 odf init study --profile research --data ./raw  # research preset"
    )]
    Init(InitArgs),

    /// Materialize the platform described by `settings.json`.
    #[command(
        about = "Create the platform of an initialised project",
        after_help = "EXAMPLES:\n\
            \x20 odf create demo\n\
            \x20 odf create demo --path ../projects --templates ./templates"
    )]
    Create(CreateArgs),

    /// List the component catalog.
    #[command(
        visible_alias = "ls",
        about = "List available components",
        after_help = "EXAMPLES:\n\
            \x20 odf components\n\
            \x20 odf components --layer storage\n\
            \x20 odf components --format json"
    )]
    Components(ComponentsArgs),

    /// Drive docker compose over a created platform.
    #[command(
        about = "Build, start, stop or inspect the platform containers",
        after_help = "EXAMPLES:\n\
            \x20 odf compose build demo\n\
            \x20 odf compose start demo\n\
            \x20 odf compose status demo"
    )]
    Compose(ComposeArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 odf completions bash > ~/.local/share/bash-completion/completions/odf\n\
            \x20 odf completions zsh  > ~/.zfunc/_odf\n\
            \x20 odf completions fish > ~/.config/fish/completions/odf.fish"
    )]
    Completions(CompletionsArgs),

    /// Manage the odf configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 odf config init\n\
            \x20 odf config get defaults.profile\n\
            \x20 odf config list"
    )]
    Config(ConfigCommands),
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `odf init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Project name (`[A-Za-z0-9_]+`, lower-cased).
    #[arg(value_name = "PROJECT", help = "Project name")]
    pub project: String,

    /// Parent directory of the project.
    #[arg(
        short = 'p',
        long = "path",
        value_name = "DIR",
        help = "Parent directory of the project (default: current directory)"
    )]
    pub path: Option<PathBuf>,

    /// Directory holding the CSV sources copied into `<project>/data`.
    #[arg(
        short = 'd',
        long = "data",
        value_name = "DIR",
        help = "Directory of CSV sources (default: defaults.data_dir)"
    )]
    pub data: Option<PathBuf>,

    #[arg(long = "profile", value_enum, help = "Profile preset")]
    pub profile: Option<ProfileArg>,

    /// Ignored by the research profile, which forces its own layout.
    #[arg(long = "layout", value_enum, help = "Project layout")]
    pub layout: Option<LayoutArg>,

    /// Register a component on every entity; repeatable.
    #[arg(
        short = 'w',
        long = "with",
        value_name = "LAYER/COMPONENT",
        help = "Register LAYER/COMPONENT on every entity (repeatable)"
    )]
    pub with: Vec<String>,

    /// Skip the prompts and accept the inferred defaults.
    #[arg(short = 'y', long = "yes", help = "Accept defaults without prompting")]
    pub yes: bool,
}

/// Profile presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileArg {
    Custom,
    Research,
}

impl From<ProfileArg> for Profile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Custom => Profile::Custom,
            ProfileArg::Research => Profile::Research,
        }
    }
}

/// Directory layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    Custom,
    Research,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Custom => Layout::Custom,
            LayoutArg::Research => Layout::Research,
        }
    }
}

// ── create ────────────────────────────────────────────────────────────────────

/// Arguments for `odf create`.
#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(value_name = "PROJECT", help = "Project name")]
    pub project: String,

    #[arg(
        short = 'p',
        long = "path",
        value_name = "DIR",
        help = "Parent directory of the project (default: current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(
        short = 't',
        long = "templates",
        value_name = "DIR",
        help = "Template tree (default: defaults.templates_dir)"
    )]
    pub templates: Option<PathBuf>,
}

// ── components ────────────────────────────────────────────────────────────────

/// Arguments for `odf components`.
#[derive(Debug, Args)]
pub struct ComponentsArgs {
    /// Only list components of this layer.
    #[arg(short = 'l', long = "layer", value_enum, help = "Filter by layer")]
    pub layer: Option<LayerArg>,

    /// Output format; follows `--output-format json` when omitted.
    #[arg(long = "format", value_enum, help = "Output format")]
    pub format: Option<ListFormat>,
}

/// Catalog layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayerArg {
    Analytics,
    Api,
    Devcontainers,
    Storage,
    Utility,
}

impl From<LayerArg> for Layer {
    fn from(arg: LayerArg) -> Self {
        match arg {
            LayerArg::Analytics => Layer::Analytics,
            LayerArg::Api => Layer::Api,
            LayerArg::Devcontainers => Layer::Devcontainers,
            LayerArg::Storage => Layer::Storage,
            LayerArg::Utility => Layer::Utility,
        }
    }
}

/// Output format for the `components` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One `layer/component` per line.
    List,
    /// JSON array.
    Json,
    /// CSV rows.
    Csv,
}

// ── compose ───────────────────────────────────────────────────────────────────

/// Arguments for `odf compose`.
#[derive(Debug, Args)]
pub struct ComposeArgs {
    #[arg(value_enum, value_name = "ACTION", help = "What to do with the containers")]
    pub action: ComposeActionArg,

    #[arg(value_name = "PROJECT", help = "Project name")]
    pub project: String,

    #[arg(
        short = 'p',
        long = "path",
        value_name = "DIR",
        help = "Parent directory of the project (default: current directory)"
    )]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ComposeActionArg {
    /// Build images, layer by layer.
    Build,
    /// `up -d`, layer by layer.
    Start,
    /// Stop containers, layer by layer.
    Stop,
    /// `ps --all`.
    Status,
}

impl From<ComposeActionArg> for ComposeAction {
    fn from(arg: ComposeActionArg) -> Self {
        match arg {
            ComposeActionArg::Build => ComposeAction::Build,
            ComposeActionArg::Start => ComposeAction::Start,
            ComposeActionArg::Stop => ComposeAction::Stop,
            ComposeActionArg::Status => ComposeAction::Status,
        }
    }
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `odf completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `odf config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `defaults.profile`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
    /// Write the default configuration file.
    Init {
        /// Overwrite an existing config file.
        #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
        force: bool,
    },
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_init_command() {
        let cli = Cli::parse_from([
            "odf",
            "init",
            "demo",
            "--data",
            "csv",
            "--with",
            "api/api-postgres",
            "--with",
            "utility/nginx",
            "--yes",
        ]);
        let Commands::Init(args) = cli.command else {
            panic!("expected Init command");
        };
        assert_eq!(args.project, "demo");
        assert_eq!(args.with, vec!["api/api-postgres", "utility/nginx"]);
        assert!(args.yes);
        assert!(args.profile.is_none());
    }

    #[test]
    fn parse_compose_command() {
        let cli = Cli::parse_from(["odf", "compose", "start", "demo", "--path", "/srv"]);
        let Commands::Compose(args) = cli.command else {
            panic!("expected Compose command");
        };
        assert_eq!(ComposeAction::from(args.action), ComposeAction::Start);
        assert_eq!(args.path, Some(PathBuf::from("/srv")));
    }

    #[test]
    fn value_enums_map_onto_core_types() {
        assert_eq!(Profile::from(ProfileArg::Research), Profile::Research);
        assert_eq!(Layout::from(LayoutArg::Custom), Layout::Custom);
        assert_eq!(Layer::from(LayerArg::Devcontainers), Layer::Devcontainers);
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::parse_from(["odf", "components", "-vv", "--no-color"]);
        assert_eq!(cli.global.verbose, 2);
        assert!(cli.global.no_color);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["odf", "--quiet", "--verbose", "components"]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(Cli::try_parse_from(["odf", "compose", "restart", "demo"]).is_err());
    }
}
