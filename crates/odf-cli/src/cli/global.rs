//! Flags accepted by every `odf` subcommand.

use std::path::PathBuf;

use clap::{ArgAction, Args, ValueEnum};

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// `-v` logs every created file, `-vv` merges and substitutions, `-vvv` everything.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Never emit ANSI colours (also honours `NO_COLOR`).
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// TOML file layered over the built-in defaults.
    #[arg(short, long, global = true, env = "ODF_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// How results are rendered on stdout.
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Auto,
        env = "ODF_OUTPUT_FORMAT"
    )]
    pub output_format: OutputFormat,

    /// Tee log events, uncoloured, into FILE.
    #[arg(long, global = true, env = "ODF_LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Rendering of command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `human` on a terminal, `plain` otherwise.
    #[default]
    Auto,
    /// Coloured, with headers and symbols.
    Human,
    /// No colours or decoration.
    Plain,
    /// A single JSON document where the command supports it.
    Json,
}
