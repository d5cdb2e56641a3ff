//! `odf`: generate docker compose data platforms from directories of CSV files.
//!
//! ```text
//! odf init demo --data ./csv --with api/api-postgres --yes
//! odf create demo
//! odf compose start demo
//! ```
//!
//! Exit status: `0` on success, `2` for bad input or an existing project,
//! `3` when a project, source or template is missing, `4` for configuration
//! problems and `1` for everything else.

use std::io::IsTerminal as _;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, instrument};

use crate::{
    cli::{Cli, Commands, ConfigCommands},
    config::AppConfig,
    error::{CliError, CliResult},
    logging::init_logging,
    output::OutputManager,
};

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;

const EXIT_INTERNAL: u8 = 1;
const EXIT_USAGE: u8 = 2;
const EXIT_CONFIG: u8 = 4;

/// Why the process stops short of success.
enum Failure {
    /// Logging or configuration could not be set up.
    Startup { code: u8, message: String },
    /// A command ran and failed.
    Command(CliError),
}

fn main() -> ExitCode {
    // A missing .env is not an error.
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // `--help` and `--version` land here as well, on stdout.
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    let verbose = cli.global.verbose > 0;
    match launch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Startup { code, message }) => {
            eprintln!("Error: {message}");
            ExitCode::from(code)
        }
        Err(Failure::Command(err)) => report(&err, verbose),
    }
}

/// Logging, then configuration, then the command itself.
fn launch(cli: Cli) -> Result<(), Failure> {
    let _guard = init_logging(&cli.global).map_err(|e| Failure::Startup {
        code: EXIT_INTERNAL,
        message: format!("failed to initialise logging: {e:#}"),
    })?;
    debug!(
        verbose = cli.global.verbose,
        quiet = cli.global.quiet,
        format = ?cli.global.output_format,
        "starting"
    );

    // `config init` writes the file `--config` names, so it need not exist yet.
    let config_file = match &cli.command {
        Commands::Config(ConfigCommands::Init { .. }) => None,
        _ => cli.global.config.as_ref(),
    };
    let config = AppConfig::load(config_file).map_err(|e| {
        tracing::error!("configuration rejected: {e:#}");
        Failure::Startup {
            code: EXIT_CONFIG,
            message: format!("failed to load configuration: {e:#}"),
        }
    })?;

    let output = OutputManager::new(&cli.global, &config);
    dispatch(cli, config, output).map_err(|err| {
        err.log();
        Failure::Command(err)
    })?;

    info!("done");
    Ok(())
}

#[instrument(skip_all)]
fn dispatch(cli: Cli, config: AppConfig, output: OutputManager) -> CliResult<()> {
    match cli.command {
        Commands::Init(args) => commands::init::execute(args, cli.global, config, output),
        Commands::Create(args) => commands::create::execute(args, config, output),
        Commands::Components(args) => commands::components::execute(args, output),
        Commands::Compose(args) => commands::compose::execute(args, output),
        Commands::Completions(args) => commands::completions::execute(args),
        Commands::Config(cmd) => commands::config::execute(cmd, config, cli.global.config, output),
    }
}

/// Print `err` on stderr, coloured when stderr is a terminal.
fn report(err: &CliError, verbose: bool) -> ExitCode {
    let text = if std::io::stderr().is_terminal() {
        err.format_colored(verbose)
    } else {
        err.format_plain(verbose)
    };
    eprint!("{text}");
    ExitCode::from(err.exit_code())
}
