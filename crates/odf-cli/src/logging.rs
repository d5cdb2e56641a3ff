//! Tracing setup for the `odf` binary.
//!
//! The library crates only emit events; this is the one place a subscriber
//! is installed. Events go to stderr, and additionally to `--log-file`.
//!
//! | Flag(s)   | `odf*` targets |
//! |-----------|----------------|
//! | `--quiet` | ERROR          |
//! | (none)    | WARN           |
//! | `-v`      | INFO           |
//! | `-vv`     | DEBUG          |
//! | `-vvv`    | TRACE          |
//!
//! A set `RUST_LOG` replaces the table entirely.

use std::io::IsTerminal as _;
use std::path::Path;

use anyhow::Context;
use tracing::level_filters::LevelFilter;
use tracing_appender::{non_blocking::WorkerGuard, rolling::RollingFileAppender};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::GlobalArgs;

const TARGETS: [&str; 3] = ["odf", "odf_core", "odf_adapters"];

/// Install the global subscriber.
///
/// Keep the returned guard alive until exit; dropping it flushes the log file.
pub fn init_logging(args: &GlobalArgs) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(level_for(args))));

    let stderr = fmt::layer()
        .without_time()
        .with_target(false)
        .with_ansi(!args.no_color && std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    let (file, guard) = match args.log_file.as_deref() {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .try_init()
        .context("a tracing subscriber is already installed")?;

    Ok(guard)
}

fn level_for(args: &GlobalArgs) -> LevelFilter {
    if args.quiet {
        return LevelFilter::ERROR;
    }
    match args.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn directives(level: LevelFilter) -> String {
    TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Never-rotating appender for `path`, creating its directory.
fn file_appender(path: &Path) -> anyhow::Result<RollingFileAppender> {
    let name = path
        .file_name()
        .with_context(|| format!("log file '{}' has no file name", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory '{}'", dir.display()))?;
    Ok(tracing_appender::rolling::never(dir, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;

    fn args(verbose: u8, quiet: bool) -> GlobalArgs {
        GlobalArgs {
            verbose,
            quiet,
            no_color: true,
            config: None,
            output_format: OutputFormat::Auto,
            log_file: None,
        }
    }

    #[test]
    fn verbosity_maps_to_levels() {
        let cases = [
            (0, LevelFilter::WARN),
            (1, LevelFilter::INFO),
            (2, LevelFilter::DEBUG),
            (3, LevelFilter::TRACE),
            (9, LevelFilter::TRACE),
        ];
        for (verbose, expected) in cases {
            assert_eq!(level_for(&args(verbose, false)), expected, "-v x{verbose}");
        }
    }

    #[test]
    fn quiet_wins() {
        assert_eq!(level_for(&args(0, true)), LevelFilter::ERROR);
        assert_eq!(level_for(&args(3, true)), LevelFilter::ERROR);
    }

    #[test]
    fn directives_cover_every_crate() {
        assert_eq!(
            directives(LevelFilter::DEBUG).to_lowercase(),
            "odf=debug,odf_core=debug,odf_adapters=debug"
        );
    }

    #[test]
    fn file_appender_creates_parent_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        file_appender(&dir.path().join("logs/odf.log")).unwrap();
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn file_appender_rejects_directory_paths() {
        assert!(file_appender(Path::new("/")).is_err());
    }
}
