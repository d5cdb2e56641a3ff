//! Everything `odf` prints on stdout goes through [`OutputManager`].
//!
//! Decorated lines (headers, `✓`, `ℹ`, `⚠`) disappear under `--quiet`; payloads
//! written with [`OutputManager::data`] never do, so `odf components --format
//! csv -q` still pipes cleanly.

use std::io::{self, IsTerminal};

use console::Term;
use owo_colors::OwoColorize;

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

#[derive(Debug, Clone, Copy)]
enum Tone {
    Success,
    Info,
    Warning,
    Error,
}

impl Tone {
    const fn symbol(self) -> &'static str {
        match self {
            Self::Success => "\u{2713}",
            Self::Info => "\u{2139}",
            Self::Warning => "\u{26a0}",
            Self::Error => "\u{2717}",
        }
    }
}

pub struct OutputManager {
    format: OutputFormat,
    quiet: bool,
    colour: bool,
    term: Term,
}

impl OutputManager {
    /// Settle the output format: an explicit flag wins, then `output.format`
    /// from the config; `human` degrades to `plain` when stdout is piped.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        let requested = match args.output_format {
            OutputFormat::Auto => match config.output.format.as_str() {
                "plain" => OutputFormat::Plain,
                "json" => OutputFormat::Json,
                _ => OutputFormat::Human,
            },
            explicit => explicit,
        };
        let format = resolve(requested, io::stdout().is_terminal());

        Self {
            format,
            quiet: args.quiet,
            colour: format == OutputFormat::Human && !args.no_color && !config.output.no_color,
            term: Term::stdout(),
        }
    }

    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// A result payload: JSON, CSV, completions, config values.
    pub fn data(&self, payload: &str) -> io::Result<()> {
        self.term.write_line(payload)
    }

    pub fn success(&self, msg: &str) -> io::Result<()> {
        self.toned(Tone::Success, msg)
    }

    pub fn info(&self, msg: &str) -> io::Result<()> {
        self.toned(Tone::Info, msg)
    }

    pub fn warning(&self, msg: &str) -> io::Result<()> {
        self.toned(Tone::Warning, msg)
    }

    /// Shown even under `--quiet`.
    pub fn error(&self, msg: &str) -> io::Result<()> {
        self.term.write_line(&self.render(Tone::Error, msg))
    }

    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        if self.colour {
            self.term.write_line(&text.cyan().bold().to_string())
        } else {
            self.term.write_line(text)
        }
    }

    /// The resolved format, never `Auto`.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn toned(&self, tone: Tone, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(&self.render(tone, msg))
    }

    fn render(&self, tone: Tone, msg: &str) -> String {
        let symbol = tone.symbol();
        match (self.colour, tone) {
            (false, _) => format!("{symbol} {msg}"),
            (true, Tone::Success) => format!("{} {}", symbol.green().bold(), msg.green()),
            (true, Tone::Info) => format!("{} {}", symbol.blue().bold(), msg),
            (true, Tone::Warning) => format!("{} {}", symbol.yellow().bold(), msg.yellow()),
            (true, Tone::Error) => format!("{} {}", symbol.red().bold(), msg.red()),
        }
    }
}

fn resolve(requested: OutputFormat, stdout_is_tty: bool) -> OutputFormat {
    match requested {
        OutputFormat::Auto | OutputFormat::Human if !stdout_is_tty => OutputFormat::Plain,
        OutputFormat::Auto => OutputFormat::Human,
        other => other,
    }
}
