//! Command line argument parsing for the Quarry CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Quarry - an embeddable full-text search engine driven by text commands
#[derive(Parser, Debug, Clone)]
#[command(name = "quarry")]
#[command(about = "An embeddable full-text search engine driven by text commands")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct QuarryArgs {
    /// Verbosity level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Engine configuration file (JSON)
    #[arg(short, long, value_name = "FILE", env = "QUARRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Reply format
    #[arg(short = 'f', long = "format", default_value = "json")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON replies
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl QuarryArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose + 1
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Read commands from stdin, one per line, and print one reply per line
    Repl,

    /// Execute a command script
    Run(RunArgs),
}

/// Arguments for running a script
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Script with one command per line; blank lines and lines starting
    /// with '#' are skipped
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Stop at the first failing command
    #[arg(long)]
    pub fail_fast: bool,
}

/// How replies are printed
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON value per reply
    Json,
    /// `OK`, plain integers, JSON values and `(error) CODE message`
    Human,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repl() {
        let args = QuarryArgs::try_parse_from(["quarry", "-vv", "--pretty", "repl"]).unwrap();
        assert_eq!(args.verbosity(), 3);
        assert!(args.pretty);
        assert!(matches!(args.command, Command::Repl));
        assert_eq!(args.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_run() {
        let args = QuarryArgs::try_parse_from([
            "quarry",
            "-q",
            "--config",
            "engine.json",
            "-f",
            "human",
            "run",
            "script.txt",
            "--fail-fast",
        ])
        .unwrap();
        assert_eq!(args.verbosity(), 0);
        assert_eq!(args.config, Some(PathBuf::from("engine.json")));
        assert_eq!(args.output_format, OutputFormat::Human);
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.file, PathBuf::from("script.txt"));
                assert!(run.fail_fast);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_subcommand() {
        assert!(QuarryArgs::try_parse_from(["quarry"]).is_err());
    }
}
