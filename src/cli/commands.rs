//! Command implementations for the Quarry CLI.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::time::Instant;

use anyhow::{bail, Context};

use crate::cli::args::*;
use crate::cli::output::write_reply;
use crate::command;
use crate::config::EngineConfig;
use crate::engine::Engine;

/// Execute a CLI command.
pub fn execute_command(args: QuarryArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("failed to load engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let engine = Engine::new(config);

    match &args.command {
        Command::Repl => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            let summary = run_lines(&engine, stdin.lock(), &mut stdout.lock(), &args, false)?;
            log::info!(
                "session finished: {} commands, {} errors",
                summary.executed,
                summary.failed
            );
            Ok(())
        }
        Command::Run(run_args) => {
            let file = File::open(&run_args.file)
                .with_context(|| format!("failed to open script {}", run_args.file.display()))?;
            let stdout = io::stdout();
            let start = Instant::now();
            let summary = run_lines(
                &engine,
                BufReader::new(file),
                &mut stdout.lock(),
                &args,
                run_args.fail_fast,
            )?;
            log::info!(
                "executed {} commands in {:?}",
                summary.executed,
                start.elapsed()
            );
            if summary.failed > 0 {
                bail!(
                    "{} of {} commands failed in {}",
                    summary.failed,
                    summary.executed,
                    run_args.file.display()
                );
            }
            Ok(())
        }
    }
}

/// Counts of a finished command stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: usize,
    pub failed: usize,
}

/// Execute every command line of `input`, writing one reply per command.
pub fn run_lines<R: BufRead, W: Write>(
    engine: &Engine,
    input: R,
    out: &mut W,
    args: &QuarryArgs,
    fail_fast: bool,
) -> anyhow::Result<RunSummary> {
    let mut summary = RunSummary::default();

    for (number, line) in input.lines().enumerate() {
        let line = line.context("failed to read command")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let reply = command::execute(engine, line);
        summary.executed += 1;
        if reply.is_error() {
            summary.failed += 1;
            log::debug!("line {}: {}", number + 1, reply);
        }
        write_reply(out, &reply, args.output_format, args.pretty)?;
        out.flush()?;

        if fail_fast && reply.is_error() {
            break;
        }
    }

    Ok(summary)
}
