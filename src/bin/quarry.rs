//! Quarry CLI binary.

use std::io::Write;
use std::process;

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use quarry::cli::args::QuarryArgs;
use quarry::cli::commands::execute_command;

fn main() {
    let args = QuarryArgs::parse();

    let log_level = match args.verbosity() {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    // Logs go to stderr so replies on stdout stay machine readable.
    Builder::new()
        .filter_level(log_level)
        .parse_env("QUARRY_LOG")
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
