use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use fables_core::config::{log, polling};
use tracing_subscriber::EnvFilter;

mod commands;
mod shutdown;

#[derive(Parser)]
#[command(name = "fables-splitter")]
#[command(about = "Bug Fables speedrun auto-splitter", version)]
struct Args {
    /// Split file (JSON); without one only the start and the ending are detected
    #[arg(short, long, value_name = "FILE", global = true, env = "FABLES_SPLITS")]
    splits: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Watch the game and report start, split and end events (default)
    Run {
        /// Diagnostic log file
        #[arg(long, value_name = "FILE", default_value = log::DEFAULT_FILE_NAME)]
        log_file: PathBuf,

        /// Disable the diagnostic log file
        #[arg(long, conflicts_with = "log_file")]
        no_log: bool,

        /// Delay between polls in milliseconds
        #[arg(
            long,
            default_value_t = polling::DEFAULT_INTERVAL_MS,
            value_parser = clap::value_parser!(u64).range(polling::MIN_INTERVAL_MS..)
        )]
        interval_ms: u64,
    },
    /// Hook the game once and print every readable value as JSON
    Status,
    /// Validate a split file and print its contents
    Splits,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("fables_splitter=info".parse()?)
                .add_directive("fables_core=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let splits = args.splits.as_deref();

    match args.command {
        Some(Command::Run {
            log_file,
            no_log,
            interval_ms,
        }) => commands::run::run(splits, (!no_log).then_some(log_file.as_path()), interval_ms),
        Some(Command::Status) => commands::status::run(splits),
        Some(Command::Splits) => commands::splits::run(splits),
        None => commands::run::run(
            splits,
            Some(Path::new(log::DEFAULT_FILE_NAME)),
            polling::DEFAULT_INTERVAL_MS,
        ),
    }
}
