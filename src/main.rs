use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use viradyn::manager::Manager;

/// Simulate virus populations inside hosts, with and without drug treatment,
/// and average their time series across trials.
#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Simulation directory containing `config.toml`.
    #[arg(long)]
    sim_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new run and simulate its first batch of trials.
    Create,

    /// Simulate another batch of trials of an existing run.
    Resume {
        /// Index of the run to extend.
        #[arg(long)]
        run_idx: usize,
    },

    /// Average population counts per step across the trials of every run.
    Analyze,

    /// Remove all runs.
    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.sim_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Create => mgr.create_run()?,
        Command::Resume { run_idx } => mgr.resume_run(run_idx)?,
        Command::Analyze => mgr.analyze_sim()?,
        Command::Clean => mgr.clean_sim()?,
    }

    Ok(())
}
