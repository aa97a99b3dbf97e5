use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cav_sim::load_config;
use commands::{
    batch::{self, BatchArgs},
    harminv::{self, HarminvArgs},
    lines::{self, LinesArgs},
    matching::{self, MatchArgs},
    purcell::{self, PurcellArgs},
    simulate::{self, SimulateArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "cav-sim", about = "Cavity resonance, Purcell and ZPL matching pipeline")]
struct Cli {
    /// YAML pipeline configuration; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract ranked resonances from a ring-down table.
    Harminv(HarminvArgs),
    /// Build the enhancement spectrum from reference and device power tables.
    Purcell(PurcellArgs),
    /// Run ring-down, resonance extraction and paired flux runs with the modal solver.
    Simulate(SimulateArgs),
    /// Select one line per emitter from a transition table.
    Lines(LinesArgs),
    /// Match emitter lines against an enhancement spectrum.
    Match(MatchArgs),
    /// Match many case directories, isolating failures.
    Batch(BatchArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Harminv(args) => harminv::run(&args, &config),
        Command::Purcell(args) => purcell::run(&args, &config),
        Command::Simulate(args) => simulate::run(&args, &config),
        Command::Lines(args) => lines::run(&args, &config),
        Command::Match(args) => matching::run(&args, &config),
        Command::Batch(args) => batch::run(&args, &config),
    }
}
