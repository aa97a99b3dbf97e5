use std::error::Error;
use std::path::PathBuf;

use cav_sim::{run_batch, CaseFiles, PipelineConfig};
use clap::Args;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Case directories or glob patterns.
    #[arg(long = "inputs", value_name = "PATH", num_args = 1..)]
    pub inputs: Vec<PathBuf>,
    /// Output directory; one subdirectory per case plus `index.json`.
    #[arg(long)]
    pub out: PathBuf,
    /// Enhancement table name inside each case directory.
    #[arg(long, default_value = "purcell_spectrum.csv")]
    pub spectrum_file: String,
    /// Transition table name inside each case directory.
    #[arg(long, default_value = "transitions.csv")]
    pub transitions_file: String,
}

pub fn run(args: &BatchArgs, config: &PipelineConfig) -> Result<(), Box<dyn Error>> {
    let files = CaseFiles {
        spectrum: args.spectrum_file.clone(),
        transitions: args.transitions_file.clone(),
    };
    let index = run_batch(&args.inputs, &files, config, &args.out)?;
    println!(
        "{} cases, {} failed; index written to {}",
        index.cases.len(),
        index.failures(),
        args.out.join(cav_sim::batch::INDEX).display()
    );
    Ok(())
}
