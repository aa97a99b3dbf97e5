use std::error::Error;
use std::path::PathBuf;

use cav_sim::pipeline::match_from_tables;
use cav_sim::PipelineConfig;
use clap::Args;

#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Enhancement table.
    #[arg(long)]
    pub spectrum: PathBuf,
    /// Transition table.
    #[arg(long)]
    pub transitions: PathBuf,
    /// Output directory.
    #[arg(long)]
    pub out: PathBuf,
    /// Override the windowed-lookup tolerance in nm.
    #[arg(long)]
    pub tolerance_nm: Option<f64>,
}

pub fn run(args: &MatchArgs, config: &PipelineConfig) -> Result<(), Box<dyn Error>> {
    let mut config = config.clone();
    if let Some(tolerance) = args.tolerance_nm {
        config.matching.tolerance_nm = tolerance;
    }
    let table = match_from_tables(&args.spectrum, &args.transitions, &config, &args.out)?;
    print!("{}", table.to_text());
    Ok(())
}
