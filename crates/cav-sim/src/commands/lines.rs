use std::error::Error;
use std::path::PathBuf;

use cav_sim::pipeline::lines_from_table;
use cav_sim::PipelineConfig;
use clap::Args;

#[derive(Args, Debug)]
pub struct LinesArgs {
    /// Transition table.
    #[arg(long)]
    pub transitions: PathBuf,
    /// Output directory.
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &LinesArgs, config: &PipelineConfig) -> Result<(), Box<dyn Error>> {
    let lines = lines_from_table(&args.transitions, config, &args.out)?;
    for line in &lines {
        println!(
            "{}  E={:.3} eV  lambda={:.1} nm  osc={:.3e}  [{:?}/{:?}]",
            line.emitter,
            line.energy_ev,
            line.wavelength_nm,
            line.strength,
            line.selection.pool,
            line.selection.pick
        );
    }
    Ok(())
}
