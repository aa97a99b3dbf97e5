use std::error::Error;
use std::path::PathBuf;

use cav_sim::pipeline::simulate;
use cav_sim::PipelineConfig;
use clap::Args;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Output directory.
    #[arg(long)]
    pub out: PathBuf,
    /// Run reference and device one after the other.
    #[arg(long)]
    pub sequential: bool,
}

pub fn run(args: &SimulateArgs, config: &PipelineConfig) -> Result<(), Box<dyn Error>> {
    let mut config = config.clone();
    if args.sequential {
        config.flux.parallel = false;
    }
    let outcome = simulate(&config, &args.out)?;
    let best = outcome.resonances.best;
    println!(
        "best mode: f={:.6}  Q={:.1}  lambda={:.1} nm",
        best.frequency, best.q, best.wavelength_nm
    );
    if let Some(peak) = outcome.spectrum.peak {
        println!(
            "Purcell peak: Fp={:.3} at lambda={:.1} nm",
            peak.enhancement, peak.wavelength_nm
        );
    }
    Ok(())
}
