use std::error::Error;
use std::path::PathBuf;

use cav_sim::pipeline::purcell_from_tables;
use cav_sim::PipelineConfig;
use clap::Args;

#[derive(Args, Debug)]
pub struct PurcellArgs {
    /// Reference power table.
    #[arg(long)]
    pub reference: PathBuf,
    /// Device power table.
    #[arg(long)]
    pub device: PathBuf,
    /// Output directory.
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &PurcellArgs, config: &PipelineConfig) -> Result<(), Box<dyn Error>> {
    let outcome = purcell_from_tables(&args.reference, &args.device, config, &args.out)?;
    if let Some(peak) = outcome.peak {
        println!(
            "Purcell peak: Fp={:.3} at f={:.6} (lambda={:.1} nm)",
            peak.enhancement, peak.frequency, peak.wavelength_nm
        );
    }
    Ok(())
}
