use std::error::Error;
use std::path::PathBuf;

use cav_sim::pipeline::resonances_from_table;
use cav_sim::PipelineConfig;
use clap::Args;

#[derive(Args, Debug)]
pub struct HarminvArgs {
    /// Ring-down table with the configured time and field columns.
    #[arg(long)]
    pub series: PathBuf,
    /// Output directory for `modes.json` and `best_mode.json`.
    #[arg(long)]
    pub out: PathBuf,
    /// Override the center-frequency guess.
    #[arg(long)]
    pub center: Option<f64>,
    /// Override the bandwidth guess.
    #[arg(long)]
    pub bandwidth: Option<f64>,
}

pub fn run(args: &HarminvArgs, config: &PipelineConfig) -> Result<(), Box<dyn Error>> {
    let mut config = config.clone();
    if let Some(center) = args.center {
        config.harminv.center = center;
    }
    if let Some(bandwidth) = args.bandwidth {
        config.harminv.bandwidth = bandwidth;
    }
    let outcome = resonances_from_table(&args.series, &config, &args.out)?;
    for mode in outcome.set.modes.iter().take(8) {
        println!(
            "freq={:.6}  Q={:.1}  lambda={:.1} nm  decay={:.3e}",
            mode.frequency,
            mode.q,
            mode.wavelength_nm(&config.units),
            mode.decay_rate
        );
    }
    Ok(())
}
