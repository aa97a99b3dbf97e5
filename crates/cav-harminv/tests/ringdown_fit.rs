use cav_core::{CavError, LengthUnit};
use cav_harminv::{extract_resonances, harminv, HarminvOpts, SearchBand, TimeSeries};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TAU: f64 = 2.0 * std::f64::consts::PI;

fn ringdown(dt: f64, samples: usize, modes: &[(f64, f64, f64)]) -> Vec<f64> {
    (0..samples)
        .map(|n| {
            let t = n as f64 * dt;
            modes
                .iter()
                .map(|&(freq, q, amp)| {
                    let decay = std::f64::consts::PI * freq / q;
                    amp * (-decay * t).exp() * (TAU * freq * t).cos()
                })
                .sum()
        })
        .collect()
}

#[test]
fn two_mode_ringdown_is_ranked_by_quality() {
    let dt = 0.05;
    let values = ringdown(dt, 2000, &[(1.62, 800.0, 1.0), (1.91, 120.0, 0.7)]);
    let series = TimeSeries::uniform(0.0, dt, values).expect("series");
    let set = extract_resonances(&series, &SearchBand::new(1.75, 0.6), &HarminvOpts::default())
        .expect("modes");

    assert_eq!(set.modes.len(), 2);
    let best = &set.modes[0];
    assert!((best.frequency - 1.62).abs() < 1e-6);
    assert!((best.q - 800.0).abs() / 800.0 < 1e-4);
    assert!((set.modes[1].frequency - 1.91).abs() < 1e-6);
    assert!(set.fit_residual < 1e-6);

    let descriptor = set.best_mode(&LengthUnit::default()).expect("best");
    assert!((descriptor.wavelength_nm - 1000.0 / 1.62).abs() < 1e-3);
}

#[test]
fn modes_outside_the_band_are_ignored() {
    let dt = 0.05;
    let values = ringdown(dt, 900, &[(0.8, 300.0, 1.0)]);
    let series = TimeSeries::uniform(0.0, dt, values).expect("series");
    let err = extract_resonances(&series, &SearchBand::new(1.75, 0.6), &HarminvOpts::default())
        .expect_err("nothing in band");
    assert!(matches!(err, CavError::NoResonanceFound(_)));
    assert!(!err.is_fatal());

    let set = harminv(&series, &SearchBand::new(1.75, 0.6), &HarminvOpts::default())
        .expect("raw set");
    assert!(set.modes.is_empty());
    assert!(set.best().is_none());
}

#[test]
fn noisy_ringdown_still_finds_the_cavity_mode() {
    let dt = 0.05;
    let mut values = ringdown(dt, 1500, &[(1.70, 400.0, 1.0)]);
    let mut rng = StdRng::seed_from_u64(7);
    for value in values.iter_mut() {
        *value += rng.gen_range(-1e-3..1e-3);
    }
    let series = TimeSeries::uniform(0.0, dt, values).expect("series");
    let opts = HarminvOpts {
        svd_threshold: 1e-2,
        ..HarminvOpts::default()
    };
    let set = extract_resonances(&series, &SearchBand::new(1.75, 0.6), &opts).expect("modes");
    let best = set.best().expect("best");
    assert!((best.frequency - 1.70).abs() < 1e-3);
    assert!((best.q - 400.0).abs() / 400.0 < 0.05);
}

#[test]
fn long_records_are_decimated() {
    let dt = 0.005;
    let values = ringdown(dt, 20_000, &[(1.75, 2000.0, 1.0)]);
    let series = TimeSeries::uniform(0.0, dt, values).expect("series");
    let set = extract_resonances(&series, &SearchBand::new(1.75, 0.6), &HarminvOpts::default())
        .expect("modes");
    assert!(set.stride > 1);
    assert!(set.samples_used <= 600);
    assert!((set.modes[0].frequency - 1.75).abs() < 1e-6);
}

#[test]
fn irregular_sampling_is_rejected() {
    let times = vec![0.0, 0.1, 0.2, 0.35, 0.4, 0.5, 0.6, 0.7, 0.8];
    let values = vec![1.0; 9];
    let series = TimeSeries::new(times, values).expect("monotonic");
    let err = harminv(&series, &SearchBand::new(1.0, 0.5), &HarminvOpts::default())
        .expect_err("irregular");
    assert_eq!(err.info().code, "non-uniform-sampling");
}
