use cav_core::{CavError, Table, XyColumns};
use cav_flux::{EnhancementSpectrum, GridTolerance, PowerSpectrum, ValidatedPair};
use proptest::prelude::*;

fn power_columns() -> XyColumns {
    XyColumns::new("freq(1/um)", "P(a.u.)")
}

#[test]
fn power_tables_round_trip_through_csv() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ref_power.csv");
    let spectrum = PowerSpectrum::new(vec![1.6, 1.7, 1.8], vec![0.25, 1.5, 0.125]).expect("spectrum");
    spectrum.write_csv(&path, &power_columns()).expect("write");

    let text = std::fs::read_to_string(&path).expect("read");
    assert!(text.starts_with("freq(1/um),P(a.u.)\n"));

    let table = Table::read_path(&path).expect("table");
    let loaded = PowerSpectrum::from_table(&table, &power_columns()).expect("load");
    assert_eq!(loaded, spectrum);
}

#[test]
fn enhancement_table_requires_declared_columns() {
    let csv = "freq(1/um),P(a.u.)\n1.0,2.0\n";
    let table = Table::read(csv.as_bytes(), "purcell_spectrum.csv").expect("table");
    let err = EnhancementSpectrum::from_table(&table, &XyColumns::new("freq(1/um)", "Fp"))
        .expect_err("no Fp column");
    assert!(matches!(err, CavError::MissingInputColumn(_)));
    assert_eq!(
        err.info().context.get("available").map(String::as_str),
        Some("freq(1/um), P(a.u.)")
    );
}

proptest! {
    #[test]
    fn enhancement_is_never_negative_or_nan_from_reference_noise(
        reference in prop::collection::vec(-1.0f64..10.0, 1..64),
        scale in 0.0f64..5.0,
    ) {
        let grid: Vec<f64> = (0..reference.len()).map(|i| 1.0 + i as f64 * 0.01).collect();
        let device: Vec<f64> = reference.iter().map(|r| r.abs() * scale).collect();
        let pair = ValidatedPair::from_spectra(
            PowerSpectrum::new(grid.clone(), reference.clone()).unwrap(),
            PowerSpectrum::new(grid, device).unwrap(),
            GridTolerance::default(),
        ).unwrap();
        let spectrum = pair.divide();
        for (value, r) in spectrum.enhancement().iter().zip(reference.iter()) {
            prop_assert!(value.is_finite());
            prop_assert!(*value >= 0.0);
            if *r <= 0.0 {
                prop_assert_eq!(*value, 0.0);
            }
        }
    }
}
