use cav_core::{ev_to_nm, nm_to_ev, to_canonical_json_bytes, LengthUnit, Table};
use cav_flux::{EnhancementSpectrum, GridTolerance, PowerSpectrum, ValidatedPair};
use cav_lines::{extract_lines, EmitterLine, LineOpts, Transition};
use cav_match::{match_lines, MatchOpts, MatchTable, WavelengthSpectrum, MATCH_HEADERS};
use proptest::prelude::*;

fn scenario_spectrum() -> EnhancementSpectrum {
    let grid: Vec<f64> = [500.0, 520.0, 540.0, 560.0]
        .iter()
        .map(|nm| 1000.0 / nm)
        .collect();
    let reference = PowerSpectrum::new(grid.clone(), vec![1.0; 4]).expect("ref");
    let device = PowerSpectrum::new(grid, vec![2.0, 1.0, 0.5, 4.0]).expect("dev");
    ValidatedPair::from_spectra(reference, device, GridTolerance::default())
        .expect("grids")
        .divide()
}

fn lines() -> Vec<EmitterLine> {
    let transitions = vec![
        Transition::new("hBN_C2", nm_to_ev(575.0), 0.2),
        Transition::new("hBN_VN", nm_to_ev(521.0), 0.1),
        Transition::new("hBN_ON", nm_to_ev(700.0), 0.3),
        Transition::new("hBN_CB", nm_to_ev(548.0), 0.05),
    ];
    extract_lines(&transitions, &LineOpts::default()).expect("lines")
}

fn table() -> MatchTable {
    match_lines(
        &scenario_spectrum(),
        &lines(),
        &LengthUnit::default(),
        &MatchOpts::default(),
    )
    .expect("match")
}

#[test]
fn scenario_peak_is_at_560_nm() {
    let spectrum = scenario_spectrum();
    assert_eq!(spectrum.enhancement(), &[2.0, 1.0, 0.5, 4.0]);
    let table = table();
    assert!((table.peak.wavelength_nm - 560.0).abs() < 1e-9);
    assert_eq!(table.peak.enhancement, 4.0);
}

#[test]
fn records_are_sorted_by_detuning() {
    let table = table();
    let order: Vec<&str> = table.records.iter().map(|r| r.emitter.as_str()).collect();
    assert_eq!(order, vec!["hBN_CB", "hBN_C2", "hBN_VN", "hBN_ON"]);
    let detunings: Vec<f64> = table.records.iter().map(|r| r.detuning_nm).collect();
    assert!(detunings.windows(2).all(|w| w[0] <= w[1]));

    let c2 = &table.records[1];
    assert!(c2.in_window);
    assert_eq!(c2.enhancement, 4.0);
    assert!((c2.matched_wavelength_nm - 560.0).abs() < 1e-9);
    assert!((c2.lifetime_ratio - 0.25).abs() < 1e-12);
    assert!((c2.lifetime_ns - 0.25).abs() < 1e-12);
    assert_eq!(c2.windowed_enhancement, 0.0);

    let cb = &table.records[0];
    assert_eq!(cb.enhancement, 0.5);
    assert!((cb.detuning_nm - 12.0).abs() < 1e-9);

    let vn = &table.records[2];
    assert!(!vn.in_window);
    assert_eq!(vn.enhancement, 1.0);
    assert_eq!(vn.windowed_enhancement, 1.0);

    let on = &table.records[3];
    assert_eq!(on.enhancement, 4.0);
    assert_eq!(on.windowed_enhancement, 0.0);
}

#[test]
fn zero_enhancement_reports_infinite_lifetime() {
    let spectrum = EnhancementSpectrum::new(vec![1.6, 1.7], vec![0.0, 3.0]).expect("spectrum");
    let lines = extract_lines(
        &[Transition::new("dark", nm_to_ev(625.0), 0.1)],
        &LineOpts::default(),
    )
    .expect("lines");
    let table = match_lines(&spectrum, &lines, &LengthUnit::default(), &MatchOpts::default())
        .expect("match");
    let record = &table.records[0];
    assert_eq!(record.enhancement, 0.0);
    assert_eq!(record.lifetime_ratio, f64::INFINITY);
    assert_eq!(record.lifetime_ns, f64::INFINITY);

    let json = String::from_utf8(to_canonical_json_bytes(&table).expect("json")).expect("utf8");
    assert!(json.contains("\"lifetime_ratio\": \"inf\""));
    let back: MatchTable = serde_json::from_str(&json).expect("decode");
    assert_eq!(back.records[0].lifetime_ratio, f64::INFINITY);

    let mut csv = Vec::new();
    table.write_csv_to(&mut csv).expect("csv");
    let parsed = Table::read(csv.as_slice(), "matching.csv").expect("table");
    assert_eq!(parsed.headers().len(), MATCH_HEADERS.len());
    assert_eq!(
        parsed.numeric_column("lifetime_ratio").expect("column"),
        vec![f64::INFINITY]
    );
}

#[test]
fn matching_is_byte_identical_across_runs() {
    let first = to_canonical_json_bytes(&table()).expect("json");
    let second = to_canonical_json_bytes(&table()).expect("json");
    assert_eq!(first, second);
    assert_eq!(table().analysis_hash, table().analysis_hash);
    assert_eq!(table().analysis_hash.len(), 64);
}

#[test]
fn renderings_cover_every_record() {
    let table = table();
    let latex = table.to_latex();
    assert!(latex.contains("\\toprule"));
    assert!(latex.contains("hBN\\_C2"));
    assert_eq!(latex.matches("\\\\\n").count(), table.records.len() + 1);

    let text = table.to_text();
    assert_eq!(text.lines().count(), table.records.len() + 2);
    assert!(text.starts_with("peak: 560.0 nm"));

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tolerance.csv");
    table.write_tolerance_csv(&path).expect("write");
    let curve = Table::read_path(&path).expect("read");
    assert_eq!(curve.len(), table.records.len());
}

proptest! {
    #[test]
    fn windowed_max_matches_brute_force(
        points in prop::collection::vec((400.0f64..800.0, 0.0f64..20.0), 1..40),
        target in 380.0f64..820.0,
        tolerance in 0.0f64..30.0,
    ) {
        let (wavelengths, values): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
        let view = WavelengthSpectrum::new(wavelengths.clone(), values.clone()).unwrap();
        let expected = wavelengths
            .iter()
            .zip(values.iter())
            .filter(|(w, _)| (*w - target).abs() <= tolerance)
            .map(|(_, v)| *v)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
            .unwrap_or(0.0);
        prop_assert_eq!(view.windowed_max(target, tolerance), expected);
    }

    #[test]
    fn energy_wavelength_round_trip(energy in 0.5f64..6.0) {
        let back = nm_to_ev(ev_to_nm(energy));
        prop_assert!(((back - energy) / energy).abs() <= 1e-9);
    }
}

#[test]
fn wider_tolerance_can_exceed_the_nearest_point() {
    let opts = MatchOpts {
        tolerance_nm: 25.0,
        ..MatchOpts::default()
    };
    let table = match_lines(&scenario_spectrum(), &lines(), &LengthUnit::default(), &opts)
        .expect("match");
    let vn = table
        .records
        .iter()
        .find(|r| r.emitter == "hBN_VN")
        .expect("record");
    assert_eq!(vn.enhancement, 1.0);
    assert_eq!(vn.windowed_enhancement, 2.0);
    assert_ne!(table.provenance.options_hash, default_options_hash());
}

fn default_options_hash() -> String {
    cav_core::stable_hash_string(&MatchOpts::default()).expect("hash")
}

#[test]
fn tied_peaks_resolve_to_the_same_point_in_both_views() {
    // ascending frequency, so 560 nm comes first and 500 nm last
    let grid: Vec<f64> = [560.0, 540.0, 520.0, 500.0]
        .iter()
        .map(|nm| 1000.0 / nm)
        .collect();
    let spectrum = EnhancementSpectrum::new(grid, vec![4.0, 0.5, 1.0, 4.0]).expect("spectrum");
    let unit = LengthUnit::default();

    let by_frequency = spectrum.peak(&unit).expect("peak");
    let (peak_nm, peak_value) = WavelengthSpectrum::from_frequency(&spectrum, &unit, true)
        .expect("view")
        .peak();
    assert_eq!(by_frequency.index, 3);
    assert_eq!(by_frequency.wavelength_nm, peak_nm);
    assert_eq!(by_frequency.enhancement, peak_value);
    assert!((peak_nm - 500.0).abs() < 1e-9);
}
