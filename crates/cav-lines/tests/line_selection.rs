use cav_core::{CavError, Table};
use cav_lines::{
    extract_lines, load_transitions, LineMethod, LineOpts, PickRule, PoolRule, Transition,
    TransitionColumns,
};
use proptest::prelude::*;

#[test]
fn brightest_lowest_line_wins_over_dim_lower_line() {
    let transitions = vec![
        Transition::new("X", 2.0, 1e-8),
        Transition::new("X", 2.2, 2e-6),
    ];
    let lines = extract_lines(&transitions, &LineOpts::default()).expect("lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].energy_ev, 2.2);
    assert_eq!(lines[0].strength, 2e-6);
    assert_eq!(lines[0].selection.pool, PoolRule::InWindow);
    assert_eq!(lines[0].selection.pick, PickRule::LowestBright);
    assert!((lines[0].wavelength_nm - 1239.84193 / 2.2).abs() < 1e-9);
}

#[test]
fn all_dim_group_falls_back_to_lowest_energy() {
    let transitions = vec![
        Transition::new("Y", 3.1, 5e-7),
        Transition::new("Y", 2.4, 1e-9),
        Transition::new("Y", 2.9, 0.0),
    ];
    let lines = extract_lines(&transitions, &LineOpts::default()).expect("lines");
    assert_eq!(lines[0].energy_ev, 2.4);
    assert_eq!(lines[0].selection.pick, PickRule::Lowest);
    assert!(lines[0].selection.is_fallback());
}

#[test]
fn empty_window_uses_the_whole_group() {
    let transitions = vec![
        Transition::new("Z", 5.2, 0.3),
        Transition::new("Z", 4.8, 0.0),
    ];
    let lines = extract_lines(&transitions, &LineOpts::default()).expect("lines");
    assert_eq!(lines[0].selection.pool, PoolRule::WholeGroup);
    assert_eq!(lines[0].selection.pick, PickRule::LowestBright);
    assert_eq!(lines[0].energy_ev, 5.2);
}

#[test]
fn threshold_is_strict_and_window_is_inclusive() {
    let transitions = vec![
        Transition::new("W", 1.0, 1e-6),
        Transition::new("W", 4.5, 2e-6),
        Transition::new("W", 0.9, 1.0),
    ];
    let lines = extract_lines(&transitions, &LineOpts::default()).expect("lines");
    assert_eq!(lines[0].energy_ev, 4.5);
    assert_eq!(lines[0].selection.pool, PoolRule::InWindow);
}

#[test]
fn output_is_sorted_by_emitter_and_drops_non_finite_rows() {
    let transitions = vec![
        Transition::new("b", 2.0, 0.1),
        Transition::new("a", f64::NAN, 0.5),
        Transition::new("a", 1.5, 0.2),
        Transition::new("c", 2.5, f64::INFINITY),
        Transition::new("c", 3.0, 0.01),
    ];
    let lines = extract_lines(&transitions, &LineOpts::default()).expect("lines");
    let emitters: Vec<&str> = lines.iter().map(|l| l.emitter.as_str()).collect();
    assert_eq!(emitters, vec!["a", "b", "c"]);
    assert_eq!(lines[0].energy_ev, 1.5);
    assert_eq!(lines[2].energy_ev, 3.0);
}

#[test]
fn emitter_without_finite_transitions_is_fatal() {
    let transitions = vec![
        Transition::new("ok", 2.0, 0.1),
        Transition::new("broken", f64::NAN, 0.1),
    ];
    let err = extract_lines(&transitions, &LineOpts::default()).expect_err("empty group");
    assert!(matches!(err, CavError::EmptyEmitterGroup(_)));
    assert_eq!(err.info().context.get("record").map(String::as_str), Some("broken"));
}

#[test]
fn broadened_method_peaks_near_the_dominant_transition() {
    let transitions = vec![
        Transition::new("B", 2.0, 0.05),
        Transition::new("B", 2.6, 0.9),
    ];
    let opts = LineOpts {
        method: LineMethod::Broadened,
        ..LineOpts::default()
    };
    let lines = extract_lines(&transitions, &opts).expect("lines");
    assert_eq!(lines[0].selection.pick, PickRule::BroadenedPeak);
    assert!((lines[0].energy_ev - 2.6).abs() < 0.01);
    assert_eq!(lines[0].strength, 0.9);
}

#[test]
fn broadened_method_falls_back_when_no_line_reaches_the_window() {
    // both lines sit more than 4 sigma above the 4.5 eV window edge
    let transitions = vec![
        Transition::new("Z", 5.4, 0.1),
        Transition::new("Z", 5.2, 0.3),
    ];
    let opts = LineOpts {
        method: LineMethod::Broadened,
        ..LineOpts::default()
    };
    let lines = extract_lines(&transitions, &opts).expect("lines");
    assert_eq!(lines[0].selection.pool, PoolRule::WholeGroup);
    assert_eq!(lines[0].selection.pick, PickRule::Lowest);
    assert_eq!(lines[0].energy_ev, 5.2);
    assert_eq!(lines[0].strength, 0.3);
}

#[test]
fn transitions_load_from_declared_columns() {
    let csv = "Molecule,Energy(eV),Osc\nX,2.0,1e-8\nX,2.2,2e-6\nY,inf,0.1\n";
    let table = Table::read(csv.as_bytes(), "all_spectra_merged.csv").expect("table");
    let transitions = load_transitions(&table, &TransitionColumns::default()).expect("load");
    assert_eq!(transitions.len(), 3);
    assert!(!transitions[2].is_finite());

    let renamed = TransitionColumns {
        energy: "E".to_string(),
        ..TransitionColumns::default()
    };
    let err = load_transitions(&table, &renamed).expect_err("missing E");
    assert!(matches!(err, CavError::MissingInputColumn(_)));
}

proptest! {
    #[test]
    fn selected_bright_line_is_the_lowest_bright_in_window(
        entries in prop::collection::vec((0.5f64..5.5, 0.0f64..1e-5), 1..20)
    ) {
        let transitions: Vec<Transition> = entries
            .iter()
            .map(|&(e, f)| Transition::new("P", e, f))
            .collect();
        let opts = LineOpts::default();
        let line = extract_lines(&transitions, &opts).unwrap().remove(0);

        let in_window: Vec<&Transition> = transitions
            .iter()
            .filter(|t| opts.window.contains(t.energy_ev))
            .collect();
        let pool: Vec<&Transition> = if in_window.is_empty() {
            transitions.iter().collect()
        } else {
            in_window
        };
        let bright_min = pool
            .iter()
            .filter(|t| t.strength > opts.threshold)
            .map(|t| t.energy_ev)
            .fold(f64::INFINITY, f64::min);
        let any_min = pool.iter().map(|t| t.energy_ev).fold(f64::INFINITY, f64::min);
        if bright_min.is_finite() {
            prop_assert_eq!(line.energy_ev, bright_min);
            prop_assert_eq!(line.selection.pick, PickRule::LowestBright);
        } else {
            prop_assert_eq!(line.energy_ev, any_min);
            prop_assert_eq!(line.selection.pick, PickRule::Lowest);
        }
    }
}
