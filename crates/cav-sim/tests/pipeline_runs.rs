use std::fs;
use std::path::{Path, PathBuf};

use cav_core::{from_json_slice, CavError};
use cav_harminv::BestMode;
use cav_sim::batch::INDEX;
use cav_sim::pipeline::{files, match_from_tables, purcell_from_tables, simulate};
use cav_sim::{case_labels, run_batch, BatchIndex, CaseFiles, CaseStatus, PipelineConfig};

const SPECTRUM: &str = "freq(1/um),Fp\n2.0,2.0\n1.9230769230769231,1.0\n1.8518518518518519,0.5\n1.7857142857142858,4.0\n";
const TRANSITIONS: &str = "Molecule,Energy(eV),Osc\nX,2.0,1e-8\nX,2.2,2e-6\nY,2.1,1e-9\nY,2.3,1e-8\n";

fn write_case(dir: &Path, spectrum: &str, transitions: &str) {
    fs::create_dir_all(dir).expect("case dir");
    fs::write(dir.join("purcell_spectrum.csv"), spectrum).expect("spectrum");
    fs::write(dir.join("transitions.csv"), transitions).expect("transitions");
}

#[test]
fn match_stage_writes_every_artefact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let case = dir.path().join("case");
    write_case(&case, SPECTRUM, TRANSITIONS);
    let out = dir.path().join("out");
    let table = match_from_tables(
        &case.join("purcell_spectrum.csv"),
        &case.join("transitions.csv"),
        &PipelineConfig::default(),
        &out,
    )
    .expect("match");

    assert_eq!(table.records.len(), 2);
    for name in [
        files::LINES,
        files::MATCHING_JSON,
        files::MATCHING_CSV,
        files::MATCHING_TEX,
        files::MATCHING_TXT,
        files::TOLERANCE,
    ] {
        assert!(out.join(name).exists(), "{name} missing");
    }
    let x = table.records.iter().find(|r| r.emitter == "X").expect("X");
    assert_eq!(x.energy_ev, 2.2);
    let y = table.records.iter().find(|r| r.emitter == "Y").expect("Y");
    assert_eq!(y.energy_ev, 2.1);
}

#[test]
fn batch_isolates_failing_cases() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cases = dir.path().join("cases");
    write_case(&cases.join("a_good"), SPECTRUM, TRANSITIONS);
    write_case(
        &cases.join("b_bad_columns"),
        "freq(1/um),P(a.u.)\n1.8,1.0\n",
        TRANSITIONS,
    );
    write_case(&cases.join("c_good"), SPECTRUM, TRANSITIONS);
    let out = dir.path().join("out");
    let pattern = cases.join("*");

    let index = run_batch(&[pattern], &CaseFiles::default(), &PipelineConfig::default(), &out)
        .expect("batch");
    let statuses: Vec<CaseStatus> = index.cases.iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![CaseStatus::Ok, CaseStatus::Failed, CaseStatus::Ok]
    );
    assert_eq!(index.failures(), 1);
    assert!(matches!(
        index.cases[1].error,
        Some(CavError::MissingInputColumn(_))
    ));
    assert!(!out.join("b_bad_columns").exists());
    assert_eq!(index.cases[0].analysis_hash, index.cases[2].analysis_hash);

    let stored: BatchIndex =
        from_json_slice(&fs::read(out.join(INDEX)).expect("index")).expect("decode");
    assert_eq!(stored, index);
}

#[test]
fn batch_keeps_same_named_cases_apart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runs = dir.path().join("runs");
    write_case(&runs.join("a").join("case1"), SPECTRUM, TRANSITIONS);
    write_case(
        &runs.join("b").join("case1"),
        "freq(1/um),P(a.u.)\n1.8,1.0\n",
        TRANSITIONS,
    );
    let out = dir.path().join("out");
    let pattern = runs.join("*").join("case1");

    let index = run_batch(&[pattern], &CaseFiles::default(), &PipelineConfig::default(), &out)
        .expect("batch");
    let labels: Vec<&str> = index.cases.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["case1_00", "case1_01"]);
    assert_eq!(index.cases[0].status, CaseStatus::Ok);
    assert_eq!(index.cases[1].status, CaseStatus::Failed);
    assert!(out.join("case1_00").join(files::MATCHING_JSON).exists());
    assert!(!out.join("case1_01").exists());
    assert!(!out.join("case1").exists());
}

#[test]
fn unique_case_names_are_kept_as_labels() {
    let cases = vec![
        PathBuf::from("runs/a/case1"),
        PathBuf::from("runs/b/case2"),
        PathBuf::from("runs/c/case1"),
    ];
    assert_eq!(case_labels(&cases), vec!["case1_00", "case2", "case1_02"]);
}

#[test]
fn purcell_stage_rejects_mismatched_tables() {
    let dir = tempfile::tempdir().expect("tempdir");
    let reference = dir.path().join("ref_power.csv");
    let device = dir.path().join("device_power.csv");
    fs::write(&reference, "freq(1/um),P(a.u.)\n1.6,1.0\n1.7,2.0\n").expect("ref");
    fs::write(&device, "freq(1/um),P(a.u.)\n1.6,3.0\n1.8,4.0\n").expect("dev");
    let err = purcell_from_tables(&reference, &device, &PipelineConfig::default(), dir.path())
        .expect_err("grid mismatch");
    let cav = err.downcast_ref::<CavError>().expect("pipeline error");
    assert!(matches!(cav, CavError::GridMismatch(_)));
    assert!(!dir.path().join(files::ENHANCEMENT).exists());
}

#[test]
fn simulation_finds_the_configured_mode_and_its_enhancement() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = PipelineConfig::default();
    let outcome = simulate(&config, dir.path()).expect("simulate");

    let scene_mode = config.simulation.scene.modes[0];
    let best = outcome.resonances.best;
    assert!((best.frequency - scene_mode.frequency).abs() < 1e-6);
    assert!((best.q - scene_mode.q).abs() / scene_mode.q < 1e-3);

    let peak = outcome.spectrum.peak.expect("peak");
    let scene = &config.simulation.scene;
    let expected = scene.response(peak.frequency) / scene.background;
    assert!((peak.enhancement - expected).abs() < 1e-9 * expected);
    let step = 2.0 * best.frequency / 16.0 / 249.0;
    assert!((peak.frequency - scene_mode.frequency).abs() <= step);
    assert!(peak.enhancement > 1.0 + 0.5 * scene_mode.coupling);

    let stored: BestMode =
        from_json_slice(&fs::read(dir.path().join(files::BEST_MODE)).expect("best")).expect("decode");
    assert_eq!(stored, best);
    for name in [
        files::MODES,
        files::RINGDOWN,
        files::REFERENCE_POWER,
        files::DEVICE_POWER,
        files::ENHANCEMENT,
        files::PEAK,
    ] {
        assert!(dir.path().join(name).exists(), "{name} missing");
    }
}

#[test]
fn failed_simulation_leaves_no_artefacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("case");
    let mut config = PipelineConfig::default();
    config.simulation.scene.modes[0].q = 5e4;
    config.flux.decay.max_time = Some(300.0);

    let err = simulate(&config, &out).expect_err("flux runs cannot decay in time");
    let cav = err.downcast_ref::<CavError>().expect("pipeline error");
    assert!(matches!(cav, CavError::DidNotConverge(_)));
    assert_eq!(
        cav.info().context.get("stage").map(String::as_str),
        Some("spectrum-build")
    );
    assert!(!out.exists());
}
