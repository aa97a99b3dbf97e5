use std::fs;

use cav_lines::LineMethod;
use cav_sim::{load_config, PipelineConfig};

#[test]
fn missing_config_uses_canonical_defaults() {
    let config = load_config(None).expect("defaults");
    assert_eq!(config, PipelineConfig::default());
    assert_eq!(config.lines.window.min_ev, 1.0);
    assert_eq!(config.lines.window.max_ev, 4.5);
    assert_eq!(config.lines.threshold, 1e-6);
    assert_eq!(config.matching.baseline_lifetime_ns, 1.0);
    assert_eq!(config.matching.acceptance.min_nm, 560.0);
    assert_eq!(config.matching.acceptance.max_nm, 590.0);
    assert_eq!(config.matching.tolerance_nm, 10.0);
    assert_eq!(config.flux.points, 250);
    assert_eq!(config.flux.decay.check_interval, 50.0);
    assert_eq!(config.flux.decay.relative_decay, 1e-8);
    assert_eq!(config.flux.decay.max_time, Some(100_000.0));
    assert_eq!(config.schemas.enhancement.y, "Fp");
    assert_eq!(config.schemas.transitions.emitter, "Molecule");
}

#[test]
fn partial_yaml_overrides_only_named_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("pipeline.yaml");
    fs::write(
        &path,
        r#"
harminv:
  center: 1.6
  max_samples: 400
flux:
  points: 101
  decay:
    max_time: 5000
lines:
  threshold: 1.0e-4
  method: broadened
matching:
  acceptance: { min_nm: 600, max_nm: 640 }
schemas:
  enhancement: { x: "f", y: "purcell" }
"#,
    )
    .expect("write");
    let config = load_config(Some(&path)).expect("config");
    assert_eq!(config.harminv.center, 1.6);
    assert_eq!(config.harminv.bandwidth, 0.6);
    assert_eq!(config.harminv.opts.max_samples, 400);
    assert_eq!(config.harminv.opts.max_modes, 50);
    assert_eq!(config.flux.points, 101);
    assert_eq!(config.flux.decay.max_time, Some(5000.0));
    assert_eq!(config.flux.decay.check_interval, 50.0);
    assert_eq!(config.lines.threshold, 1e-4);
    assert_eq!(config.lines.method, LineMethod::Broadened);
    assert_eq!(config.matching.acceptance.max_nm, 640.0);
    assert_eq!(config.matching.tolerance_nm, 10.0);
    assert_eq!(config.schemas.enhancement.y, "purcell");
    assert_eq!(config.schemas.power.y, "P(a.u.)");
}

#[test]
fn malformed_yaml_names_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "flux: [not, a, map]\n").expect("write");
    let err = load_config(Some(&path)).expect_err("invalid");
    assert!(err.to_string().contains("broken.yaml"));
}
