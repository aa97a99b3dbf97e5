use cav_core::errors::{CavError, ErrorInfo, Stage};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_stage(Stage::Matching)
        .with_record("hBN_5x5_CB")
}

#[test]
fn no_resonance_is_reported_not_fatal() {
    let err = CavError::NoResonanceFound(sample_info("empty-band", "no modes"));
    assert!(!err.is_fatal());
    assert_eq!(err.info().code, "empty-band");
}

#[test]
fn structural_errors_are_fatal() {
    let errors = [
        CavError::GridMismatch(sample_info("grid-length", "lengths differ")),
        CavError::MissingInputColumn(sample_info("missing-column", "no Fp")),
        CavError::EmptyEmitterGroup(sample_info("empty-group", "no transitions")),
        CavError::DidNotConverge(sample_info("max-time", "fields never decayed")),
    ];
    for err in errors {
        assert!(err.is_fatal(), "{err}");
        assert_eq!(err.info().context.get("stage").map(String::as_str), Some("matching"));
        assert_eq!(err.info().context.get("record").map(String::as_str), Some("hBN_5x5_CB"));
    }
}

#[test]
fn display_lists_context_and_hint() {
    let err = CavError::GridMismatch(
        ErrorInfo::new("grid-value", "grids differ")
            .with_context("index", "3")
            .with_hint("configure both runs from one plan"),
    );
    let text = err.to_string();
    assert!(text.starts_with("grid mismatch: [grid-value] grids differ"));
    assert!(text.contains("index=3"));
    assert!(text.ends_with("; try: configure both runs from one plan"));
}

#[test]
fn errors_round_trip_through_json() {
    let err = CavError::EmptyEmitterGroup(sample_info("empty-group", "nothing left"));
    let json = serde_json::to_string(&err).expect("serialize");
    assert!(json.contains("\"family\":\"EmptyEmitterGroup\""));
    let decoded: CavError = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, err);
}
