//! Structured error types shared across the cavity pipeline crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`CavError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Kebab-case code, stable across releases.
    pub code: String,
    /// Diagnostic message for the operator.
    pub message: String,
    /// Contextual key value pairs (stage, record, sizes, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Suggested remedy, if one is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Builds a payload with empty context.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Attaches one context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Records the pipeline stage that raised the error.
    pub fn with_stage(self, stage: Stage) -> Self {
        self.with_context("stage", stage.as_str())
    }

    /// Records the record (emitter, table row, run label) that failed.
    pub fn with_record(self, record: impl Into<String>) -> Self {
        self.with_context("record", record)
    }

    /// Attaches a remedy hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Pipeline stage identifiers used in error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Harmonic inversion of a ring-down time series.
    ResonanceExtraction,
    /// Paired reference/device flux runs and normalisation.
    SpectrumBuild,
    /// Per-emitter line selection.
    LineExtraction,
    /// Spectral matching and tolerance aggregation.
    Matching,
    /// Table loading and artefact export.
    Io,
}

impl Stage {
    /// Returns the kebab-case label used in error context.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ResonanceExtraction => "resonance-extraction",
            Stage::SpectrumBuild => "spectrum-build",
            Stage::LineExtraction => "line-extraction",
            Stage::Matching => "matching",
            Stage::Io => "io",
        }
    }
}

/// Canonical error type for the cavity pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum CavError {
    /// Harmonic inversion produced no resonance inside the search band.
    #[error("no resonance found: {0}")]
    NoResonanceFound(ErrorInfo),
    /// Reference and device frequency grids disagree.
    #[error("grid mismatch: {0}")]
    GridMismatch(ErrorInfo),
    /// A declared column is absent from an input table.
    #[error("missing input column: {0}")]
    MissingInputColumn(ErrorInfo),
    /// An emitter has no usable transitions after every fallback.
    #[error("empty emitter group: {0}")]
    EmptyEmitterGroup(ErrorInfo),
    /// A decay-based stopping condition never triggered within its bound.
    #[error("did not converge: {0}")]
    DidNotConverge(ErrorInfo),
    /// Malformed numeric input (non-uniform sampling, empty grids, bad options).
    #[error("invalid input: {0}")]
    InvalidInput(ErrorInfo),
    /// Malformed JSON, YAML or CSV.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
    /// Filesystem errors.
    #[error("io error: {0}")]
    Io(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        let pairs: Vec<String> = self
            .context
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        if !pairs.is_empty() {
            write!(f, " ({})", pairs.join(", "))?;
        }
        match &self.hint {
            Some(hint) => write!(f, "; try: {hint}"),
            None => Ok(()),
        }
    }
}

impl CavError {
    /// Payload shared by every variant.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            CavError::NoResonanceFound(info)
            | CavError::GridMismatch(info)
            | CavError::MissingInputColumn(info)
            | CavError::EmptyEmitterGroup(info)
            | CavError::DidNotConverge(info)
            | CavError::InvalidInput(info)
            | CavError::Serde(info)
            | CavError::Io(info) => info,
        }
    }

    /// Whether the error aborts the current case.
    ///
    /// `NoResonanceFound` is a reported condition: the caller widens the
    /// search band or re-runs the simulation instead of aborting the batch.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CavError::NoResonanceFound(_))
    }

    /// Builds an [`CavError::Io`] from a filesystem error and the offending path.
    pub fn io(code: &str, err: impl ToString, path: impl AsRef<std::path::Path>) -> Self {
        CavError::Io(
            ErrorInfo::new(code, err.to_string())
                .with_stage(Stage::Io)
                .with_context("path", path.as_ref().display().to_string()),
        )
    }
}
