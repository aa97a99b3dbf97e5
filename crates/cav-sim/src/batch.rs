//! Batch matching over many case directories.
//!
//! A failing case is logged and recorded in `index.json`; the remaining
//! cases still run.

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use cav_core::CavError;
use glob::glob;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::pipeline::{match_from_tables, write_json};

/// Index file written at the batch output root.
pub const INDEX: &str = "index.json";

/// Outcome of one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    /// Artefacts were written.
    Ok,
    /// The case failed; no artefacts were kept.
    Failed,
}

/// One row of the batch index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Output directory name: the input directory name, suffixed with the
    /// case index when another case shares it.
    pub label: String,
    /// Case status.
    pub status: CaseStatus,
    /// Content hash of the matching report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_hash: Option<String>,
    /// Number of emitters matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emitters: Option<usize>,
    /// Structured pipeline error when the failure came from a stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CavError>,
    /// Error text for any failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Batch index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BatchIndex {
    /// Cases in sorted input-path order.
    pub cases: Vec<BatchEntry>,
}

impl BatchIndex {
    /// Number of failed cases.
    pub fn failures(&self) -> usize {
        self.cases
            .iter()
            .filter(|case| case.status == CaseStatus::Failed)
            .count()
    }
}

/// Input file names looked up inside each case directory.
#[derive(Debug, Clone)]
pub struct CaseFiles {
    /// Enhancement table.
    pub spectrum: String,
    /// Transition table.
    pub transitions: String,
}

impl Default for CaseFiles {
    fn default() -> Self {
        Self {
            spectrum: "purcell_spectrum.csv".to_string(),
            transitions: "transitions.csv".to_string(),
        }
    }
}

/// Expands glob patterns and returns sorted, de-duplicated paths.
pub fn resolve_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut resolved = Vec::new();
    for path in paths {
        let text = path.to_string_lossy();
        if text.contains('*') || text.contains('?') || text.contains('[') {
            for entry in glob(&text)? {
                resolved.push(entry?);
            }
        } else {
            resolved.push(path.clone());
        }
    }
    resolved.sort();
    resolved.dedup();
    if resolved.is_empty() {
        return Err("no inputs resolved for batch".into());
    }
    Ok(resolved)
}

fn base_label(path: &Path, idx: usize) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("case_{idx:02}"))
}

/// Output directory names, one per case and pairwise distinct.
///
/// A case keeps its directory name unless another case shares it; shared
/// names get the case index as a suffix.
pub fn case_labels(cases: &[PathBuf]) -> Vec<String> {
    let bases: Vec<String> = cases
        .iter()
        .enumerate()
        .map(|(idx, case)| base_label(case, idx))
        .collect();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for base in &bases {
        *counts.entry(base.as_str()).or_default() += 1;
    }
    let mut used = BTreeSet::new();
    let mut labels = Vec::with_capacity(bases.len());
    for (idx, base) in bases.iter().enumerate() {
        let mut label = if counts.get(base.as_str()).copied().unwrap_or(0) > 1 {
            format!("{base}_{idx:02}")
        } else {
            base.clone()
        };
        let mut attempt = 1;
        while used.contains(&label) {
            label = format!("{base}_{idx:02}_{attempt}");
            attempt += 1;
        }
        used.insert(label.clone());
        labels.push(label);
    }
    labels
}

/// Runs matching for every case directory and writes `index.json`.
pub fn run_batch(
    inputs: &[PathBuf],
    files: &CaseFiles,
    config: &PipelineConfig,
    out: &Path,
) -> Result<BatchIndex, Box<dyn Error>> {
    fs::create_dir_all(out)?;
    let cases = resolve_inputs(inputs)?;
    let mut index = BatchIndex::default();
    let labels = case_labels(&cases);
    for (case, label) in cases.iter().zip(labels) {
        let case_out = out.join(&label);
        let result = match_from_tables(
            &case.join(&files.spectrum),
            &case.join(&files.transitions),
            config,
            &case_out,
        );
        let entry = match result {
            Ok(table) => {
                info!(case = %label, emitters = table.records.len(), "case complete");
                BatchEntry {
                    label,
                    status: CaseStatus::Ok,
                    analysis_hash: Some(table.analysis_hash.clone()),
                    emitters: Some(table.records.len()),
                    error: None,
                    message: None,
                }
            }
            Err(err) => {
                error!(case = %label, error = %err, "case failed");
                if case_out.exists() {
                    if let Err(cleanup) = fs::remove_dir_all(&case_out) {
                        warn!(case = %label, error = %cleanup, "could not remove partial output");
                    }
                }
                BatchEntry {
                    label,
                    status: CaseStatus::Failed,
                    analysis_hash: None,
                    emitters: None,
                    error: err.downcast_ref::<CavError>().cloned(),
                    message: Some(err.to_string()),
                }
            }
        };
        index.cases.push(entry);
    }
    write_json(out.join(INDEX), &index)?;
    info!(
        cases = index.cases.len(),
        failed = index.failures(),
        "batch complete"
    );
    Ok(index)
}
