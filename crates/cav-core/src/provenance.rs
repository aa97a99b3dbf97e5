//! Provenance and schema descriptors attached to pipeline artefacts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Version of the JSON layout written to report artefacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Bumped when a field is removed or changes meaning.
    pub major: u32,
    /// Bumped when a field is added.
    pub minor: u32,
    /// Bumped for fixes that keep the layout.
    pub patch: u32,
}

impl SchemaVersion {
    /// Builds a version triple.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

/// Provenance recorded on every report.
///
/// No wall-clock timestamp is stored so that identical inputs produce
/// byte-identical artefacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Schema of the enclosing payload.
    pub schema_version: SchemaVersion,
    /// Package version of the producing crate.
    pub tool_version: String,
    /// Hash of the options used to produce the payload.
    pub options_hash: String,
    /// Hashes of the input payloads keyed by role (`spectrum`, `lines`, ...).
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
}

impl RunProvenance {
    /// Creates provenance for the given tool version and options hash.
    pub fn new(tool_version: impl Into<String>, options_hash: impl Into<String>) -> Self {
        Self {
            schema_version: SchemaVersion::default(),
            tool_version: tool_version.into(),
            options_hash: options_hash.into(),
            inputs: BTreeMap::new(),
        }
    }

    /// Records the hash of an input payload.
    pub fn with_input(mut self, role: impl Into<String>, hash: impl Into<String>) -> Self {
        self.inputs.insert(role.into(), hash.into());
        self
    }
}
