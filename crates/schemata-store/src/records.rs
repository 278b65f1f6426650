//! Persisted record shapes.

use schemata_model::{CompatibilityLevel, Fingerprint, Mode, SchemaFormat, SchemaReference};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An immutable schema row, keyed by registry-wide id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSchema {
    pub id: i32,
    pub format: SchemaFormat,
    /// Schema text exactly as the caller registered it.
    pub schema_text: String,
    /// Canonical text the fingerprint is computed over.
    pub canonical_text: String,
    pub fingerprint: Fingerprint,
    pub references: Vec<SchemaReference>,
}

/// One version binding under a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionBinding {
    pub version: u32,
    pub schema_id: i32,
    pub deleted: bool,
}

/// Compatibility configuration at some scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub compatibility: CompatibilityLevel,
    pub normalize: Option<bool>,
}

/// Everything the store keeps per subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectState {
    pub versions: BTreeMap<u32, VersionBinding>,
    pub config: Option<ConfigEntry>,
    pub mode: Option<Mode>,
}

impl SubjectState {
    /// Highest live version, if any.
    pub fn latest_live(&self) -> Option<VersionBinding> {
        self.versions
            .values()
            .rev()
            .find(|binding| !binding.deleted)
            .copied()
    }

    pub fn has_live_versions(&self) -> bool {
        self.versions.values().any(|binding| !binding.deleted)
    }
}

/// A schema payload ready to be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSchema {
    pub format: SchemaFormat,
    pub schema_text: String,
    pub canonical_text: String,
    pub fingerprint: Fingerprint,
    pub references: Vec<SchemaReference>,
    /// Caller-supplied id (import only).
    pub id: Option<i32>,
    /// Caller-supplied version (import only).
    pub version: Option<u32>,
}
