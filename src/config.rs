//! Store configuration
//!
//! A `StoneConfig` names the environment root the store lives under and the
//! policy applied when a listing encounters a corrupt storage unit. Every
//! store handle is constructed from an explicit config; there is no ambient
//! global store.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What a listing does when one storage unit fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionPolicy {
    /// Skip the unit, log a WARN event naming it, keep listing.
    #[default]
    SkipAndReport,
    /// Abort the listing with a `CorruptRecord` error.
    FailFast,
}

/// Configuration for one store instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoneConfig {
    /// Root directory for this environment (e.g. `db/test`, `db/production`).
    pub root: PathBuf,

    /// Corrupt-unit handling during listings (default: skip and report).
    #[serde(default)]
    pub corruption: CorruptionPolicy,
}

impl StoneConfig {
    /// Config rooted at the given directory, with default policies.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            corruption: CorruptionPolicy::default(),
        }
    }

    /// Switch listings to abort on the first corrupt unit.
    pub fn fail_fast(mut self) -> Self {
        self.corruption = CorruptionPolicy::FailFast;
        self
    }

    /// The environment root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
