//! Record metadata
//!
//! Every record carries an id and a pair of timestamps. All three are unset
//! until the first successful save; after that the id and `created_at`
//! never change, while `updated_at` is refreshed on every successful save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alloc::RecordId;

/// Identity and timestamps shared by all record types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    /// Assigned by the allocator at first save; immutable and never reused.
    #[serde(default)]
    pub id: Option<RecordId>,

    /// Set exactly once at first save.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Refreshed on every successful save.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RecordMeta {
    /// Metadata for a record that has never been saved.
    pub fn unsaved() -> Self {
        Self::default()
    }

    /// Whether this record has been persisted at least once.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Stamps identity and both timestamps at first save.
    pub(crate) fn stamp_created(&mut self, id: RecordId, at: DateTime<Utc>) {
        self.id = Some(id);
        self.created_at = Some(at);
        self.updated_at = Some(at);
    }

    /// Refreshes `updated_at`, leaving `created_at` untouched.
    pub(crate) fn stamp_updated(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }
}
