//! Derived indexes
//!
//! In-memory indexes rebuilt from a full scan when a store opens and
//! maintained incrementally on every write. The tag index must always
//! equal what a fresh full-scan recomputation would produce; the update
//! path diffs old and new tag sets so removed tokens are pruned and added
//! tokens appear.
//!
//! The post → attachment relation is not held in memory at all: it is
//! recomputed per query from the attachment table's numerically ordered
//! listing, which is cheap at blog scale and cannot drift.

mod tags;

pub use tags::{normalize_tags, TagIndex};
