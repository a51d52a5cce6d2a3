//! The persistable-record capability
//!
//! `Entity` is the seam between the record types and the storage layers:
//! a kind tag for the envelope, metadata access for stamping, validation
//! and peer-constraint hooks for the commit path, and artifact hooks for
//! types that materialize derived files (attachments). Dispatch is static;
//! each collection is monomorphized over its record type.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{RecordKind, RecordMeta};
use crate::constraint::{UniquenessError, ValidationError};

/// A record type the store can persist.
pub trait Entity:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Kind tag written into every storage unit of this type.
    const KIND: RecordKind;

    /// Whether this type has peer constraints. Types that leave this
    /// `false` skip the peer scan on every save.
    const CHECKS_PEERS: bool = false;

    /// Shared metadata (id + timestamps).
    fn meta(&self) -> &RecordMeta;

    /// Mutable metadata access for the stamping done at save time.
    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Normalizes derived fields before validation. An attachment refreshes
    /// its content checksum here; most types have nothing to do.
    fn prepare(&mut self) {}

    /// Required-field validation. Collects every offending field.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Per-type constraints against already-persisted peers. Runs inside
    /// the owning collection's write section, so the check and the
    /// subsequent write are one critical section.
    fn check_peers(&self, peers: &[Self]) -> Result<(), UniquenessError> {
        let _ = peers;
        Ok(())
    }

    /// Raw comma-separated tag field, for types the tag index covers.
    fn tag_source(&self) -> Option<&str> {
        None
    }

    /// Location of the derived on-disk artifact, if this type has one.
    /// Used to detect when an update moves the artifact.
    fn artifact_path(&self) -> Option<PathBuf> {
        None
    }

    /// Materializes derived artifacts. Called before the unit write; if the
    /// unit write then fails, `discard_artifacts` undoes this.
    fn materialize(&self) -> io::Result<()> {
        Ok(())
    }

    /// Removes derived artifacts. Missing artifacts are not an error.
    fn discard_artifacts(&self) -> io::Result<()> {
        Ok(())
    }
}

/// A set of field changes applicable to a record.
///
/// Typed patch structs (`PostChanges`, …) implement this for
/// `update_attributes`-style partial updates. For ad-hoc edits,
/// `Collection::update_with` takes a closure instead.
pub trait Changes<T: Entity> {
    /// Applies the changes to the record.
    fn apply(self, record: &mut T);
}
