//! Constraint rules
//!
//! Validation is deterministic and collects every failure in a single
//! pass. Rules take the record and its persisted peers as plain values;
//! the owning collection is responsible for calling them inside its write
//! section so check-then-write is atomic.

use super::{UniquenessError, ValidationError};
use crate::model::{Attachment, RecordKind};

/// Checks a list of `(field, present)` pairs and reports every field whose
/// presence check failed.
pub fn check_required(
    kind: RecordKind,
    checks: &[(&'static str, bool)],
) -> Result<(), ValidationError> {
    let fields: Vec<&'static str> = checks
        .iter()
        .filter(|(_, present)| !present)
        .map(|(field, _)| *field)
        .collect();

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { kind, fields })
    }
}

/// Rejects the candidate if any other attachment already uses the same
/// `(name, path)` pair. A persisted candidate (an update) never conflicts
/// with itself.
pub fn attachment_name_free(
    candidate: &Attachment,
    peers: &[Attachment],
) -> Result<(), UniquenessError> {
    for peer in peers {
        if candidate.meta.id.is_some() && peer.meta.id == candidate.meta.id {
            continue;
        }
        if peer.name == candidate.name && peer.path == candidate.path {
            return Err(UniquenessError {
                name: candidate.name.clone(),
                path: candidate.path.clone(),
            });
        }
    }
    Ok(())
}
