//! Constraint error types

use std::path::PathBuf;

use thiserror::Error;

use crate::model::RecordKind;

/// One or more required fields are missing or blank.
///
/// Carries every offending field, not just the first, so a caller can
/// report the whole problem in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed for {kind}: missing {}", .fields.join(", "))]
pub struct ValidationError {
    pub kind: RecordKind,
    pub fields: Vec<&'static str>,
}

/// An attachment name is already taken within its path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("attachment name {name:?} already exists under {}", .path.display())]
pub struct UniquenessError {
    pub name: String,
    pub path: PathBuf,
}
