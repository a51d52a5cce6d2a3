//! Store error taxonomy
//!
//! Every facade operation returns `StoneResult`; failures carry their
//! reason, never a bare boolean, so callers can distinguish a validation
//! miss from a uniqueness conflict from a disk problem. The store never
//! silently drops a write.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::alloc::RecordId;
use crate::codec::CodecError;
use crate::constraint::{UniquenessError, ValidationError};
use crate::model::RecordKind;
use crate::table::TableError;

/// Result type for store operations.
pub type StoneResult<T> = Result<T, StoneError>;

/// Everything that can go wrong in the store.
#[derive(Debug, Error)]
pub enum StoneError {
    /// Required fields missing or blank; nothing was written.
    #[error(transparent)]
    ValidationFailed(#[from] ValidationError),

    /// Duplicate attachment `(name, path)`; no record and no file written.
    #[error(transparent)]
    UniquenessViolation(#[from] UniquenessError),

    /// Lookup, update, or delete against a record that does not exist.
    #[error("no {kind} with id {id}")]
    NotFound { kind: RecordKind, id: RecordId },

    /// The storage medium rejected an operation (permissions, capacity,
    /// a poisoned lock). No partial artifact remains.
    #[error("storage operation failed: {context}")]
    WriteFailure {
        context: String,
        #[source]
        source: io::Error,
    },

    /// A storage unit failed to decode; the error names the unit.
    #[error("corrupt storage unit {}", .unit.display())]
    CorruptRecord {
        unit: PathBuf,
        #[source]
        source: CodecError,
    },
}

impl StoneError {
    /// Whether this is a typed miss rather than a real failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn write_failure(context: impl Into<String>, source: io::Error) -> Self {
        Self::WriteFailure {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn lock_poisoned(what: &str) -> Self {
        Self::write_failure(
            format!("{what} lock poisoned"),
            io::Error::new(io::ErrorKind::Other, "a writer panicked"),
        )
    }
}

impl From<TableError> for StoneError {
    fn from(e: TableError) -> Self {
        match e {
            TableError::NotFound { kind, id } => Self::NotFound { kind, id },
            TableError::WriteFailed { context, source } => Self::WriteFailure { context, source },
            TableError::CorruptUnit { unit, source } => Self::CorruptRecord { unit, source },
            TableError::ReadFailed { unit, source } => Self::WriteFailure {
                context: format!("reading unit {}", unit.display()),
                source,
            },
            TableError::ScanFailed { dir, source } => Self::WriteFailure {
                context: format!("scanning table directory {}", dir.display()),
                source,
            },
            TableError::Unpersisted => Self::WriteFailure {
                context: "record has not been persisted yet".into(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "record has no id"),
            },
        }
    }
}
