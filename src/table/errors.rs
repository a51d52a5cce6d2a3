//! Table error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::alloc::RecordId;
use crate::codec::CodecError;
use crate::model::RecordKind;

/// Errors from storage-unit operations on one table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("no {kind} with id {id}")]
    NotFound { kind: RecordKind, id: RecordId },

    #[error("write failed: {context}")]
    WriteFailed {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("corrupt storage unit {}", .unit.display())]
    CorruptUnit {
        unit: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("failed to read storage unit {}", .unit.display())]
    ReadFailed {
        unit: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to scan table directory {}", .dir.display())]
    ScanFailed {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("record has not been persisted yet")]
    Unpersisted,
}

impl TableError {
    /// A write failure with context.
    pub fn write_failed(context: impl Into<String>, source: io::Error) -> Self {
        Self::WriteFailed {
            context: context.into(),
            source,
        }
    }

    /// A poisoned lock surfaces as a write failure: some writer panicked
    /// mid-operation and the table cannot vouch for its in-memory state.
    pub fn lock_poisoned(what: &str) -> Self {
        Self::WriteFailed {
            context: format!("{what} lock poisoned"),
            source: io::Error::new(io::ErrorKind::Other, "a writer panicked"),
        }
    }
}
