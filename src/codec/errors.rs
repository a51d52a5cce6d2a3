//! Codec error types

use thiserror::Error;

use crate::model::RecordKind;

/// Why a storage unit failed to decode.
///
/// Any of these means the unit is corrupt or foreign-format; the table
/// layer wraps them with the offending unit's path.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    #[error("unit too short: {len} bytes")]
    Truncated { len: usize },

    #[error("unit length mismatch: header declares {declared} bytes, unit has {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("checksum mismatch: computed {computed:08x}, stored {stored:08x}")]
    ChecksumMismatch { computed: u32, stored: u32 },

    #[error("kind tag mismatch: expected {expected}, found {found:#04x}")]
    KindMismatch { expected: RecordKind, found: u8 },

    #[error("payload is not a valid record: {0}")]
    Payload(String),
}
