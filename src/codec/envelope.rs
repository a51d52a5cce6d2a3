//! Storage unit envelope
//!
//! Unit format:
//!
//! ```text
//! +------------------+
//! | Unit Length      | (u32 LE, total including this field and checksum)
//! +------------------+
//! | Kind Tag         | (u8, one per record type)
//! +------------------+
//! | Payload Length   | (u32 LE)
//! +------------------+
//! | Record Payload   | (serde_json bytes)
//! +------------------+
//! | Checksum         | (CRC32, u32 LE, covers all bytes before it)
//! +------------------+
//! ```
//!
//! `decode(encode(r)) == r` for every representable record, including empty
//! tag strings, very long bodies, and binary content with interior NULs.

use super::checksum::compute_checksum;
use super::errors::CodecError;
use crate::model::Entity;

/// Length field + kind tag + payload length + checksum, with empty payload.
const MIN_UNIT_SIZE: usize = 4 + 1 + 4 + 4;

/// Serializes a record into a storage unit.
///
/// # Panics
///
/// Panics if the record's payload cannot be serialized. The entity types
/// contain nothing serde_json can reject, so a failure here is a
/// programming error in a record definition, not a runtime condition.
pub fn encode<T: Entity>(record: &T) -> Vec<u8> {
    let payload =
        serde_json::to_vec(record).expect("record payloads are always JSON-serializable");

    let unit_length = MIN_UNIT_SIZE + payload.len();
    let mut unit = Vec::with_capacity(unit_length);

    unit.extend_from_slice(&(unit_length as u32).to_le_bytes());
    unit.push(T::KIND.tag());
    unit.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    unit.extend_from_slice(&payload);

    let checksum = compute_checksum(&unit);
    unit.extend_from_slice(&checksum.to_le_bytes());

    unit
}

/// Deserializes a storage unit back into a record.
///
/// The envelope is fully verified (length, checksum, kind tag) before the
/// payload is parsed.
pub fn decode<T: Entity>(data: &[u8]) -> Result<T, CodecError> {
    if data.len() < MIN_UNIT_SIZE {
        return Err(CodecError::Truncated { len: data.len() });
    }

    let declared = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if declared != data.len() {
        return Err(CodecError::LengthMismatch {
            declared,
            actual: data.len(),
        });
    }

    let checksum_offset = data.len() - 4;
    let stored = u32::from_le_bytes([
        data[checksum_offset],
        data[checksum_offset + 1],
        data[checksum_offset + 2],
        data[checksum_offset + 3],
    ]);
    let computed = compute_checksum(&data[..checksum_offset]);
    if computed != stored {
        return Err(CodecError::ChecksumMismatch { computed, stored });
    }

    let found = data[4];
    if found != T::KIND.tag() {
        return Err(CodecError::KindMismatch {
            expected: T::KIND,
            found,
        });
    }

    let payload_len = u32::from_le_bytes([data[5], data[6], data[7], data[8]]) as usize;
    if MIN_UNIT_SIZE + payload_len != data.len() {
        return Err(CodecError::LengthMismatch {
            declared: MIN_UNIT_SIZE + payload_len,
            actual: data.len(),
        });
    }

    serde_json::from_slice(&data[9..9 + payload_len])
        .map_err(|e| CodecError::Payload(e.to_string()))
}
