//! Record codec
//!
//! Every storage unit is a checksummed binary envelope around a serde_json
//! payload of the record itself. The envelope is verified (length, CRC32,
//! kind tag) before the payload is parsed, so corrupt or foreign-format
//! bytes surface as a typed `CodecError` naming what went wrong instead of
//! a half-decoded record.

mod checksum;
mod envelope;
mod errors;

pub use checksum::{compute_checksum, verify_checksum};
pub use envelope::{decode, encode};
pub use errors::CodecError;
