//! Store facade
//!
//! The public surface callers use: an explicit `Stone` handle opened from a
//! config (no ambient global store), per-type `Collection`s composing the
//! allocator, codec, table, constraints, and indexes, and the unified error
//! taxonomy every operation reports through.

mod collection;
mod errors;
mod stone;

pub use collection::Collection;
pub use errors::{StoneError, StoneResult};
pub use stone::Stone;
