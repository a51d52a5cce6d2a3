//! Identifier allocation
//!
//! Every record type has its own allocator handing out strictly increasing
//! numeric ids. The allocator is initialized from the highest id found in
//! durable storage at open, never from a record count: counts shrink when
//! records are deleted, the high-water mark must not.

mod allocator;
mod record_id;

pub use allocator::IdAllocator;
pub use record_id::RecordId;
