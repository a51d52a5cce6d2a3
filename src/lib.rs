//! stone - a file-backed record store for personal blogs and wikis
//!
//! Stone persists typed records (posts, pages, attachments) as one storage
//! unit file per record, assigns monotonically increasing numeric ids per
//! type, tracks creation/modification timestamps, enforces per-type
//! constraints before anything touches disk, and derives a tag index from
//! free-text tag fields.

pub mod alloc;
pub mod codec;
pub mod config;
pub mod constraint;
pub mod index;
pub mod model;
pub mod observability;
pub mod store;
pub mod table;

pub use config::{CorruptionPolicy, StoneConfig};
pub use model::{
    Attachment, AttachmentChanges, Page, PageChanges, Post, PostChanges, RecordId, RecordKind,
};
pub use store::{Stone, StoneError, StoneResult};
