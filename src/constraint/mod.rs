//! Constraint checking
//!
//! Everything here runs before a write commits: required-field validation
//! for all record types and name-uniqueness for attachments. Checks never
//! mutate the record, and a failed check means nothing was written.

pub mod rules;

mod errors;

pub use errors::{UniquenessError, ValidationError};
