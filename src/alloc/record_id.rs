//! Numeric record identity
//!
//! Ids order numerically, never textually. Sorting the textual form is the
//! classic defect this type exists to rule out: "100" sorts between "1" and
//! "2" as a string, after "99" as a number.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A positive, per-type-unique record identifier.
///
/// Assigned once by the allocator at first save, immutable thereafter, and
/// never reused after deletion. Ordering is the numeric ordering of the
/// underlying value.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Creates a RecordId with the given value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = ParseIntError;

    /// Parses the numeric value. Used on storage unit file stems, so the id
    /// ordering a directory listing produces is always numeric.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}
