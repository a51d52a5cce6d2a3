//! Record type tags

use std::fmt;

use serde::{Deserialize, Serialize};

/// The record types the store knows how to persist.
///
/// Posts and pages share a shape; the kind tag is what keeps their id
/// spaces, storage directories, and indexes apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Post,
    Page,
    Attachment,
}

impl RecordKind {
    /// Singular name, used in errors and log events.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Post => "post",
            RecordKind::Page => "page",
            RecordKind::Attachment => "attachment",
        }
    }

    /// Directory name under the store root holding this type's units.
    pub fn dir_name(&self) -> &'static str {
        match self {
            RecordKind::Post => "posts",
            RecordKind::Page => "pages",
            RecordKind::Attachment => "attachments",
        }
    }

    /// Tag byte written into every storage unit envelope.
    pub fn tag(&self) -> u8 {
        match self {
            RecordKind::Post => 1,
            RecordKind::Page => 2,
            RecordKind::Attachment => 3,
        }
    }

    /// Reverse of [`tag`](Self::tag).
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(RecordKind::Post),
            2 => Some(RecordKind::Page),
            3 => Some(RecordKind::Attachment),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
