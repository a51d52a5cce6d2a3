//! Wiki pages
//!
//! Pages share the post shape but live in their own id space, directory,
//! and tag index; the kind tag keeps the two apart on disk.

use serde::{Deserialize, Serialize};

use super::{Changes, Entity, RecordKind, RecordMeta};
use crate::constraint::{rules, ValidationError};

/// A wiki page: titled wiki-markup body plus a free-text tag field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: String,
}

impl Page {
    /// A new, unsaved page.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        tags: impl Into<String>,
    ) -> Self {
        Self {
            meta: RecordMeta::unsaved(),
            title: title.into(),
            body: body.into(),
            tags: tags.into(),
        }
    }
}

impl Entity for Page {
    const KIND: RecordKind = RecordKind::Page;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationError> {
        rules::check_required(
            Self::KIND,
            &[
                ("title", !self.title.trim().is_empty()),
                ("body", !self.body.trim().is_empty()),
            ],
        )
    }

    fn tag_source(&self) -> Option<&str> {
        Some(&self.tags)
    }
}

/// Field changes for partial page updates.
#[derive(Debug, Clone, Default)]
pub struct PageChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tags: Option<String>,
}

impl PageChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }
}

impl Changes<Page> for PageChanges {
    fn apply(self, page: &mut Page) {
        if let Some(title) = self.title {
            page.title = title;
        }
        if let Some(body) = self.body {
            page.body = body;
        }
        if let Some(tags) = self.tags {
            page.tags = tags;
        }
    }
}
