//! Blog posts

use serde::{Deserialize, Serialize};

use super::{Changes, Entity, RecordKind, RecordMeta};
use crate::constraint::{rules, ValidationError};

/// A blog post: titled wiki-markup body plus a free-text tag field.
///
/// `tags` is stored raw; the tag index normalizes it into tokens (split on
/// commas, trimmed, lowercased) without touching the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: String,
}

impl Post {
    /// A new, unsaved post. The id and timestamps are assigned at save.
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

impl Entity for Post {
    const KIND: RecordKind = RecordKind::Post;

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

/// Field changes for [`Post::update`]-style partial updates.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tags: Option<String>,
}

impl PostChanges {
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

impl Changes<Post> for PostChanges {
    fn apply(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(body) = self.body {
            post.body = body;
        }
        if let Some(tags) = self.tags {
            post.tags = tags;
        }
    }
}
