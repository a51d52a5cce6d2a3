//! The store handle
//!
//! A `Stone` is one environment's store: an explicit handle constructed
//! from a config, holding the three per-type collections. Multiple
//! isolated instances (test and production roots, parallel test stores)
//! coexist freely; nothing here is process-global.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::collection::Collection;
use super::errors::{StoneError, StoneResult};
use crate::alloc::RecordId;
use crate::config::StoneConfig;
use crate::model::{Attachment, Page, Post};
use crate::observability::Logger;

/// One record store rooted at a directory.
pub struct Stone {
    config: StoneConfig,
    posts: Collection<Post>,
    pages: Collection<Page>,
    attachments: Collection<Attachment>,
}

impl Stone {
    /// Opens the store: creates the root and per-type directories, derives
    /// each allocator from the units already on disk, and rebuilds the tag
    /// indexes.
    pub fn open(config: StoneConfig) -> StoneResult<Self> {
        fs::create_dir_all(&config.root).map_err(|e| {
            StoneError::write_failure(
                format!("creating store root {}", config.root.display()),
                e,
            )
        })?;

        let posts = Collection::open(&config.root, config.corruption)?;
        let pages = Collection::open(&config.root, config.corruption)?;
        let attachments = Collection::open(&config.root, config.corruption)?;

        let root_str = config.root.display().to_string();
        Logger::info("store_opened", &[("root", &root_str)]);

        Ok(Self {
            config,
            posts,
            pages,
            attachments,
        })
    }

    /// Opens a store with default policies rooted at `root`.
    pub fn open_at(root: impl Into<PathBuf>) -> StoneResult<Self> {
        Self::open(StoneConfig::new(root))
    }

    /// The environment root this store lives under.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// The config the store was opened with.
    pub fn config(&self) -> &StoneConfig {
        &self.config
    }

    /// The post collection.
    pub fn posts(&self) -> &Collection<Post> {
        &self.posts
    }

    /// The page collection.
    pub fn pages(&self) -> &Collection<Page> {
        &self.pages
    }

    /// The attachment collection.
    pub fn attachments(&self) -> &Collection<Attachment> {
        &self.attachments
    }

    /// Posts carrying the tag token, ascending by id.
    pub fn posts_with_tag(&self, token: &str) -> StoneResult<Vec<Post>> {
        self.posts.with_tag(token)
    }

    /// Pages carrying the tag token, ascending by id.
    pub fn pages_with_tag(&self, token: &str) -> StoneResult<Vec<Page>> {
        self.pages.with_tag(token)
    }

    /// Every tag token known to the store with its total record count,
    /// posts and pages combined. The tag listing page reads this.
    pub fn tags(&self) -> StoneResult<Vec<(String, usize)>> {
        let mut merged: BTreeMap<String, usize> = BTreeMap::new();
        for (token, count) in self.posts.tags()? {
            *merged.entry(token).or_default() += count;
        }
        for (token, count) in self.pages.tags()? {
            *merged.entry(token).or_default() += count;
        }
        Ok(merged.into_iter().collect())
    }

    /// The newest `n` posts, newest first. Feed generation reads this;
    /// id order is creation order, so no timestamp sort is needed.
    pub fn recent_posts(&self, n: usize) -> StoneResult<Vec<Post>> {
        let mut all = self.posts.all()?;
        all.reverse();
        all.truncate(n);
        Ok(all)
    }

    /// All attachments referencing the post, ascending by id. An
    /// attachment with an unset or dangling `post_id` never appears.
    pub fn attachments_of(&self, post_id: RecordId) -> StoneResult<Vec<Attachment>> {
        Ok(self
            .attachments
            .all()?
            .into_iter()
            .filter(|attachment| attachment.post_id == Some(post_id))
            .collect())
    }
}
