//! Tag token index
//!
//! Tags are stored as free text ("Foo, bar , baz") and never normalized in
//! place; the index works on tokens: split on commas, trimmed, lowercased,
//! empties dropped.

use std::collections::{BTreeSet, HashMap};

use crate::alloc::RecordId;

/// Normalizes a raw comma-separated tag field into its token set.
pub fn normalize_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Token → record ids for one tagged collection.
///
/// Ids are only unique per record type, so each collection (posts, pages)
/// carries its own index.
#[derive(Debug, Default)]
pub struct TagIndex {
    entries: HashMap<String, BTreeSet<RecordId>>,
}

impl TagIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds from a full scan of `(id, raw tags)` pairs.
    pub fn rebuild<'a>(&mut self, records: impl IntoIterator<Item = (RecordId, &'a str)>) {
        self.entries.clear();
        for (id, raw) in records {
            self.apply_insert(id, raw);
        }
    }

    /// Indexes a newly inserted record.
    pub fn apply_insert(&mut self, id: RecordId, raw: &str) {
        for token in normalize_tags(raw) {
            self.entries.entry(token).or_default().insert(id);
        }
    }

    /// Re-indexes an updated record by diffing its old and new token sets.
    pub fn apply_update(&mut self, id: RecordId, old_raw: &str, new_raw: &str) {
        let old_tokens = normalize_tags(old_raw);
        let new_tokens = normalize_tags(new_raw);

        for removed in old_tokens.difference(&new_tokens) {
            self.remove_token(removed, id);
        }
        for added in new_tokens.difference(&old_tokens) {
            self.entries.entry(added.clone()).or_default().insert(id);
        }
    }

    /// Drops a deleted record from the index.
    pub fn apply_delete(&mut self, id: RecordId, raw: &str) {
        for token in normalize_tags(raw) {
            self.remove_token(&token, id);
        }
    }

    /// Ids of all records carrying the token, ascending. The query token is
    /// normalized the same way stored tags are.
    pub fn ids_for(&self, token: &str) -> Vec<RecordId> {
        let token = token.trim().to_lowercase();
        self.entries
            .get(&token)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every known token with its record count, sorted by token.
    pub fn tokens(&self) -> Vec<(String, usize)> {
        let mut tokens: Vec<(String, usize)> = self
            .entries
            .iter()
            .map(|(token, ids)| (token.clone(), ids.len()))
            .collect();
        tokens.sort();
        tokens
    }

    fn remove_token(&mut self, token: &str, id: RecordId) {
        if let Some(ids) = self.entries.get_mut(token) {
            ids.remove(&id);
            if ids.is_empty() {
                self.entries.remove(token);
            }
        }
    }
}
