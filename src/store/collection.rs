//! Per-type record collection
//!
//! A `Collection<T>` is the commit path for one record type: constraint
//! check, id allocation, artifact materialization, unit write, and index
//! maintenance happen inside a single per-type write section, so a check
//! and the write it guards cannot be interleaved by another writer of the
//! same type. Operations on different types never share a lock.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, RwLock};

use super::errors::{StoneError, StoneResult};
use crate::alloc::RecordId;
use crate::config::CorruptionPolicy;
use crate::index::TagIndex;
use crate::model::{Changes, Entity};
use crate::observability::Logger;
use crate::table::Table;

/// All records of one type, plus that type's derived tag index.
pub struct Collection<T: Entity> {
    table: Table<T>,
    tag_index: RwLock<TagIndex>,
    write_gate: Mutex<()>,
}

impl<T: Entity> Collection<T> {
    /// Opens the collection under `root` and rebuilds its tag index from a
    /// full scan.
    pub(crate) fn open(root: &Path, policy: CorruptionPolicy) -> StoneResult<Self> {
        let table = Table::open(root, policy)?;
        let collection = Self {
            table,
            tag_index: RwLock::new(TagIndex::new()),
            write_gate: Mutex::new(()),
        };
        collection.rebuild_tag_index()?;
        Ok(collection)
    }

    /// All records, ascending by numeric id.
    pub fn all(&self) -> StoneResult<Vec<T>> {
        Ok(self.table.list()?)
    }

    /// One record by id.
    pub fn get(&self, id: RecordId) -> StoneResult<T> {
        Ok(self.table.get(id)?)
    }

    /// Persists the record: an insert when it has no id yet, an update
    /// otherwise.
    ///
    /// On failure the in-memory record keeps whatever values the caller
    /// set, is not marked persisted, and durable state is unchanged.
    pub fn save(&self, record: &mut T) -> StoneResult<()> {
        let _gate = self.lock_gate()?;
        match record.meta().id {
            None => self.insert_locked(record),
            Some(id) => {
                let old = self.table.get(id)?;
                self.update_locked(&old, record)
            }
        }
    }

    /// Loads the record, applies the typed changes, and persists the
    /// result. Returns the updated record.
    pub fn update<C: Changes<T>>(&self, id: RecordId, changes: C) -> StoneResult<T> {
        self.update_applying(id, |record| changes.apply(record))
    }

    /// Like [`update`](Self::update), but with an ad-hoc closure instead of
    /// a typed changes struct.
    pub fn update_with(&self, id: RecordId, f: impl FnOnce(&mut T)) -> StoneResult<T> {
        self.update_applying(id, f)
    }

    fn update_applying(&self, id: RecordId, apply: impl FnOnce(&mut T)) -> StoneResult<T> {
        let _gate = self.lock_gate()?;
        let old = self.table.get(id)?;
        let mut record = old.clone();
        apply(&mut record);
        self.update_locked(&old, &mut record)?;
        Ok(record)
    }

    /// Removes the record's unit and artifacts and prunes the index. The
    /// id is never reused.
    pub fn delete(&self, id: RecordId) -> StoneResult<()> {
        let _gate = self.lock_gate()?;

        match self.table.get(id) {
            Ok(record) => {
                self.table.delete(id)?;
                if let Err(e) = record.discard_artifacts() {
                    let error_str = e.to_string();
                    Logger::warn(
                        "artifact_cleanup_failed",
                        &[("kind", T::KIND.as_str()), ("error", &error_str)],
                    );
                }
                if let (Some(id), Some(tags)) = (record.meta().id, record.tag_source()) {
                    self.lock_index_write()?.apply_delete(id, tags);
                }
                Ok(())
            }
            // A corrupt unit can still be deleted; it was never indexed and
            // its artifacts are unknowable.
            Err(crate::table::TableError::CorruptUnit { unit, .. }) => {
                let unit_str = unit.display().to_string();
                Logger::warn(
                    "corrupt_unit_deleted",
                    &[("kind", T::KIND.as_str()), ("unit", &unit_str)],
                );
                Ok(self.table.delete(id)?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Ids of records carrying the (normalized) tag token, ascending.
    pub fn ids_with_tag(&self, token: &str) -> StoneResult<Vec<RecordId>> {
        Ok(self.lock_index_read()?.ids_for(token))
    }

    /// Records carrying the tag token, ascending by id.
    pub fn with_tag(&self, token: &str) -> StoneResult<Vec<T>> {
        let ids = self.ids_with_tag(token)?;
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.table.get(id) {
                Ok(record) => records.push(record),
                // Deleted between the index read and ours; a legal snapshot.
                Err(crate::table::TableError::NotFound { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(records)
    }

    /// Every known tag token with its record count, sorted by token.
    pub fn tags(&self) -> StoneResult<Vec<(String, usize)>> {
        Ok(self.lock_index_read()?.tokens())
    }

    fn insert_locked(&self, record: &mut T) -> StoneResult<()> {
        record.prepare();
        record.validate()?;
        self.check_peers(record)?;

        record
            .materialize()
            .map_err(|e| StoneError::write_failure("materializing record artifacts", e))?;

        if let Err(e) = self.table.insert(record) {
            let _ = record.discard_artifacts();
            return Err(e.into());
        }

        if let (Some(id), Some(tags)) = (record.meta().id, record.tag_source()) {
            self.lock_index_write()?.apply_insert(id, tags);
        }
        Ok(())
    }

    fn update_locked(&self, old: &T, record: &mut T) -> StoneResult<()> {
        record.prepare();
        record.validate()?;
        self.check_peers(record)?;

        record
            .materialize()
            .map_err(|e| StoneError::write_failure("materializing record artifacts", e))?;

        let artifact_moved = old.artifact_path() != record.artifact_path();

        if let Err(e) = self.table.rewrite(record) {
            // The unit write failed, so the old record is still the truth.
            // Put its artifact back (same location: re-materialize the old
            // content; new location: drop the new file).
            if artifact_moved {
                let _ = record.discard_artifacts();
            } else {
                let _ = old.materialize();
            }
            return Err(e.into());
        }

        if artifact_moved {
            if let Err(e) = old.discard_artifacts() {
                let error_str = e.to_string();
                Logger::warn(
                    "artifact_cleanup_failed",
                    &[("kind", T::KIND.as_str()), ("error", &error_str)],
                );
            }
        }

        if let Some(id) = record.meta().id {
            if let (Some(old_tags), Some(new_tags)) = (old.tag_source(), record.tag_source()) {
                self.lock_index_write()?.apply_update(id, old_tags, new_tags);
            }
        }
        Ok(())
    }

    /// Loads peers and runs the record's per-type constraints. Skipped
    /// entirely for types without peer constraints, so post and page saves
    /// never pay for a full table scan.
    fn check_peers(&self, record: &T) -> StoneResult<()> {
        if !T::CHECKS_PEERS {
            return Ok(());
        }
        let peers = self.table.list()?;
        Ok(record.check_peers(&peers)?)
    }

    fn rebuild_tag_index(&self) -> StoneResult<()> {
        let records = self.table.list()?;
        let mut index = self.lock_index_write()?;
        index.rebuild(records.iter().filter_map(|record| {
            match (record.meta().id, record.tag_source()) {
                (Some(id), Some(tags)) => Some((id, tags)),
                _ => None,
            }
        }));
        Ok(())
    }

    fn lock_gate(&self) -> StoneResult<MutexGuard<'_, ()>> {
        self.write_gate
            .lock()
            .map_err(|_| StoneError::lock_poisoned("write gate"))
    }

    fn lock_index_read(
        &self,
    ) -> StoneResult<std::sync::RwLockReadGuard<'_, TagIndex>> {
        self.tag_index
            .read()
            .map_err(|_| StoneError::lock_poisoned("tag index"))
    }

    fn lock_index_write(
        &self,
    ) -> StoneResult<std::sync::RwLockWriteGuard<'_, TagIndex>> {
        self.tag_index
            .write()
            .map_err(|_| StoneError::lock_poisoned("tag index"))
    }
}
