//! Storage-unit table for one record type

use std::fs::{self, File};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;

use super::errors::TableError;
use crate::alloc::{IdAllocator, RecordId};
use crate::codec;
use crate::config::CorruptionPolicy;
use crate::model::Entity;
use crate::observability::Logger;

/// File extension of storage units. Temp siblings get `.tmp` appended, so
/// directory scans never pick up an in-flight write.
const UNIT_EXT: &str = "stone";

/// All storage units for one record type.
///
/// The table owns the type's id allocator, initialized at open from the
/// maximum id among existing units (never from a count: counts shrink on
/// delete, the high-water mark must not). Unit writes go through a temp
/// sibling plus rename, and every unit write is fsynced before the table
/// acknowledges it.
pub struct Table<T: Entity> {
    dir: PathBuf,
    policy: CorruptionPolicy,
    allocator: Mutex<IdAllocator>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> Table<T> {
    /// Opens (creating if needed) the table directory under `root` and
    /// derives the allocator state from the units already present.
    pub fn open(root: &Path, policy: CorruptionPolicy) -> Result<Self, TableError> {
        let dir = root.join(T::KIND.dir_name());
        fs::create_dir_all(&dir).map_err(|e| {
            TableError::write_failed(
                format!("creating table directory {}", dir.display()),
                e,
            )
        })?;

        let table = Self {
            dir,
            policy,
            allocator: Mutex::new(IdAllocator::new()),
            _marker: PhantomData,
        };

        let ids = table.scan_ids()?;
        {
            let mut allocator = table
                .allocator
                .lock()
                .map_err(|_| TableError::lock_poisoned("id allocator"))?;
            for id in &ids {
                allocator.observe(*id);
            }
        }

        Ok(table)
    }

    /// The directory this table's units live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Issues the next id for this type.
    ///
    /// Only meaningful inside the owning collection's write section; the
    /// internal lock just keeps the counter itself coherent.
    pub fn allocate_id(&self) -> Result<RecordId, TableError> {
        let mut allocator = self
            .allocator
            .lock()
            .map_err(|_| TableError::lock_poisoned("id allocator"))?;
        Ok(allocator.allocate())
    }

    /// All unit ids currently on disk, sorted numerically.
    ///
    /// Ids come from parsing file stems as integers; files that are not
    /// `<number>.stone` (temp siblings, stray droppings) are ignored.
    pub fn scan_ids(&self) -> Result<Vec<RecordId>, TableError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| TableError::ScanFailed {
            dir: self.dir.clone(),
            source: e,
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TableError::ScanFailed {
                dir: self.dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(UNIT_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(id) = stem.parse::<RecordId>() {
                ids.push(id);
            }
        }

        ids.sort_unstable();
        Ok(ids)
    }

    /// Reads and decodes every unit, in ascending numeric id order.
    ///
    /// A unit that fails to decode is handled per the table's corruption
    /// policy: skipped with a WARN event naming it, or a hard error. A unit
    /// deleted between the scan and the read is silently absent, which is a
    /// legal snapshot.
    pub fn list(&self) -> Result<Vec<T>, TableError> {
        let ids = self.scan_ids()?;
        let mut records = Vec::with_capacity(ids.len());

        for id in ids {
            match self.get(id) {
                Ok(record) => records.push(record),
                Err(TableError::NotFound { .. }) => continue,
                Err(TableError::CorruptUnit { unit, source }) => match self.policy {
                    CorruptionPolicy::FailFast => {
                        return Err(TableError::CorruptUnit { unit, source })
                    }
                    CorruptionPolicy::SkipAndReport => {
                        let unit_str = unit.display().to_string();
                        let error_str = source.to_string();
                        Logger::warn(
                            "corrupt_unit_skipped",
                            &[
                                ("kind", T::KIND.as_str()),
                                ("unit", &unit_str),
                                ("error", &error_str),
                            ],
                        );
                    }
                },
                Err(other) => return Err(other),
            }
        }

        Ok(records)
    }

    /// Reads and decodes one unit.
    pub fn get(&self, id: RecordId) -> Result<T, TableError> {
        let unit = self.unit_path(id);
        let bytes = fs::read(&unit).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TableError::NotFound { kind: T::KIND, id }
            } else {
                TableError::ReadFailed {
                    unit: unit.clone(),
                    source: e,
                }
            }
        })?;

        codec::decode(&bytes).map_err(|source| TableError::CorruptUnit { unit, source })
    }

    /// Allocates an id, stamps both timestamps, and writes the unit.
    ///
    /// On failure the record's metadata is restored to its unsaved state
    /// and no unit remains on disk; the allocated id stays retired.
    pub fn insert(&self, record: &mut T) -> Result<(), TableError> {
        let id = self.allocate_id()?;

        let prior = record.meta().clone();
        record.meta_mut().stamp_created(id, Utc::now());

        let bytes = codec::encode(record);
        if let Err(e) = self.write_unit(id, &bytes) {
            *record.meta_mut() = prior;
            return Err(e);
        }
        Ok(())
    }

    /// Re-stamps `updated_at` and rewrites the unit in place (atomically,
    /// via the temp sibling). `created_at` and the id are untouched.
    pub fn rewrite(&self, record: &mut T) -> Result<(), TableError> {
        let id = record.meta().id.ok_or(TableError::Unpersisted)?;

        let prior_updated = record.meta().updated_at;
        record.meta_mut().stamp_updated(Utc::now());

        let bytes = codec::encode(record);
        if let Err(e) = self.write_unit(id, &bytes) {
            record.meta_mut().updated_at = prior_updated;
            return Err(e);
        }
        Ok(())
    }

    /// Removes the unit. The id is never reused.
    pub fn delete(&self, id: RecordId) -> Result<(), TableError> {
        let unit = self.unit_path(id);
        fs::remove_file(&unit).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TableError::NotFound { kind: T::KIND, id }
            } else {
                TableError::write_failed(format!("removing unit {}", unit.display()), e)
            }
        })
    }

    fn unit_path(&self, id: RecordId) -> PathBuf {
        self.dir.join(format!("{id}.{UNIT_EXT}"))
    }

    /// Writes unit bytes to a temp sibling, fsyncs, then renames over the
    /// final name. A crash at any point leaves either the old unit, the new
    /// unit, or an ignorable `.tmp` dropping, never a torn unit.
    fn write_unit(&self, id: RecordId, bytes: &[u8]) -> Result<(), TableError> {
        let unit = self.unit_path(id);
        let tmp = self.dir.join(format!("{id}.{UNIT_EXT}.tmp"));

        let result = (|| {
            let mut file = File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &unit)
        })();

        result.map_err(|e| {
            let _ = fs::remove_file(&tmp);
            TableError::write_failed(format!("writing unit {}", unit.display()), e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Post;
    use tempfile::TempDir;

    fn open_table(dir: &TempDir) -> Table<Post> {
        Table::open(dir.path(), CorruptionPolicy::SkipAndReport).unwrap()
    }

    fn insert_post(table: &Table<Post>, n: usize) -> Post {
        let mut post = Post::new(format!("Post {n}"), format!("Body {n}"), format!("tag{n}"));
        table.insert(&mut post).unwrap();
        post
    }

    #[test]
    fn test_open_creates_type_directory() {
        let dir = TempDir::new().unwrap();
        let table = open_table(&dir);
        assert!(table.dir().is_dir());
        assert!(table.dir().ends_with("posts"));
    }

    #[test]
    fn test_insert_stamps_id_and_timestamps() {
        let dir = TempDir::new().unwrap();
        let table = open_table(&dir);

        let post = insert_post(&table, 1);
        assert_eq!(post.meta.id, Some(RecordId::new(1)));
        assert!(post.meta.created_at.is_some());
        assert_eq!(post.meta.created_at, post.meta.updated_at);
    }

    #[test]
    fn test_get_roundtrips_inserted_record() {
        let dir = TempDir::new().unwrap();
        let table = open_table(&dir);

        let post = insert_post(&table, 1);
        let loaded = table.get(RecordId::new(1)).unwrap();
        assert_eq!(loaded, post);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let table = open_table(&dir);
        let result = table.get(RecordId::new(7));
        assert!(matches!(result, Err(TableError::NotFound { .. })));
    }

    #[test]
    fn test_list_orders_numerically_past_two_digits() {
        let dir = TempDir::new().unwrap();
        let table = open_table(&dir);

        for n in 1..=120 {
            insert_post(&table, n);
        }

        let records = table.list().unwrap();
        assert_eq!(records.len(), 120);
        let ids: Vec<u64> = records
            .iter()
            .map(|r| r.meta.id.unwrap().value())
            .collect();
        let expected: Vec<u64> = (1..=120).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_reopen_resumes_allocation_above_max() {
        let dir = TempDir::new().unwrap();
        {
            let table = open_table(&dir);
            for n in 1..=3 {
                insert_post(&table, n);
            }
            table.delete(RecordId::new(3)).unwrap();
        }

        // The reopened allocator derives from the max id still on disk (2).
        let table = open_table(&dir);
        let post = insert_post(&table, 4);
        assert_eq!(post.meta.id, Some(RecordId::new(3)));
    }

    #[test]
    fn test_delete_does_not_shift_ids() {
        let dir = TempDir::new().unwrap();
        let table = open_table(&dir);

        for n in 1..=3 {
            insert_post(&table, n);
        }
        table.delete(RecordId::new(2)).unwrap();

        let ids: Vec<u64> = table
            .list()
            .unwrap()
            .iter()
            .map(|r| r.meta.id.unwrap().value())
            .collect();
        assert_eq!(ids, vec![1, 3]);

        // Within the same store lifetime the deleted id is not reused.
        let post = insert_post(&table, 4);
        assert_eq!(post.meta.id, Some(RecordId::new(4)));
    }

    #[test]
    fn test_rewrite_preserves_created_at() {
        let dir = TempDir::new().unwrap();
        let table = open_table(&dir);

        let mut post = insert_post(&table, 1);
        let created = post.meta.created_at;

        post.tags = "foo, bar, baz".into();
        table.rewrite(&mut post).unwrap();

        let loaded = table.get(RecordId::new(1)).unwrap();
        assert_eq!(loaded.meta.created_at, created);
        assert_eq!(loaded.tags, "foo, bar, baz");
    }

    #[test]
    fn test_rewrite_unsaved_record_is_an_error() {
        let dir = TempDir::new().unwrap();
        let table = open_table(&dir);
        let mut post = Post::new("T", "B", "");
        assert!(matches!(
            table.rewrite(&mut post),
            Err(TableError::Unpersisted)
        ));
    }

    #[test]
    fn test_corrupt_unit_skipped_by_default() {
        let dir = TempDir::new().unwrap();
        let table = open_table(&dir);

        for n in 1..=3 {
            insert_post(&table, n);
        }

        // Flip a byte in unit 2.
        let unit = table.dir().join("2.stone");
        let mut bytes = fs::read(&unit).unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;
        fs::write(&unit, bytes).unwrap();

        let ids: Vec<u64> = table
            .list()
            .unwrap()
            .iter()
            .map(|r| r.meta.id.unwrap().value())
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_corrupt_unit_fails_fast_when_configured() {
        let dir = TempDir::new().unwrap();
        let table: Table<Post> = Table::open(dir.path(), CorruptionPolicy::FailFast).unwrap();

        let mut post = Post::new("T", "B", "");
        table.insert(&mut post).unwrap();

        let unit = table.dir().join("1.stone");
        let mut bytes = fs::read(&unit).unwrap();
        bytes[6] ^= 0xFF;
        fs::write(&unit, bytes).unwrap();

        assert!(matches!(
            table.list(),
            Err(TableError::CorruptUnit { .. })
        ));
    }

    #[test]
    fn test_temp_droppings_are_ignored_by_scans() {
        let dir = TempDir::new().unwrap();
        let table = open_table(&dir);
        insert_post(&table, 1);

        // Simulate a crashed write.
        fs::write(table.dir().join("9.stone.tmp"), b"half a unit").unwrap();

        let ids = table.scan_ids().unwrap();
        assert_eq!(ids, vec![RecordId::new(1)]);
    }
}
