//! Store Lifecycle Invariant Tests
//!
//! Timestamps are set at first save and refreshed on every save; ids are
//! allocated monotonically and survive restart via the max id on disk;
//! corrupt units follow the configured listing policy; separate store
//! instances are fully isolated.

use std::fs;
use std::thread;
use std::time::Duration;

use stone::{Post, PostChanges, RecordId, Stone, StoneConfig, StoneError};
use tempfile::TempDir;

// ============================================================================
// Timestamp contract
// ============================================================================

#[test]
fn test_new_record_gets_both_timestamps() {
    let dir = TempDir::new().unwrap();
    let store = Stone::open_at(dir.path()).unwrap();

    let mut post = Post::new("First post", "Hello world", "foo, bar");
    assert!(post.meta.created_at.is_none());

    store.posts().save(&mut post).unwrap();

    assert!(post.meta.created_at.is_some());
    assert!(post.meta.updated_at.is_some());
    assert_eq!(post.meta.created_at, post.meta.updated_at);
}

#[test]
fn test_save_refreshes_updated_at_only() {
    let dir = TempDir::new().unwrap();
    let store = Stone::open_at(dir.path()).unwrap();

    let mut post = Post::new("First post", "Hello world", "foo, bar");
    store.posts().save(&mut post).unwrap();
    let created = post.meta.created_at;
    let first_updated = post.meta.updated_at;

    thread::sleep(Duration::from_millis(5));
    post.tags = "foo, bar, baz".into();
    store.posts().save(&mut post).unwrap();

    assert_eq!(post.meta.created_at, created);
    assert_ne!(post.meta.updated_at, first_updated);
    assert!(post.meta.updated_at > first_updated);
}

#[test]
fn test_update_refreshes_updated_at() {
    let dir = TempDir::new().unwrap();
    let store = Stone::open_at(dir.path()).unwrap();

    let mut post = Post::new("First post", "Hello world", "foo");
    store.posts().save(&mut post).unwrap();
    let id = post.meta.id.unwrap();
    let first_updated = post.meta.updated_at;

    thread::sleep(Duration::from_millis(5));
    let updated = store
        .posts()
        .update(id, PostChanges::new().tags("foo, bar, baz"))
        .unwrap();

    assert!(updated.meta.updated_at > first_updated);
    assert_eq!(updated.meta.created_at, post.meta.created_at);
}

#[test]
fn test_updated_at_strictly_increases_across_updates() {
    let dir = TempDir::new().unwrap();
    let store = Stone::open_at(dir.path()).unwrap();

    let mut post = Post::new("T", "B", "");
    store.posts().save(&mut post).unwrap();
    let id = post.meta.id.unwrap();

    let mut last = post.meta.updated_at.unwrap();
    for n in 0..3 {
        thread::sleep(Duration::from_millis(5));
        let updated = store
            .posts()
            .update(id, PostChanges::new().body(format!("revision {n}")))
            .unwrap();
        let stamp = updated.meta.updated_at.unwrap();
        assert!(stamp > last);
        last = stamp;
    }
}

// ============================================================================
// Allocation across the store lifecycle
// ============================================================================

#[test]
fn test_ids_are_strictly_increasing_without_allocator_gaps() {
    let dir = TempDir::new().unwrap();
    let store = Stone::open_at(dir.path()).unwrap();

    let mut ids = Vec::new();
    for n in 1..=20 {
        let mut post = Post::new(format!("P{n}"), "body", "");
        store.posts().save(&mut post).unwrap();
        ids.push(post.meta.id.unwrap().value());
    }

    let expected: Vec<u64> = (1..=20).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_deleted_ids_are_not_reused_within_a_store_lifetime() {
    let dir = TempDir::new().unwrap();
    let store = Stone::open_at(dir.path()).unwrap();

    for n in 1..=3 {
        let mut post = Post::new(format!("P{n}"), "body", "");
        store.posts().save(&mut post).unwrap();
    }
    store.posts().delete(RecordId::new(3)).unwrap();

    let mut post = Post::new("P4", "body", "");
    store.posts().save(&mut post).unwrap();
    assert_eq!(post.meta.id, Some(RecordId::new(4)));
}

#[test]
fn test_reopen_allocates_above_the_maximum_on_disk() {
    let dir = TempDir::new().unwrap();
    {
        let store = Stone::open_at(dir.path()).unwrap();
        for n in 1..=5 {
            let mut post = Post::new(format!("P{n}"), "body", "");
            store.posts().save(&mut post).unwrap();
        }
        // Deletions below the maximum must not lower the next id.
        store.posts().delete(RecordId::new(1)).unwrap();
        store.posts().delete(RecordId::new(4)).unwrap();
    }

    let store = Stone::open_at(dir.path()).unwrap();
    let mut post = Post::new("P6", "body", "");
    store.posts().save(&mut post).unwrap();
    assert_eq!(post.meta.id, Some(RecordId::new(6)));
    assert_eq!(store.posts().all().unwrap().len(), 4);
}

// ============================================================================
// Corrupt units
// ============================================================================

fn corrupt_unit(root: &std::path::Path, id: u64) {
    let unit = root.join("posts").join(format!("{id}.stone"));
    let mut bytes = fs::read(&unit).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0xFF;
    fs::write(&unit, bytes).unwrap();
}

#[test]
fn test_corrupt_unit_is_skipped_by_default() {
    let dir = TempDir::new().unwrap();
    {
        let store = Stone::open_at(dir.path()).unwrap();
        for n in 1..=3 {
            let mut post = Post::new(format!("P{n}"), "body", "");
            store.posts().save(&mut post).unwrap();
        }
    }
    corrupt_unit(dir.path(), 2);

    let store = Stone::open_at(dir.path()).unwrap();
    let ids: Vec<u64> = store
        .posts()
        .all()
        .unwrap()
        .iter()
        .map(|p| p.meta.id.unwrap().value())
        .collect();
    assert_eq!(ids, vec![1, 3]);

    // Direct access to the corrupt unit names it.
    let err = store.posts().get(RecordId::new(2)).unwrap_err();
    match err {
        StoneError::CorruptRecord { unit, .. } => {
            assert!(unit.to_string_lossy().contains("2.stone"));
        }
        other => panic!("expected corrupt record, got {other}"),
    }
}

#[test]
fn test_corrupt_unit_fails_fast_when_configured() {
    let dir = TempDir::new().unwrap();
    {
        let store = Stone::open_at(dir.path()).unwrap();
        let mut post = Post::new("P1", "body", "");
        store.posts().save(&mut post).unwrap();
    }
    corrupt_unit(dir.path(), 1);

    // Fail-fast opening still works (the corrupt unit is only touched by
    // reads), but listing aborts.
    let store = Stone::open(StoneConfig::new(dir.path()).fail_fast());
    match store {
        Ok(store) => {
            assert!(matches!(
                store.posts().all(),
                Err(StoneError::CorruptRecord { .. })
            ));
        }
        // Opening rebuilds indexes via a listing, so failing there is
        // equally acceptable under fail-fast.
        Err(e) => assert!(matches!(e, StoneError::CorruptRecord { .. })),
    }
}

// ============================================================================
// Instance isolation
// ============================================================================

#[test]
fn test_two_stores_at_different_roots_are_isolated() {
    let dir = TempDir::new().unwrap();
    let store_a = Stone::open_at(dir.path().join("a")).unwrap();
    let store_b = Stone::open_at(dir.path().join("b")).unwrap();

    let mut post = Post::new("Only in A", "body", "a-only");
    store_a.posts().save(&mut post).unwrap();

    assert_eq!(store_a.posts().all().unwrap().len(), 1);
    assert!(store_b.posts().all().unwrap().is_empty());
    assert!(store_b.posts_with_tag("a-only").unwrap().is_empty());
}

#[test]
fn test_record_survives_reopen_intact() {
    let dir = TempDir::new().unwrap();
    let saved;
    {
        let store = Stone::open_at(dir.path()).unwrap();
        let mut post = Post::new("Persistent", "Survives restart", "keep");
        store.posts().save(&mut post).unwrap();
        saved = post;
    }

    let store = Stone::open_at(dir.path()).unwrap();
    let loaded = store.posts().get(saved.meta.id.unwrap()).unwrap();
    assert_eq!(loaded, saved);
}
