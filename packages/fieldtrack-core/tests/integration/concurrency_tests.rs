//! Concurrent partial updates from independent workers.

use std::sync::Arc;
use std::thread;

use fieldtrack_core::{FieldValue, MemoryStore, Tracker};
use ntest::timeout;

use super::helpers::{test_registry, MODEL};

#[timeout(5000)]
#[test]
fn test_workers_updating_different_fields_lose_nothing() {
    let registry = test_registry();
    let store = Arc::new(MemoryStore::new(&registry));
    let tracker = Arc::new(Tracker::new(registry, Arc::clone(&store)));

    let mut ids = Vec::new();
    for _ in 0..20 {
        let mut tm = tracker.new_record(MODEL).unwrap();
        tracker.create(&mut tm).unwrap();
        ids.push(tm.id().unwrap());
    }
    let ids = Arc::new(ids);

    let characters = {
        let tracker = Arc::clone(&tracker);
        let ids = Arc::clone(&ids);
        thread::spawn(move || {
            for id in ids.iter() {
                let mut tm = tracker.fetch(MODEL, *id).unwrap();
                tm.set("characters", format!("record {}", id)).unwrap();
                assert!(tracker.partial_update(&mut tm).unwrap());
            }
        })
    };
    let counters = {
        let tracker = Arc::clone(&tracker);
        let ids = Arc::clone(&ids);
        thread::spawn(move || {
            for id in ids.iter() {
                let mut tm = tracker.fetch(MODEL, *id).unwrap();
                tm.set("counter", id.get() as i64).unwrap();
                assert!(tracker.partial_update(&mut tm).unwrap());
            }
        })
    };
    characters.join().unwrap();
    counters.join().unwrap();

    for id in ids.iter() {
        let stored = tracker.fetch(MODEL, *id).unwrap();
        assert_eq!(
            stored.get("characters"),
            Some(&FieldValue::Text(format!("record {}", id)))
        );
        assert_eq!(stored.get("counter"), Some(&FieldValue::Int(id.get() as i64)));
    }
    assert_eq!(store.write_count(), 60);
}

#[timeout(5000)]
#[test]
fn test_concurrent_creates_get_unique_ids() {
    let registry = test_registry();
    let store = Arc::new(MemoryStore::new(&registry));
    let tracker = Arc::new(Tracker::new(registry, Arc::clone(&store)));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                (0..25)
                    .map(|_| {
                        let mut tm = tracker.new_record(MODEL).unwrap();
                        tracker.create(&mut tm).unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 100);
    assert_eq!(store.row_count(MODEL).unwrap(), 100);
}
