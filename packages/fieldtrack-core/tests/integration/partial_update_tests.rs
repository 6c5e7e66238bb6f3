//! Partial update writes and their effect on baselines.

use std::sync::Arc;

use fieldtrack_core::{
    FieldValue, FieldValues, MemoryStore, Record, RecordId, RecordStore, RecordType, StoreError,
    TrackError, Tracker,
};
use ntest::timeout;

use super::helpers::{create_foreign, names, test_registry, tracker, FOREIGN, MODEL};

#[timeout(1000)]
#[test]
fn test_save_only_changed_fields() {
    let tracker = tracker();
    let mut tm = tracker.new_record(MODEL).unwrap();
    tracker.create(&mut tm).unwrap();
    let id = tm.id().unwrap();

    // two independent copies each change a different field
    let mut first = tracker.fetch(MODEL, id).unwrap();
    let mut second = tracker.fetch(MODEL, id).unwrap();
    first.set("characters", "first").unwrap();
    second.set("boolean", false).unwrap();

    assert!(tracker.partial_update(&mut first).unwrap());
    assert!(tracker.partial_update(&mut second).unwrap());

    let stored = tracker.fetch(MODEL, id).unwrap();
    assert_eq!(stored.get("characters"), Some(&FieldValue::from("first")));
    assert_eq!(stored.get("boolean"), Some(&FieldValue::Bool(false)));
}

#[timeout(1000)]
#[test]
fn test_partial_update_resets_baseline() {
    let tracker = tracker();
    let mut tm = tracker.new_record(MODEL).unwrap();
    tracker.create(&mut tm).unwrap();

    tm.set("characters", "changed").unwrap();
    tm.set("counter", 7i64).unwrap();
    assert_eq!(
        tracker.dirty_fields(&tm).unwrap(),
        names(&["characters", "counter"])
    );

    assert!(tracker.partial_update(&mut tm).unwrap());
    assert!(tracker.dirty_fields(&tm).unwrap().is_empty());
    assert!(!tracker.is_dirty(&tm).unwrap());

    let stored = tracker.fetch(MODEL, tm.id().unwrap()).unwrap();
    assert_eq!(stored.get("characters"), Some(&FieldValue::from("changed")));
    assert_eq!(stored.get("counter_value"), Some(&FieldValue::Int(7)));
    assert_eq!(stored.get("boolean"), Some(&FieldValue::Bool(true)));
}

#[timeout(1000)]
#[test]
fn test_no_changes_issues_no_write() {
    let tracker = tracker();
    let mut tm = tracker.new_record(MODEL).unwrap();
    tracker.create(&mut tm).unwrap();
    let writes = tracker.store().write_count();

    assert!(!tracker.partial_update(&mut tm).unwrap());
    assert_eq!(tracker.store().write_count(), writes);

    // changing and restoring a value is not a change
    tm.set("characters", "temporary").unwrap();
    tm.set("characters", "").unwrap();
    assert!(!tracker.partial_update(&mut tm).unwrap());
    assert_eq!(tracker.store().write_count(), writes);
}

#[timeout(1000)]
#[test]
fn test_new_record_is_created_in_full() {
    let tracker = tracker();
    let mut tm = tracker.new_record(MODEL).unwrap();
    tm.set("characters", "fresh").unwrap();

    assert!(tracker.partial_update(&mut tm).unwrap());
    let id = tm.id().expect("identifier assigned on create");
    assert!(!tracker.is_dirty(&tm).unwrap());

    let stored = tracker.fetch(MODEL, id).unwrap();
    assert_eq!(stored.values(), tm.values());
}

#[timeout(1000)]
#[test]
fn test_create_rejects_persisted_record() {
    let tracker = tracker();
    let mut tm = tracker.new_record(MODEL).unwrap();
    tracker.create(&mut tm).unwrap();

    assert!(matches!(
        tracker.create(&mut tm),
        Err(TrackError::InvalidAssignment { .. })
    ));
}

#[timeout(1000)]
#[test]
fn test_missing_row_returns_false() {
    let tracker = tracker();
    let mut tm = tracker.new_record(MODEL).unwrap();
    tracker.create(&mut tm).unwrap();
    assert!(tracker.store().delete(MODEL, tm.id().unwrap()).unwrap());

    tm.set("characters", "orphan").unwrap();
    assert!(!tracker.partial_update(&mut tm).unwrap());
    // baseline still moves forward
    assert!(tracker.dirty_fields(&tm).unwrap().is_empty());
}

#[timeout(1000)]
#[test]
fn test_store_error_keeps_baseline() {
    let tracker = tracker();
    let mut tm = tracker.new_record(MODEL).unwrap();
    tracker.create(&mut tm).unwrap();

    tm.set("foreign_test_model_id", RecordId(999)).unwrap();
    assert!(matches!(
        tracker.partial_update(&mut tm),
        Err(TrackError::Store(StoreError::ConstraintViolation(_)))
    ));
    assert_eq!(
        tracker.dirty_fields(&tm).unwrap(),
        names(&["foreign_test_model"])
    );
}

#[timeout(1000)]
#[test]
fn test_only_dirty_fields_reach_the_store() {
    let tracker = tracker();
    let ftm = create_foreign(&tracker, "original");
    let mut tm = tracker.new_record(MODEL).unwrap();
    tm.set_related("foreign_test_model", Some(ftm)).unwrap();
    tracker.create(&mut tm).unwrap();

    tm.set("counter", 3i64).unwrap();
    let changed = tracker.changed_values(&tm).unwrap();
    assert_eq!(changed.get("counter"), Some(&FieldValue::Int(3)));

    let columns = fieldtrack_core::diff(tm.baseline(), &tm).unwrap().into_values();
    assert!(columns.contains_key("counter_value"));
    let resolution = fieldtrack_core::resolve_changes(&tm, &columns).unwrap();
    assert_eq!(
        resolution.values.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["counter"]
    );
    assert!(tracker.partial_update(&mut tm).unwrap());
}

/// Store that reports every partial update as matching two records.
struct DuplicatingStore(MemoryStore);

impl RecordStore for DuplicatingStore {
    fn create(&self, record: &Record) -> Result<RecordId, StoreError> {
        self.0.create(record)
    }

    fn partial_update(
        &self,
        record_type: &RecordType,
        id: RecordId,
        values: &FieldValues,
    ) -> Result<usize, StoreError> {
        self.0.partial_update(record_type, id, values).map(|n| n * 2)
    }

    fn fetch_by_identifier(&self, type_name: &str, id: RecordId) -> Result<Record, StoreError> {
        self.0.fetch_by_identifier(type_name, id)
    }
}

#[timeout(1000)]
#[test]
fn test_ambiguous_update_is_an_error() {
    let registry = test_registry();
    let store = DuplicatingStore(MemoryStore::new(&registry));
    let tracker = Tracker::new(registry, store);

    let mut tm = tracker.new_record(FOREIGN).unwrap();
    tracker.create(&mut tm).unwrap();
    tm.set("characters", "twice").unwrap();

    let err = tracker.partial_update(&mut tm).unwrap_err();
    assert!(matches!(err, TrackError::AmbiguousUpdate { count: 2, .. }));
    assert_eq!(tracker.dirty_fields(&tm).unwrap(), names(&["characters"]));
}

#[timeout(1000)]
#[test]
fn test_tracker_accepts_borrowed_store() {
    let registry = test_registry();
    let store = Arc::new(MemoryStore::new(&registry));
    let tracker = Tracker::new(registry, store.as_ref());

    let mut tm = tracker.new_record(FOREIGN).unwrap();
    tracker.create(&mut tm).unwrap();
    tm.set("boolean", false).unwrap();
    assert!(tracker.partial_update(&mut tm).unwrap());
    assert_eq!(store.row_count(FOREIGN).unwrap(), 1);
}

/// Store whose related-record loads fail after writes succeed.
struct UnreadableForeignStore(MemoryStore);

impl RecordStore for UnreadableForeignStore {
    fn create(&self, record: &Record) -> Result<RecordId, StoreError> {
        self.0.create(record)
    }

    fn partial_update(
        &self,
        record_type: &RecordType,
        id: RecordId,
        values: &FieldValues,
    ) -> Result<usize, StoreError> {
        self.0.partial_update(record_type, id, values)
    }

    fn fetch_by_identifier(&self, type_name: &str, id: RecordId) -> Result<Record, StoreError> {
        if type_name == FOREIGN {
            return Err(StoreError::Unavailable(format!("{} {}", type_name, id)));
        }
        self.0.fetch_by_identifier(type_name, id)
    }
}

#[timeout(1000)]
#[test]
fn test_refresh_failure_after_write_leaves_record_clean() {
    let registry = test_registry();
    let store = UnreadableForeignStore(MemoryStore::new(&registry));
    let tracker = Tracker::new(registry, store);

    let mut ftm = tracker.new_record(FOREIGN).unwrap();
    tracker.create(&mut ftm).unwrap();
    let mut tm = tracker.new_record(MODEL).unwrap();
    tracker.create(&mut tm).unwrap();

    tm.set("foreign_test_model_id", ftm.id().unwrap()).unwrap();
    assert!(matches!(
        tracker.partial_update(&mut tm),
        Err(TrackError::Store(StoreError::Unavailable(_)))
    ));

    // the identifier was written, so nothing is left dirty
    assert!(tracker.dirty_fields(&tm).unwrap().is_empty());
    let stored = tracker.fetch(MODEL, tm.id().unwrap()).unwrap();
    assert_eq!(
        stored.get("foreign_test_model"),
        Some(&FieldValue::Id(ftm.id().unwrap()))
    );
}
