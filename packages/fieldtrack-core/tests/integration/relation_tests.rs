//! Relation reconciliation after partial updates.

use std::sync::Arc;

use fieldtrack_core::{FieldValue, MemoryStore, RecordId, TrackError, Tracker, TrackerConfig};
use ntest::timeout;

use super::helpers::{create_foreign, test_registry, tracker, MODEL};

#[timeout(1000)]
#[test]
fn test_object_assignment_keeps_related_record() {
    let tracker = tracker();
    let ftm1 = create_foreign(&tracker, "one");
    let ftm2 = create_foreign(&tracker, "two");

    let mut tm = tracker.new_record(MODEL).unwrap();
    tm.set_related("foreign_test_model", Some(ftm1)).unwrap();
    tracker.create(&mut tm).unwrap();

    tm.set_related("foreign_test_model", Some(ftm2.clone())).unwrap();
    assert!(tracker.partial_update(&mut tm).unwrap());

    let related = tm.related("foreign_test_model").unwrap();
    assert_eq!(related.id(), ftm2.id());
    assert_eq!(related.get("characters"), Some(&FieldValue::from("two")));
}

#[timeout(1000)]
#[test]
fn test_identifier_assignment_refreshes_related_record() {
    let tracker = tracker();
    let ftm1 = create_foreign(&tracker, "one");
    let ftm2 = create_foreign(&tracker, "two");

    let mut tm = tracker.new_record(MODEL).unwrap();
    tm.set_related("foreign_test_model", Some(ftm1.clone())).unwrap();
    tracker.create(&mut tm).unwrap();

    tm.set("foreign_test_model_id", ftm2.id().unwrap()).unwrap();
    // cache is stale until the update runs
    assert_eq!(tm.related("foreign_test_model").unwrap().id(), ftm1.id());

    assert!(tracker.partial_update(&mut tm).unwrap());
    let related = tm.related("foreign_test_model").unwrap();
    assert_eq!(related.id(), ftm2.id());
    assert_eq!(related.get("characters"), Some(&FieldValue::from("two")));
}

#[timeout(1000)]
#[test]
fn test_both_assignment_paths_converge() {
    let tracker = tracker();
    let ftm1 = create_foreign(&tracker, "one");
    let ftm2 = create_foreign(&tracker, "two");

    let mut by_object = tracker.new_record(MODEL).unwrap();
    by_object.set_related("foreign_test_model", Some(ftm1.clone())).unwrap();
    tracker.create(&mut by_object).unwrap();
    let mut by_id = tracker.new_record(MODEL).unwrap();
    by_id.set_related("foreign_test_model", Some(ftm1)).unwrap();
    tracker.create(&mut by_id).unwrap();

    by_object.set_related("foreign_test_model", Some(ftm2.clone())).unwrap();
    by_id.set("foreign_test_model_id", ftm2.id().unwrap()).unwrap();
    tracker.partial_update(&mut by_object).unwrap();
    tracker.partial_update(&mut by_id).unwrap();

    for record in [&by_object, &by_id] {
        let stored = tracker.fetch(MODEL, record.id().unwrap()).unwrap();
        assert_eq!(
            stored.get("foreign_test_model"),
            Some(&FieldValue::Id(ftm2.id().unwrap()))
        );
        assert_eq!(record.related("foreign_test_model").unwrap().id(), ftm2.id());
    }
}

#[timeout(1000)]
#[test]
fn test_clearing_relation_drops_cache() {
    let tracker = tracker();
    let ftm = create_foreign(&tracker, "one");

    let mut tm = tracker.new_record(MODEL).unwrap();
    tm.set_related("foreign_test_model", Some(ftm)).unwrap();
    tracker.create(&mut tm).unwrap();

    tm.set("foreign_test_model_id", FieldValue::Null).unwrap();
    assert!(tracker.partial_update(&mut tm).unwrap());
    assert!(tm.related("foreign_test_model").is_none());
    assert_eq!(tm.get("foreign_test_model"), Some(&FieldValue::Null));
}

#[timeout(1000)]
#[test]
fn test_refresh_can_be_disabled() {
    let registry = test_registry();
    let store = Arc::new(MemoryStore::new(&registry));
    let config = TrackerConfig {
        refresh_relations: false,
        ..TrackerConfig::default()
    };
    let tracker = Tracker::with_config(registry, store, config);

    let ftm1 = create_foreign(&tracker, "one");
    let ftm2 = create_foreign(&tracker, "two");
    let mut tm = tracker.new_record(MODEL).unwrap();
    tm.set_related("foreign_test_model", Some(ftm1.clone())).unwrap();
    tracker.create(&mut tm).unwrap();

    tm.set("foreign_test_model_id", ftm2.id().unwrap()).unwrap();
    assert!(tracker.partial_update(&mut tm).unwrap());

    // stored identifier changed, cache left alone
    assert_eq!(tm.related("foreign_test_model").unwrap().id(), ftm1.id());
    let resolved = tracker
        .resolve_related(&tm, "foreign_test_model")
        .unwrap()
        .unwrap();
    assert_eq!(resolved.id(), ftm2.id());
}

#[timeout(1000)]
#[test]
fn test_resolve_related() {
    let tracker = tracker();
    let ftm = create_foreign(&tracker, "one");
    let mut tm = tracker.new_record(MODEL).unwrap();
    assert!(tracker
        .resolve_related(&tm, "foreign_test_model")
        .unwrap()
        .is_none());

    tm.set("foreign_test_model_id", ftm.id().unwrap()).unwrap();
    let resolved = tracker
        .resolve_related(&tm, "foreign_test_model")
        .unwrap()
        .unwrap();
    assert_eq!(resolved.get("characters"), Some(&FieldValue::from("one")));

    assert!(matches!(
        tracker.resolve_related(&tm, "characters"),
        Err(TrackError::InvalidAssignment { .. })
    ));
}

#[timeout(1000)]
#[test]
fn test_relation_assignment_rules() {
    let tracker = tracker();
    let mut tm = tracker.new_record(MODEL).unwrap();

    // the relation name takes a record, not a raw identifier
    assert!(matches!(
        tm.set("foreign_test_model", RecordId(1)),
        Err(TrackError::InvalidAssignment { .. })
    ));
    assert!(matches!(
        tm.set("foreign_test_model_id", "not an id"),
        Err(TrackError::InvalidAssignment { .. })
    ));

    let unsaved = tracker.new_record(super::helpers::FOREIGN).unwrap();
    assert!(matches!(
        tm.set_related("foreign_test_model", Some(unsaved)),
        Err(TrackError::UnsavedRelated { .. })
    ));

    let wrong_type = tracker.new_record(MODEL).unwrap();
    assert!(matches!(
        tm.set_related("foreign_test_model", Some(wrong_type)),
        Err(TrackError::InvalidAssignment { .. })
    ));
}
