//! Snapshot capture and dirty-field diffing.
//!
//! A snapshot maps each storage column to its comparable value. Relation
//! columns hold the related identifier, so diffs never depend on whether
//! the related record is loaded. Dirty sets are recomputed on every query.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::TrackError;
use crate::record::Record;
use crate::schema::RecordType;
use crate::value::{FieldValue, FieldValues};

/// Immutable column-to-value capture of a record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    values: BTreeMap<String, FieldValue>,
}

impl Snapshot {
    /// Builds a snapshot from values in declaration order.
    pub(crate) fn from_fields(record_type: &RecordType, values: &[FieldValue]) -> Self {
        let values = record_type
            .fields()
            .iter()
            .zip(values)
            .map(|(field, value)| (field.column.clone(), value.clone()))
            .collect();
        Self { values }
    }

    /// Returns the captured value for a storage column.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Columns whose current value differs from the baseline, with current values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirtySet {
    values: FieldValues,
}

impl DirtySet {
    /// Returns the dirty storage columns.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns the current value of a dirty column.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Consumes the set, returning the column-keyed current values.
    pub fn into_values(self) -> FieldValues {
        self.values
    }
}

/// Captures the comparable state of every field.
///
/// # Arguments
/// * `record` - Fully loaded record
///
/// # Returns
/// `Err(TrackError::UnsupportedRecordState)` for deferred records.
pub fn capture_snapshot(record: &Record) -> Result<Snapshot, TrackError> {
    if record.is_deferred() {
        return Err(record.deferred_error());
    }
    Ok(Snapshot::from_fields(record.record_type(), record.values()))
}

/// Compares a baseline against the record's present state.
///
/// Every column of the baseline whose value is unequal to the current
/// value is reported with the current value.
///
/// # Arguments
/// * `baseline` - Snapshot to compare against
/// * `record` - Record in its present state
///
/// # Returns
/// `Result<DirtySet, TrackError>` containing the changed columns.
pub fn diff(baseline: &Snapshot, record: &Record) -> Result<DirtySet, TrackError> {
    let current = capture_snapshot(record)?;
    let values = baseline
        .values
        .iter()
        .filter_map(|(column, original)| {
            let now = current.values.get(column).cloned().unwrap_or_default();
            (&now != original).then(|| (column.clone(), now))
        })
        .collect();

    let dirty = DirtySet { values };
    tracing::trace!(
        record_type = record.record_type().name(),
        dirty = dirty.len(),
        "Diffed record against baseline"
    );
    Ok(dirty)
}

/// Reports whether the record needs saving.
///
/// New records are always dirty; persisted records are dirty when any
/// field differs from the baseline.
pub fn is_dirty(record: &Record) -> Result<bool, TrackError> {
    if record.is_new() {
        return Ok(true);
    }
    Ok(!diff(record.baseline(), record)?.is_empty())
}

/// Returns the semantic names of the dirty fields.
pub fn dirty_fields(record: &Record) -> Result<BTreeSet<String>, TrackError> {
    let dirty = diff(record.baseline(), record)?;
    let record_type = record.record_type();
    Ok(dirty
        .keys()
        .map(|column| {
            record_type
                .field_by_column(column)
                .map_or_else(|| column.to_string(), |field| field.name.clone())
        })
        .collect())
}
