//! Record instances with tracked field state.
//!
//! A record holds one value per field in declaration order. Relation
//! fields hold the related identifier; the related record itself, when
//! known, is cached separately and can go stale if the identifier is
//! assigned directly.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::TrackError;
use crate::schema::RecordType;
use crate::snapshot::{self, Snapshot};
use crate::value::{FieldValue, FieldValues, RecordId};

/// Record instance with its change-tracking baseline.
#[derive(Debug, Clone)]
pub struct Record {
    record_type: Arc<RecordType>,
    id: Option<RecordId>,
    values: Vec<FieldValue>,
    /// Per-field load flags; all `true` unless loaded from a projection
    loaded: Vec<bool>,
    /// Cached related records keyed by relation name
    related: BTreeMap<String, Record>,
    baseline: Snapshot,
}

impl Record {
    /// Creates a new, unsaved record with every field at its default.
    ///
    /// # Arguments
    /// * `record_type` - Record type to instantiate
    ///
    /// # Returns
    /// A record whose baseline equals its defaults, so no field is dirty yet.
    pub fn new(record_type: Arc<RecordType>) -> Self {
        let values: Vec<FieldValue> = record_type
            .fields()
            .iter()
            .map(|f| f.default.clone())
            .collect();
        let baseline = Snapshot::from_fields(&record_type, &values);
        Self {
            loaded: vec![true; values.len()],
            record_type,
            id: None,
            values,
            related: BTreeMap::new(),
            baseline,
        }
    }

    /// Builds a fully loaded, persisted record from a stored row.
    ///
    /// # Arguments
    /// * `record_type` - Record type of the row
    /// * `id` - Persisted identifier
    /// * `values` - One value per field in declaration order
    ///
    /// # Returns
    /// `Result<Record, TrackError>` with the baseline captured from `values`.
    pub fn from_row(
        record_type: Arc<RecordType>,
        id: RecordId,
        values: Vec<FieldValue>,
    ) -> Result<Self, TrackError> {
        if values.len() != record_type.fields().len() {
            return Err(TrackError::SchemaError(format!(
                "Row for '{}' has {} values, expected {}",
                record_type.name(),
                values.len(),
                record_type.fields().len()
            )));
        }
        let baseline = Snapshot::from_fields(&record_type, &values);
        Ok(Self {
            loaded: vec![true; values.len()],
            record_type,
            id: Some(id),
            values,
            related: BTreeMap::new(),
            baseline,
        })
    }

    /// Builds a partially loaded (deferred) record from a projection.
    ///
    /// Fields missing from `values` are unavailable; snapshot and diff
    /// operations on the record fail until it is loaded in full.
    ///
    /// # Arguments
    /// * `record_type` - Record type of the row
    /// * `id` - Persisted identifier
    /// * `values` - Loaded values keyed by semantic name or storage column
    pub fn from_projection(
        record_type: Arc<RecordType>,
        id: RecordId,
        values: FieldValues,
    ) -> Result<Self, TrackError> {
        let width = record_type.fields().len();
        let mut row = vec![FieldValue::Null; width];
        let mut loaded = vec![false; width];
        for (key, value) in values {
            let (index, _) = record_type.resolve_key(&key)?;
            row[index] = value;
            loaded[index] = true;
        }
        Ok(Self {
            record_type,
            id: Some(id),
            values: row,
            loaded,
            related: BTreeMap::new(),
            baseline: Snapshot::default(),
        })
    }

    /// Returns the record type.
    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    /// Returns the persisted identifier, if any.
    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    /// Returns `true` until the record has been created in a store.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Returns `true` when some fields were not loaded.
    pub fn is_deferred(&self) -> bool {
        self.loaded.iter().any(|loaded| !loaded)
    }

    /// Returns the snapshot taken at construction, load, or last persistence.
    pub fn baseline(&self) -> &Snapshot {
        &self.baseline
    }

    /// Replaces the baseline with a freshly captured snapshot.
    ///
    /// # Returns
    /// `Err(TrackError::UnsupportedRecordState)` for deferred records.
    pub fn reset_baseline(&mut self) -> Result<(), TrackError> {
        self.baseline = snapshot::capture_snapshot(self)?;
        Ok(())
    }

    /// Reads a field by semantic name or storage column.
    ///
    /// Relation fields yield their identifier under either key. Unknown
    /// keys and fields not loaded by a projection yield `None`.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        let index = self.record_type.position(key)?;
        if !self.loaded[index] {
            return None;
        }
        self.values.get(index)
    }

    /// Writes a plain field, or a relation identifier addressed by its column.
    ///
    /// Assigning a relation's identifier column leaves any cached related
    /// record untouched; it is refreshed on the next partial update.
    ///
    /// # Arguments
    /// * `key` - Semantic name or storage column
    /// * `value` - New value
    ///
    /// # Returns
    /// `Result<(), TrackError>` indicating success or failure.
    pub fn set(&mut self, key: &str, value: impl Into<FieldValue>) -> Result<(), TrackError> {
        let value = value.into();
        let (index, field) = self.record_type.resolve_key(key)?;

        if field.is_relation() {
            if key == field.name && field.is_aliased() {
                return Err(TrackError::InvalidAssignment {
                    record_type: self.record_type.name().to_string(),
                    field: key.to_string(),
                    reason: format!(
                        "relation takes a record; assign '{}' for a raw identifier",
                        field.column
                    ),
                });
            }
            if !value.is_identifier() {
                return Err(TrackError::InvalidAssignment {
                    record_type: self.record_type.name().to_string(),
                    field: key.to_string(),
                    reason: format!("expected an identifier, got {}", value.kind()),
                });
            }
        }

        if !self.loaded[index] {
            return Err(self.deferred_error());
        }

        self.values[index] = value;
        Ok(())
    }

    /// Assigns a related record, updating the identifier column to match.
    ///
    /// # Arguments
    /// * `name` - Semantic relation name
    /// * `related` - Persisted related record, or `None` to clear
    ///
    /// # Returns
    /// `Result<(), TrackError>` indicating success or failure.
    pub fn set_related(&mut self, name: &str, related: Option<Record>) -> Result<(), TrackError> {
        let (index, field) = self.record_type.resolve_key(name)?;
        let relation = field
            .relation
            .as_ref()
            .ok_or_else(|| TrackError::InvalidAssignment {
                record_type: self.record_type.name().to_string(),
                field: name.to_string(),
                reason: "not a relation".to_string(),
            })?;
        let field_name = field.name.clone();

        if let Some(record) = &related {
            if record.record_type.name() != relation.target {
                return Err(TrackError::InvalidAssignment {
                    record_type: self.record_type.name().to_string(),
                    field: field_name,
                    reason: format!(
                        "expected '{}', got '{}'",
                        relation.target,
                        record.record_type.name()
                    ),
                });
            }
        }

        if !self.loaded[index] {
            return Err(self.deferred_error());
        }

        match related {
            Some(record) => {
                let id = record
                    .id
                    .ok_or(TrackError::UnsavedRelated { field: field_name.clone() })?;
                self.values[index] = FieldValue::Id(id);
                self.related.insert(field_name, record);
            }
            None => {
                self.values[index] = FieldValue::Null;
                self.related.remove(&field_name);
            }
        }
        Ok(())
    }

    /// Returns the cached related record for a relation name.
    pub fn related(&self, name: &str) -> Option<&Record> {
        self.related.get(name)
    }

    /// Returns the cached related record for in-place edits.
    ///
    /// Callers must not change the related record's identifier.
    pub fn related_mut(&mut self, name: &str) -> Option<&mut Record> {
        self.related.get_mut(name)
    }

    /// Identifier held by the cached related record, if one is cached.
    pub(crate) fn held_related_id(&self, name: &str) -> Option<RecordId> {
        self.related.get(name).and_then(|record| record.id)
    }

    /// Replaces the cached related record without touching the identifier column.
    pub(crate) fn cache_related(&mut self, name: &str, related: Option<Record>) {
        match related {
            Some(record) => {
                self.related.insert(name.to_string(), record);
            }
            None => {
                self.related.remove(name);
            }
        }
    }

    /// Records the identifier assigned by the store on create.
    pub(crate) fn mark_persisted(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    /// Field values in declaration order.
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub(crate) fn deferred_error(&self) -> TrackError {
        TrackError::UnsupportedRecordState {
            record_type: self.record_type.name().to_string(),
            reason: "deferred (partially loaded)",
        }
    }
}
