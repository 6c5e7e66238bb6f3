//! Record store abstraction consumed by the tracker.

mod memory;

use std::sync::Arc;

use crate::error::StoreError;
use crate::record::Record;
use crate::schema::RecordType;
use crate::value::{FieldValues, RecordId};

pub use memory::MemoryStore;

/// Persistence backend for tracked records.
///
/// Implementations must apply each `partial_update` atomically and scope
/// it to the single record matching `id`.
pub trait RecordStore {
    /// Persists a new record and returns its assigned identifier.
    fn create(&self, record: &Record) -> Result<RecordId, StoreError>;

    /// Writes only the given fields of the record matching `id`.
    ///
    /// Keys are semantic field names. Returns the number of records
    /// updated: 0 when nothing matched, 1 otherwise.
    fn partial_update(
        &self,
        record_type: &RecordType,
        id: RecordId,
        values: &FieldValues,
    ) -> Result<usize, StoreError>;

    /// Loads a fully materialised record by identifier.
    fn fetch_by_identifier(&self, type_name: &str, id: RecordId) -> Result<Record, StoreError>;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn create(&self, record: &Record) -> Result<RecordId, StoreError> {
        (**self).create(record)
    }

    fn partial_update(
        &self,
        record_type: &RecordType,
        id: RecordId,
        values: &FieldValues,
    ) -> Result<usize, StoreError> {
        (**self).partial_update(record_type, id, values)
    }

    fn fetch_by_identifier(&self, type_name: &str, id: RecordId) -> Result<Record, StoreError> {
        (**self).fetch_by_identifier(type_name, id)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn create(&self, record: &Record) -> Result<RecordId, StoreError> {
        (**self).create(record)
    }

    fn partial_update(
        &self,
        record_type: &RecordType,
        id: RecordId,
        values: &FieldValues,
    ) -> Result<usize, StoreError> {
        (**self).partial_update(record_type, id, values)
    }

    fn fetch_by_identifier(&self, type_name: &str, id: RecordId) -> Result<Record, StoreError> {
        (**self).fetch_by_identifier(type_name, id)
    }
}
