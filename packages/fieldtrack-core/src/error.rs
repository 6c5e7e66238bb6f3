//! Change-tracking and record store error types.

use thiserror::Error;

/// Errors reported by a [`RecordStore`](crate::store::RecordStore).
///
/// These pass through the tracker unmodified.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Record type has no table in the store
    #[error("Record type '{0}' not found in store")]
    TypeNotFound(String),

    /// No record with the given identifier
    #[error("Record {id} not found in '{record_type}'")]
    RecordNotFound { record_type: String, id: u64 },

    /// Update payload names a field the record type does not have
    #[error("Unknown field '{field}' for '{record_type}'")]
    UnknownField { record_type: String, field: String },

    /// Write rejected by a store-side constraint
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Stored data does not match the record type
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// Backend could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Lock poisoned (RwLock poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Change-tracking errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    /// Snapshot or diff attempted on a partially loaded record
    #[error("Unsupported record state: '{record_type}' is {reason}")]
    UnsupportedRecordState {
        record_type: String,
        reason: &'static str,
    },

    /// Field not found in record type
    #[error("Field '{field}' not found in '{record_type}'")]
    FieldNotFound { record_type: String, field: String },

    /// Two fields declared with the same semantic name
    #[error("Field '{field}' declared twice in '{record_type}'")]
    DuplicateField { record_type: String, field: String },

    /// Storage column resolves to more than one semantic name
    #[error("Column '{column}' of '{record_type}' is ambiguous between '{first}' and '{second}'")]
    AliasCollision {
        record_type: String,
        column: String,
        first: String,
        second: String,
    },

    /// Empty type, field or column name
    #[error("Empty {what} in '{record_type}'")]
    EmptyName {
        record_type: String,
        what: &'static str,
    },

    /// Record type declared without fields
    #[error("Record type '{0}' declares no fields")]
    NoFields(String),

    /// Record type not registered
    #[error("Record type '{0}' not found")]
    TypeNotFound(String),

    /// Record type registered twice
    #[error("Record type '{0}' already exists")]
    TypeAlreadyExists(String),

    /// Relation points at a type that is not registered
    #[error("Relation '{record_type}'.'{field}' targets unknown type '{target}'")]
    UnknownRelationTarget {
        record_type: String,
        field: String,
        target: String,
    },

    /// Value cannot be assigned to the addressed field
    #[error("Cannot assign to '{field}' of '{record_type}': {reason}")]
    InvalidAssignment {
        record_type: String,
        field: String,
        reason: String,
    },

    /// Related record has no persisted identifier yet
    #[error("Related record for '{field}' has not been saved")]
    UnsavedRelated { field: String },

    /// Store reported more than one updated record for an identifier-scoped write
    #[error("Partial update of {record_type} {id} affected {count} records")]
    AmbiguousUpdate {
        record_type: String,
        id: u64,
        count: usize,
    },

    /// Schema file rejected
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error while reading a schema file
    #[error("I/O error: {0}")]
    Io(String),

    /// Record store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}
