//! In-memory record store.
//!
//! Each record type gets a table with:
//! - Rows keyed by identifier, swapped atomically on every write
//! - Record ID sequence generator
//! - Relation constraint checks against the target table

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use arc_swap::ArcSwap;

use crate::config::TrackerConfig;
use crate::error::StoreError;
use crate::record::Record;
use crate::schema::{RecordType, Registry};
use crate::value::{FieldValue, FieldValues, RecordId};

use super::RecordStore;

type Rows = HashMap<RecordId, Vec<FieldValue>>;

/// Table of stored rows for one record type.
#[derive(Debug)]
struct StoredTable {
    /// Record type of every row
    record_type: Arc<RecordType>,
    /// Rows replaced wholesale by read-copy-update
    rows: ArcSwap<Rows>,
    /// Next record ID to assign (atomic counter)
    next_id: AtomicU64,
}

impl StoredTable {
    fn new(record_type: Arc<RecordType>, capacity: usize) -> Self {
        Self {
            record_type,
            rows: ArcSwap::from_pointee(HashMap::with_capacity(capacity)),
            next_id: AtomicU64::new(1), // Start IDs at 1
        }
    }

    fn row(&self, id: RecordId) -> Option<Vec<FieldValue>> {
        self.rows.load().get(&id).cloned()
    }

    fn contains(&self, id: RecordId) -> bool {
        self.rows.load().contains_key(&id)
    }
}

/// In-memory [`RecordStore`] with one table per registered record type.
#[derive(Debug)]
pub struct MemoryStore {
    /// Map of type name to table
    tables: RwLock<HashMap<String, Arc<StoredTable>>>,
    /// Initial row capacity for new tables
    initial_capacity: usize,
    /// Successful create and partial-update calls
    writes: AtomicU64,
}

impl MemoryStore {
    /// Creates a store with a table for every type in the registry.
    pub fn new(registry: &Registry) -> Self {
        Self::with_config(registry, &TrackerConfig::default())
    }

    /// Creates a store using the capacity hint from `config`.
    pub fn with_config(registry: &Registry, config: &TrackerConfig) -> Self {
        let tables = registry
            .iter()
            .map(|record_type| {
                (
                    record_type.name().to_string(),
                    Arc::new(StoredTable::new(
                        Arc::clone(record_type),
                        config.initial_table_capacity,
                    )),
                )
            })
            .collect();
        Self {
            tables: RwLock::new(tables),
            initial_capacity: config.initial_table_capacity,
            writes: AtomicU64::new(0),
        }
    }

    /// Adds a table for a record type registered after construction.
    ///
    /// # Returns
    /// `Result<bool, StoreError>`: `false` when the table already existed.
    pub fn add_type(&self, record_type: Arc<RecordType>) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::LockPoisoned)?;
        if tables.contains_key(record_type.name()) {
            return Ok(false);
        }
        tables.insert(
            record_type.name().to_string(),
            Arc::new(StoredTable::new(record_type, self.initial_capacity)),
        );
        Ok(true)
    }

    /// Loads a deferred record containing only the requested fields.
    ///
    /// # Arguments
    /// * `type_name` - Record type name
    /// * `id` - Record identifier
    /// * `keys` - Semantic names or storage columns to load
    pub fn fetch_only(
        &self,
        type_name: &str,
        id: RecordId,
        keys: &[&str],
    ) -> Result<Record, StoreError> {
        let table = self.table(type_name)?;
        let row = table.row(id).ok_or_else(|| StoreError::RecordNotFound {
            record_type: type_name.to_string(),
            id: id.get(),
        })?;

        let mut values = FieldValues::new();
        for key in keys {
            let index = table
                .record_type
                .position(key)
                .ok_or_else(|| StoreError::UnknownField {
                    record_type: type_name.to_string(),
                    field: key.to_string(),
                })?;
            values.insert(key.to_string(), row[index].clone());
        }

        Record::from_projection(Arc::clone(&table.record_type), id, values)
            .map_err(|e| StoreError::DataCorruption(e.to_string()))
    }

    /// Removes a row.
    ///
    /// # Returns
    /// `Result<bool, StoreError>` indicating whether a row was removed.
    pub fn delete(&self, type_name: &str, id: RecordId) -> Result<bool, StoreError> {
        let table = self.table(type_name)?;
        let previous = table.rows.rcu(|rows| {
            let mut rows = Rows::clone(rows);
            rows.remove(&id);
            rows
        });
        Ok(previous.contains_key(&id))
    }

    /// Returns the number of stored rows for a type.
    pub fn row_count(&self, type_name: &str) -> Result<usize, StoreError> {
        Ok(self.table(type_name)?.rows.load().len())
    }

    /// Returns the number of creates plus partial updates that matched a row.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Acquire)
    }

    fn table(&self, type_name: &str) -> Result<Arc<StoredTable>, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::LockPoisoned)?;
        tables
            .get(type_name)
            .cloned()
            .ok_or_else(|| StoreError::TypeNotFound(type_name.to_string()))
    }

    /// Checks that a relation value references an existing row.
    fn check_relation(
        &self,
        record_type: &RecordType,
        index: usize,
        value: &FieldValue,
    ) -> Result<(), StoreError> {
        let field = &record_type.fields()[index];
        let Some(relation) = &field.relation else {
            return Ok(());
        };
        match value {
            FieldValue::Null => Ok(()),
            FieldValue::Id(id) => {
                if self.table(&relation.target)?.contains(*id) {
                    Ok(())
                } else {
                    Err(StoreError::ConstraintViolation(format!(
                        "'{}'.'{}' references missing '{}' {}",
                        record_type.name(),
                        field.name,
                        relation.target,
                        id
                    )))
                }
            }
            other => Err(StoreError::ConstraintViolation(format!(
                "'{}'.'{}' expects an identifier, got {}",
                record_type.name(),
                field.name,
                other.kind()
            ))),
        }
    }
}

impl RecordStore for MemoryStore {
    fn create(&self, record: &Record) -> Result<RecordId, StoreError> {
        let type_name = record.record_type().name();
        let table = self.table(type_name)?;

        let values = record.values().to_vec();
        if values.len() != table.record_type.fields().len() {
            return Err(StoreError::DataCorruption(format!(
                "Record for '{}' has {} values, table expects {}",
                type_name,
                values.len(),
                table.record_type.fields().len()
            )));
        }
        for (index, value) in values.iter().enumerate() {
            self.check_relation(&table.record_type, index, value)?;
        }

        let id = RecordId(table.next_id.fetch_add(1, Ordering::SeqCst));
        table.rows.rcu(|rows| {
            let mut rows = Rows::clone(rows);
            rows.insert(id, values.clone());
            rows
        });
        self.writes.fetch_add(1, Ordering::AcqRel);

        tracing::debug!(record_type = type_name, %id, "Created record");
        Ok(id)
    }

    fn partial_update(
        &self,
        record_type: &RecordType,
        id: RecordId,
        values: &FieldValues,
    ) -> Result<usize, StoreError> {
        let table = self.table(record_type.name())?;

        // Resolve every key before touching any row
        let mut updates = Vec::with_capacity(values.len());
        for (key, value) in values {
            let index =
                table
                    .record_type
                    .position(key)
                    .ok_or_else(|| StoreError::UnknownField {
                        record_type: record_type.name().to_string(),
                        field: key.clone(),
                    })?;
            self.check_relation(&table.record_type, index, value)?;
            updates.push((index, value.clone()));
        }

        let mut matched = 0;
        table.rows.rcu(|rows| {
            let mut rows = Rows::clone(rows);
            matched = 0;
            if let Some(row) = rows.get_mut(&id) {
                for (index, value) in &updates {
                    row[*index] = value.clone();
                }
                matched = 1;
            }
            rows
        });
        if matched == 1 {
            self.writes.fetch_add(1, Ordering::AcqRel);
        }

        tracing::debug!(
            record_type = record_type.name(),
            %id,
            fields = updates.len(),
            matched,
            "Applied partial update"
        );
        Ok(matched)
    }

    fn fetch_by_identifier(&self, type_name: &str, id: RecordId) -> Result<Record, StoreError> {
        let table = self.table(type_name)?;
        let row = table.row(id).ok_or_else(|| StoreError::RecordNotFound {
            record_type: type_name.to_string(),
            id: id.get(),
        })?;
        Record::from_row(Arc::clone(&table.record_type), id, row)
            .map_err(|e| StoreError::DataCorruption(e.to_string()))
    }
}
