//! Registry of record types and relation validation.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::TrackError;

use super::record_type::RecordType;

/// Named set of record types.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    types: HashMap<String, Arc<RecordType>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a batch of types, validating relations across the batch.
    ///
    /// Types in the batch may reference each other in any order.
    ///
    /// # Arguments
    /// * `types` - Record types to register
    ///
    /// # Returns
    /// `Result<Registry, TrackError>` containing the registry or a validation error.
    pub fn from_types(types: Vec<RecordType>) -> Result<Self, TrackError> {
        let mut map = HashMap::with_capacity(types.len());
        for record_type in types {
            let name = record_type.name().to_string();
            if map.contains_key(&name) {
                return Err(TrackError::TypeAlreadyExists(name));
            }
            map.insert(name, Arc::new(record_type));
        }

        // Validate relations (after all types collected)
        for record_type in map.values() {
            validate_relations(record_type, |target| map.contains_key(target))?;
        }

        Ok(Self { types: map })
    }

    /// Registers a single type.
    ///
    /// Relation targets must already be registered or be the type itself.
    ///
    /// # Arguments
    /// * `record_type` - Record type to add
    ///
    /// # Returns
    /// `Result<Arc<RecordType>, TrackError>` containing the shared type.
    pub fn register(&mut self, record_type: RecordType) -> Result<Arc<RecordType>, TrackError> {
        if self.types.contains_key(record_type.name()) {
            return Err(TrackError::TypeAlreadyExists(record_type.name().to_string()));
        }
        validate_relations(&record_type, |target| {
            target == record_type.name() || self.types.contains_key(target)
        })?;

        let record_type = Arc::new(record_type);
        self.types
            .insert(record_type.name().to_string(), Arc::clone(&record_type));
        Ok(record_type)
    }

    /// Gets a record type by name.
    pub fn get(&self, name: &str) -> Result<Arc<RecordType>, TrackError> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| TrackError::TypeNotFound(name.to_string()))
    }

    /// Returns registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort();
        names
    }

    /// Iterates over registered types.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RecordType>> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Validates that every relation of `record_type` has a known target.
fn validate_relations(
    record_type: &RecordType,
    is_known: impl Fn(&str) -> bool,
) -> Result<(), TrackError> {
    for field in record_type.fields() {
        if let Some(relation) = &field.relation {
            if !is_known(&relation.target) {
                return Err(TrackError::UnknownRelationTarget {
                    record_type: record_type.name().to_string(),
                    field: field.name.clone(),
                    target: relation.target.clone(),
                });
            }
        }
    }
    Ok(())
}
