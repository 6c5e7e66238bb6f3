//! Record type definition.
//!
//! Each record type has:
//! - A fixed, ordered list of field descriptors
//! - Unique semantic names and storage columns
//! - Optional relations to other record types

use crate::error::TrackError;

use super::field::FieldDescriptor;
use super::relation::RelationAlias;
use super::validation;

/// Record type: name plus validated field descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl RecordType {
    /// Defines a new record type with the given field descriptors.
    ///
    /// # Arguments
    /// * `name` - Record type name
    /// * `fields` - Field descriptors in declaration order
    ///
    /// # Returns
    /// `Result<RecordType, TrackError>` containing the type or a configuration error.
    pub fn define(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<Self, TrackError> {
        let name = name.into();

        validation::validate_names(&name, &fields)?;

        // Every key must resolve to a single field before any record exists
        validation::validate_aliases(&name, &fields)?;

        Ok(Self { name, fields })
    }

    /// Returns the record type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field descriptors in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Returns the field descriptor with the given semantic name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the field descriptor stored under the given column.
    pub fn field_by_column(&self, column: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.column == column)
    }

    /// Returns the declaration index of the field addressed by `key`.
    ///
    /// `key` may be a semantic name or a storage column; validation at
    /// definition time guarantees at most one field matches.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name == key || f.column == key)
    }

    /// Resolves a semantic name or storage column to its descriptor.
    ///
    /// # Arguments
    /// * `key` - Semantic name or storage column
    ///
    /// # Returns
    /// `Result<(usize, &FieldDescriptor), TrackError>` with the declaration index.
    pub fn resolve_key(&self, key: &str) -> Result<(usize, &FieldDescriptor), TrackError> {
        self.position(key)
            .map(|index| (index, &self.fields[index]))
            .ok_or_else(|| TrackError::FieldNotFound {
                record_type: self.name.clone(),
                field: key.to_string(),
            })
    }

    /// Returns the identifier-column/semantic-name pairs of all relations.
    pub fn relation_aliases(&self) -> Vec<RelationAlias> {
        self.fields
            .iter()
            .filter_map(|f| {
                f.relation.as_ref().map(|relation| RelationAlias {
                    column: f.column.clone(),
                    name: f.name.clone(),
                    target: relation.target.clone(),
                })
            })
            .collect()
    }

    /// Returns `(column, name)` for plain fields stored under another name.
    pub fn column_aliases(&self) -> Vec<(&str, &str)> {
        self.fields
            .iter()
            .filter(|f| !f.is_relation() && f.is_aliased())
            .map(|f| (f.column.as_str(), f.name.as_str()))
            .collect()
    }
}
