//! Field descriptor within a record type.

use crate::value::FieldValue;

use super::relation::Relation;

/// Field descriptor within a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Semantic field name (the update vocabulary)
    pub name: String,
    /// Storage column name (the snapshot key)
    pub column: String,
    /// Set when the field references another record type by identifier
    pub relation: Option<Relation>,
    /// Value given to the field on new records
    pub default: FieldValue,
}

impl FieldDescriptor {
    /// Creates a plain field stored under its own name.
    ///
    /// # Arguments
    /// * `name` - Semantic field name, also used as the storage column
    ///
    /// # Returns
    /// A new FieldDescriptor with a `Null` default.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
            relation: None,
            default: FieldValue::Null,
        }
    }

    /// Creates a relation field whose identifier lives in `{name}_id`.
    ///
    /// # Arguments
    /// * `name` - Semantic relation name
    /// * `target` - Name of the related record type
    pub fn relation(name: impl Into<String>, target: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            column: format!("{}_id", name),
            name,
            relation: Some(Relation::new(target)),
            default: FieldValue::Null,
        }
    }

    /// Overrides the storage column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Overrides the default value.
    pub fn with_default(mut self, default: impl Into<FieldValue>) -> Self {
        self.default = default.into();
        self
    }

    /// Returns `true` for relation fields.
    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }

    /// Returns `true` when the storage column differs from the semantic name.
    pub fn is_aliased(&self) -> bool {
        self.column != self.name
    }
}
