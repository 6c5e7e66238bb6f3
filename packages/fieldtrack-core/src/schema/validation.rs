//! Validation of field descriptor lists at definition time.

use std::collections::HashMap;

use super::field::FieldDescriptor;
use crate::error::TrackError;

/// Validates that names and columns are present and relation defaults are identifiers.
///
/// # Arguments
/// * `record_type` - Name of the type being defined
/// * `fields` - Field descriptors to validate
///
/// # Returns
/// `Result<(), TrackError>` indicating success or validation failure.
pub(crate) fn validate_names(
    record_type: &str,
    fields: &[FieldDescriptor],
) -> Result<(), TrackError> {
    if record_type.is_empty() {
        return Err(TrackError::EmptyName {
            record_type: String::new(),
            what: "type name",
        });
    }
    if fields.is_empty() {
        return Err(TrackError::NoFields(record_type.to_string()));
    }
    for field in fields {
        if field.name.is_empty() {
            return Err(TrackError::EmptyName {
                record_type: record_type.to_string(),
                what: "field name",
            });
        }
        if field.column.is_empty() {
            return Err(TrackError::EmptyName {
                record_type: record_type.to_string(),
                what: "column name",
            });
        }
        if let Some(relation) = &field.relation {
            if relation.target.is_empty() {
                return Err(TrackError::EmptyName {
                    record_type: record_type.to_string(),
                    what: "relation target",
                });
            }
            if !field.default.is_identifier() {
                return Err(TrackError::InvalidAssignment {
                    record_type: record_type.to_string(),
                    field: field.name.clone(),
                    reason: format!(
                        "relation default must be an identifier, got {}",
                        field.default.kind()
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Validates that every key resolves to exactly one field.
///
/// Semantic names must be unique, storage columns must be unique, and a
/// column may only coincide with the name of its own field. Anything else
/// would let two columns collapse onto one update key.
///
/// # Arguments
/// * `record_type` - Name of the type being defined
/// * `fields` - Field descriptors to validate
///
/// # Returns
/// `Result<(), TrackError>` indicating success or validation failure.
pub(crate) fn validate_aliases(
    record_type: &str,
    fields: &[FieldDescriptor],
) -> Result<(), TrackError> {
    let mut names: HashMap<&str, usize> = HashMap::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        if names.insert(field.name.as_str(), index).is_some() {
            return Err(TrackError::DuplicateField {
                record_type: record_type.to_string(),
                field: field.name.clone(),
            });
        }
    }

    let mut columns: HashMap<&str, usize> = HashMap::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        if let Some(previous) = columns.insert(field.column.as_str(), index) {
            return Err(TrackError::AliasCollision {
                record_type: record_type.to_string(),
                column: field.column.clone(),
                first: fields[previous].name.clone(),
                second: field.name.clone(),
            });
        }
        if let Some(&owner) = names.get(field.column.as_str()) {
            if owner != index {
                return Err(TrackError::AliasCollision {
                    record_type: record_type.to_string(),
                    column: field.column.clone(),
                    first: fields[owner].name.clone(),
                    second: field.name.clone(),
                });
            }
        }
    }

    Ok(())
}
