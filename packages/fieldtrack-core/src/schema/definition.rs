//! Schema file format for declaring record types in JSON.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::value::FieldValue;

use super::field::FieldDescriptor;
use super::record_type::RecordType;
use super::registry::Registry;

/// Only supported schema file version.
pub const SCHEMA_VERSION: u32 = 1;

/// Schema file format.
#[derive(Debug, Serialize, Deserialize)]
pub struct SchemaFile {
    /// Schema version
    pub version: u32,
    /// Record type definitions keyed by type name
    pub types: BTreeMap<String, TypeSchema>,
}

/// Record type schema.
#[derive(Debug, Serialize, Deserialize)]
pub struct TypeSchema {
    /// Field definitions in declaration order
    pub fields: Vec<FieldSchema>,
}

/// Field schema.
#[derive(Debug, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Semantic field name
    pub name: String,
    /// Storage column, when it differs from the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Target record type for relation fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    /// Default value for new records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
}

impl SchemaFile {
    /// Parses a schema file from JSON text.
    pub fn from_json(text: &str) -> Result<Self, TrackError> {
        let schema: SchemaFile =
            serde_json::from_str(text).map_err(|e| TrackError::Serialization(e.to_string()))?;
        if schema.version != SCHEMA_VERSION {
            return Err(TrackError::SchemaError(format!(
                "Unsupported schema version {} (expected {})",
                schema.version, SCHEMA_VERSION
            )));
        }
        Ok(schema)
    }

    /// Reads and parses a schema file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrackError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TrackError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Serializes the schema to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, TrackError> {
        serde_json::to_string_pretty(self).map_err(|e| TrackError::Serialization(e.to_string()))
    }

    /// Builds validated record types and registers them together.
    ///
    /// # Returns
    /// `Result<Registry, TrackError>` containing every declared type.
    pub fn into_registry(self) -> Result<Registry, TrackError> {
        let mut types = Vec::with_capacity(self.types.len());
        for (type_name, type_schema) in self.types {
            let fields = type_schema
                .fields
                .into_iter()
                .map(build_descriptor)
                .collect();
            types.push(RecordType::define(type_name, fields)?);
        }
        Registry::from_types(types)
    }
}

/// Builds a field descriptor from its schema entry.
fn build_descriptor(field_schema: FieldSchema) -> FieldDescriptor {
    let mut descriptor = match field_schema.relation {
        Some(target) => FieldDescriptor::relation(field_schema.name, target),
        None => FieldDescriptor::new(field_schema.name),
    };
    if let Some(column) = field_schema.column {
        descriptor = descriptor.with_column(column);
    }
    if let Some(default) = field_schema.default {
        descriptor = descriptor.with_default(default);
    }
    descriptor
}
