//! Record type schema, field descriptors, and relation aliasing.

mod definition;
mod field;
mod record_type;
mod registry;
mod relation;
pub(crate) mod validation;

pub use definition::{FieldSchema, SchemaFile, TypeSchema, SCHEMA_VERSION};
pub use field::FieldDescriptor;
pub use record_type::RecordType;
pub use registry::Registry;
pub use relation::{Relation, RelationAlias};
