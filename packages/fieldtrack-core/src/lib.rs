//! Field-level change tracking for persisted records.
//!
//! Provides record-type descriptors, snapshot-based dirty tracking,
//! partial updates with relation reconciliation, lifecycle hooks,
//! and an in-memory record store.

pub mod config;
pub mod error;
pub mod hooks;
pub mod reconcile;
pub mod record;
pub mod schema;
pub mod snapshot;
pub mod store;
pub mod value;

pub use config::TrackerConfig;
pub use error::{StoreError, TrackError};
pub use hooks::{Hooks, LifecycleEvent, LifecycleHook};
pub use reconcile::{changed_values, resolve_changes, Resolution, Tracker};
pub use record::Record;
pub use schema::{FieldDescriptor, RecordType, Registry, Relation, RelationAlias};
pub use snapshot::{capture_snapshot, diff, dirty_fields, is_dirty, DirtySet, Snapshot};
pub use store::{MemoryStore, RecordStore};
pub use value::{FieldValue, FieldValues, RecordId};
