//! Changed-value resolution and partial updates.
//!
//! A partial update writes only the fields that differ from the record's
//! baseline. Dirty columns are renamed to the store's semantic field
//! vocabulary, relation identifiers are checked against the cached related
//! record, and stale related records are re-fetched after the write.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::TrackerConfig;
use crate::error::TrackError;
use crate::hooks::{Hooks, LifecycleEvent, LifecycleHook};
use crate::record::Record;
use crate::schema::{RecordType, Registry};
use crate::snapshot;
use crate::store::RecordStore;
use crate::value::{FieldValue, FieldValues, RecordId};

/// Update payload derived from a record's changed values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resolution {
    /// Changed values keyed by semantic field name
    pub values: FieldValues,
    /// Relation names whose cached related record no longer matches its identifier
    pub reload: Vec<String>,
}

/// Returns the current values of the dirty fields, keyed by semantic name.
///
/// Values are read through the record's accessors, so relation fields
/// carry the identifier currently assigned.
pub fn changed_values(record: &Record) -> Result<FieldValues, TrackError> {
    let record_type = record.record_type();
    let dirty = snapshot::diff(record.baseline(), record)?;
    Ok(dirty
        .keys()
        .map(|column| {
            let name = record_type
                .field_by_column(column)
                .map_or_else(|| column.to_string(), |field| field.name.clone());
            let value = record.get(column).cloned().unwrap_or_default();
            (name, value)
        })
        .collect())
}

/// Dirty values keyed by storage column, the input to [`resolve_changes`].
pub(crate) fn changed_columns(record: &Record) -> Result<FieldValues, TrackError> {
    Ok(snapshot::diff(record.baseline(), record)?.into_values())
}

/// Maps column-keyed changed values onto semantic field names.
///
/// Relation columns are handled first: each is renamed to its relation
/// name and, when the new identifier differs from the one held by the
/// cached related record, queued for reload. Remaining columns stored
/// under a different name are renamed the same way. The input is left
/// untouched.
///
/// # Arguments
/// * `record` - Record the values were taken from
/// * `changed` - Changed values keyed by storage column, as reported by [`diff`](crate::snapshot::diff)
///
/// # Returns
/// `Result<Resolution, TrackError>` with the update payload and reload list.
pub fn resolve_changes(record: &Record, changed: &FieldValues) -> Result<Resolution, TrackError> {
    let record_type = record.record_type();
    let mut resolution = Resolution::default();

    for alias in record_type.relation_aliases() {
        let Some(value) = changed.get(&alias.column) else {
            continue;
        };
        if value.as_id() != record.held_related_id(&alias.name) {
            resolution.reload.push(alias.name.clone());
        }
        insert_resolved(record_type, &mut resolution.values, &alias.column, &alias.name, value)?;
    }

    for (column, value) in changed {
        let field = record_type
            .field_by_column(column)
            .ok_or_else(|| TrackError::FieldNotFound {
                record_type: record_type.name().to_string(),
                field: column.clone(),
            })?;
        if field.is_relation() {
            continue;
        }
        insert_resolved(record_type, &mut resolution.values, column, &field.name, value)?;
    }

    Ok(resolution)
}

fn insert_resolved(
    record_type: &RecordType,
    values: &mut FieldValues,
    column: &str,
    name: &str,
    value: &FieldValue,
) -> Result<(), TrackError> {
    if values.insert(name.to_string(), value.clone()).is_some() {
        return Err(TrackError::AliasCollision {
            record_type: record_type.name().to_string(),
            column: column.to_string(),
            first: name.to_string(),
            second: column.to_string(),
        });
    }
    Ok(())
}

/// Change tracker bound to a record store.
///
/// Owns the lifecycle subscribers it notifies; nothing is registered
/// globally.
#[derive(Debug)]
pub struct Tracker<S> {
    registry: Registry,
    store: S,
    hooks: Hooks,
    config: TrackerConfig,
}

impl<S: RecordStore> Tracker<S> {
    /// Creates a tracker with the default configuration.
    pub fn new(registry: Registry, store: S) -> Self {
        Self::with_config(registry, store, TrackerConfig::default())
    }

    /// Creates a tracker with an explicit configuration.
    pub fn with_config(registry: Registry, store: S, config: TrackerConfig) -> Self {
        Self {
            registry,
            store,
            hooks: Hooks::new(),
            config,
        }
    }

    /// Adds a lifecycle subscriber.
    pub fn subscribe(&mut self, hook: Arc<dyn LifecycleHook>) {
        self.hooks.subscribe(hook);
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn emit(&self, event: LifecycleEvent, record: &Record) {
        if self.config.emit_hooks {
            self.hooks.emit(event, record);
        }
    }

    /// Builds a new record of the named type and fires `Constructed`.
    pub fn new_record(&self, type_name: &str) -> Result<Record, TrackError> {
        let record = Record::new(self.registry.get(type_name)?);
        self.emit(LifecycleEvent::Constructed, &record);
        Ok(record)
    }

    /// Loads a record from the store and fires `Loaded`.
    pub fn fetch(&self, type_name: &str, id: RecordId) -> Result<Record, TrackError> {
        let record = self.store.fetch_by_identifier(type_name, id)?;
        self.emit(LifecycleEvent::Loaded, &record);
        Ok(record)
    }

    pub fn is_dirty(&self, record: &Record) -> Result<bool, TrackError> {
        snapshot::is_dirty(record)
    }

    pub fn dirty_fields(&self, record: &Record) -> Result<BTreeSet<String>, TrackError> {
        snapshot::dirty_fields(record)
    }

    pub fn changed_values(&self, record: &Record) -> Result<FieldValues, TrackError> {
        changed_values(record)
    }

    /// Persists a new record in full.
    ///
    /// # Arguments
    /// * `record` - Unsaved record; receives its identifier and a fresh baseline
    ///
    /// # Returns
    /// `Result<RecordId, TrackError>` containing the assigned identifier.
    pub fn create(&self, record: &mut Record) -> Result<RecordId, TrackError> {
        if let Some(id) = record.id() {
            return Err(TrackError::InvalidAssignment {
                record_type: record.record_type().name().to_string(),
                field: "id".to_string(),
                reason: format!("record already persisted as {}", id),
            });
        }

        self.emit(LifecycleEvent::PreUpdate, record);
        let id = self.store.create(record)?;
        record.mark_persisted(id);
        record.reset_baseline()?;

        tracing::debug!(record_type = record.record_type().name(), %id, "Created record");
        self.emit(LifecycleEvent::PostUpdate { created: true }, record);
        Ok(id)
    }

    /// Writes only the changed fields of a record back to the store.
    ///
    /// New records are created in full instead. A record with no changed
    /// fields issues no write.
    ///
    /// # Arguments
    /// * `record` - Record to persist
    ///
    /// # Returns
    /// `Ok(true)` when exactly one record was written, `Ok(false)` when
    /// nothing changed or no stored record matched.
    ///
    /// # Errors
    /// A failure to re-fetch a related record is reported after the write
    /// has been applied. The baseline is already reset at that point and
    /// `PostUpdate` is not fired.
    pub fn partial_update(&self, record: &mut Record) -> Result<bool, TrackError> {
        let Some(id) = record.id() else {
            self.create(record)?;
            return Ok(true);
        };
        let type_name = record.record_type().name().to_string();

        let changed = changed_columns(record)?;
        if changed.is_empty() {
            tracing::debug!(record_type = %type_name, %id, "No changed fields, skipping update");
            return Ok(false);
        }

        self.emit(LifecycleEvent::PreUpdate, record);

        let resolution = resolve_changes(record, &changed)?;
        tracing::debug!(
            record_type = %type_name,
            %id,
            fields = ?resolution.values.keys().collect::<Vec<_>>(),
            reload = ?resolution.reload,
            "Resolved partial update"
        );

        let updated = self
            .store
            .partial_update(record.record_type(), id, &resolution.values)?;
        if updated > 1 {
            tracing::error!(record_type = %type_name, %id, updated, "Partial update matched several records");
            return Err(TrackError::AmbiguousUpdate {
                record_type: type_name,
                id: id.get(),
                count: updated,
            });
        }
        if updated == 0 {
            tracing::warn!(record_type = %type_name, %id, "Partial update matched no record");
        }

        // Baseline tracks the write even if a refresh below fails
        record.reset_baseline()?;

        if self.config.refresh_relations {
            for name in &resolution.reload {
                self.refresh_relation(record, name)?;
            }
        }

        self.emit(LifecycleEvent::PostUpdate { created: false }, record);

        Ok(updated == 1)
    }

    /// Returns the related record for a relation, loading it when the cache is stale.
    ///
    /// # Arguments
    /// * `record` - Owning record
    /// * `name` - Semantic relation name
    ///
    /// # Returns
    /// `Ok(None)` when the identifier is null.
    pub fn resolve_related(&self, record: &Record, name: &str) -> Result<Option<Record>, TrackError> {
        let (target, id) = relation_target(record, name)?;
        let Some(id) = id else {
            return Ok(None);
        };
        if record.held_related_id(name) == Some(id) {
            return Ok(record.related(name).cloned());
        }
        self.fetch(&target, id).map(Some)
    }

    /// Re-fetches the related record matching the identifier just written.
    fn refresh_relation(&self, record: &mut Record, name: &str) -> Result<(), TrackError> {
        let (target, id) = relation_target(record, name)?;
        let related = match id {
            Some(id) => Some(self.fetch(&target, id)?),
            None => None,
        };
        tracing::debug!(relation = name, related = ?id, "Refreshed related record");
        record.cache_related(name, related);
        Ok(())
    }
}

/// Returns the target type and current identifier of a relation field.
fn relation_target(record: &Record, name: &str) -> Result<(String, Option<RecordId>), TrackError> {
    let record_type = record.record_type();
    let (_, field) = record_type.resolve_key(name)?;
    let relation = field
        .relation
        .as_ref()
        .ok_or_else(|| TrackError::InvalidAssignment {
            record_type: record_type.name().to_string(),
            field: name.to_string(),
            reason: "not a relation".to_string(),
        })?;
    let id = record.get(name).and_then(FieldValue::as_id);
    Ok((relation.target.clone(), id))
}
