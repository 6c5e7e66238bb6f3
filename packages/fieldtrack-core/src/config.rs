//! Tracker configuration.

use serde::Deserialize;

/// Tracker configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Re-fetch related objects whose identifier was written by a partial update
    pub refresh_relations: bool,
    /// Deliver lifecycle events to subscribed hooks
    pub emit_hooks: bool,
    /// Initial row-map capacity hint for in-memory tables
    pub initial_table_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            refresh_relations: true,
            emit_hooks: true,
            initial_table_capacity: 1024,
        }
    }
}

impl TrackerConfig {
    /// Parses a configuration from JSON; missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, crate::error::TrackError> {
        serde_json::from_str(text)
            .map_err(|e| crate::error::TrackError::Serialization(e.to_string()))
    }
}
