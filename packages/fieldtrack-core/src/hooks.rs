//! Lifecycle notifications around construction, load, and update.
//!
//! Subscribers are held by the [`Tracker`](crate::reconcile::Tracker) that
//! fires them; there is no process-wide dispatch.

use std::fmt;
use std::sync::Arc;

use crate::record::Record;

/// Point in a record's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// New record built from its type defaults
    Constructed,
    /// Record loaded from the store
    Loaded,
    /// About to write changes (create or partial update)
    PreUpdate,
    /// Changes written and baseline reset
    PostUpdate { created: bool },
}

/// Subscriber to lifecycle events.
pub trait LifecycleHook: Send + Sync {
    fn on_event(&self, event: LifecycleEvent, record: &Record);
}

impl<F> LifecycleHook for F
where
    F: Fn(LifecycleEvent, &Record) + Send + Sync,
{
    fn on_event(&self, event: LifecycleEvent, record: &Record) {
        self(event, record)
    }
}

/// Ordered list of lifecycle subscribers.
#[derive(Clone, Default)]
pub struct Hooks {
    hooks: Vec<Arc<dyn LifecycleHook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber; subscribers run in subscription order.
    pub fn subscribe(&mut self, hook: Arc<dyn LifecycleHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Delivers an event to every subscriber.
    pub fn emit(&self, event: LifecycleEvent, record: &Record) {
        for hook in &self.hooks {
            hook.on_event(event, record);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("subscribers", &self.hooks.len())
            .finish()
    }
}
