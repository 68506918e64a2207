//! Listener types.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier returned when a listener is registered.
///
/// Pass it to [`EventEmitter::off`](crate::EventEmitter::off) to remove the
/// listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Create a new random listener ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback type stored by the emitter.
pub type ListenerFn<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// A listener implemented as a type rather than a closure.
///
/// Register one with [`EventEmitter::subscribe`](crate::EventEmitter::subscribe).
pub trait Listener<E>: Send + Sync {
    /// Called synchronously each time the channel fires.
    fn on_event(&self, event: &E);
}

/// A listener that collects events for later inspection.
pub struct CollectingListener<E> {
    events: RwLock<Vec<(Instant, E)>>,
    max_events: usize,
}

impl<E: Clone> CollectingListener<E> {
    /// Create a collector that keeps at most `max_events` events.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events,
        }
    }

    /// Get collected events with their arrival time.
    pub fn events(&self) -> Vec<(Instant, E)> {
        self.events.read().clone()
    }

    /// Get collected events without timestamps.
    pub fn payloads(&self) -> Vec<E> {
        self.events.read().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Clear collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Get event count.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl<E: Clone + Send + Sync> Listener<E> for CollectingListener<E> {
    fn on_event(&self, event: &E) {
        let mut events = self.events.write();
        if events.len() < self.max_events {
            events.push((Instant::now(), event.clone()));
        }
    }
}

impl<E> fmt::Debug for CollectingListener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectingListener")
            .field("len", &self.events.read().len())
            .field("max_events", &self.max_events)
            .finish()
    }
}
