//! The interception wrapper.
//!
//! [`Watched`] forwards every operation to its target and publishes a
//! [`PropertyEvent`] for each read, write, existence check and delete. An
//! event is only built when the operation's channel or `any` has a listener
//! and the key is not the exempt key, so an unobserved watcher costs no more
//! than a lock and a listener-count lookup.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use propwatch_events::Channel;
use tracing::trace;

use crate::error::PropertyResult;
use crate::event::{AccessKind, PropertyEvent, SharedSink};
use crate::properties::Properties;

/// A handle that publishes an event for each property access on its target.
///
/// Cloning a `Watched` clones the handle; both clones share the target and
/// the sink. No lock on the target is held while listeners run, so listeners
/// may read or write through the wrapper or through `event.object`.
///
/// # Example
///
/// ```
/// use propwatch_core::{PropertyMap, wrap_properties};
/// use propwatch_events::EventEmitter;
/// use serde_json::json;
///
/// let target: PropertyMap = PropertyMap::new();
/// let watched = wrap_properties(target, EventEmitter::new().into_sink());
///
/// watched.sink().on("set", |event| assert_eq!(event.name, "testProp"));
/// watched.set("testProp", json!("test")).unwrap();
/// ```
pub struct Watched<T: Properties> {
    target: Arc<RwLock<T>>,
    sink: SharedSink<T>,
    exempt: Option<Arc<str>>,
}

/// Wrap `target` so that every property access on it publishes on `sink`.
///
/// The target is moved behind a fresh shared handle; use
/// [`Watched::from_shared`] to keep a direct reference to it. The target
/// carries no reference to the sink.
pub fn wrap_properties<T: Properties + 'static>(target: T, sink: SharedSink<T>) -> Watched<T> {
    Watched::new(target, sink)
}

impl<T: Properties + 'static> Watched<T> {
    /// Wrap an owned target.
    pub fn new(target: T, sink: SharedSink<T>) -> Self {
        Self::from_shared(Arc::new(RwLock::new(target)), sink)
    }

    /// Wrap a target the caller keeps its own handle to.
    pub fn from_shared(target: Arc<RwLock<T>>, sink: SharedSink<T>) -> Self {
        Self {
            target,
            sink,
            exempt: None,
        }
    }

    /// Exclude `key` from publishing events.
    pub fn with_exempt_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.exempt = Some(key.into());
        self
    }

    /// The raw target, bypassing instrumentation.
    pub fn target(&self) -> &Arc<RwLock<T>> {
        &self.target
    }

    /// The sink events are published on.
    pub fn sink(&self) -> &SharedSink<T> {
        &self.sink
    }

    /// The key excluded from publishing, if any.
    pub fn exempt_key(&self) -> Option<&str> {
        self.exempt.as_deref()
    }

    /// Read `key`, publishing a `get` event when observed.
    pub fn get(&self, key: &str) -> Option<T::Value> {
        let current = self.target.read().get(key);

        if self.observed(AccessKind::Get, key) {
            self.publish(PropertyEvent::get(
                Arc::clone(&self.target),
                key,
                current.clone(),
            ));
        }

        current
    }

    /// Assign `value` to `key`, publishing a `set` event when observed.
    ///
    /// The write completes before listeners run, so they see the new value.
    ///
    /// # Errors
    ///
    /// Returns the target's error if it rejects the write; nothing is
    /// published in that case.
    pub fn set(&self, key: &str, value: T::Value) -> PropertyResult<()> {
        if !self.observed(AccessKind::Set, key) {
            return self.target.write().set(key, value);
        }

        let previous = {
            let mut target = self.target.write();
            let previous = target.get(key);
            target.set(key, value.clone())?;
            previous
        };

        self.publish(PropertyEvent::set(
            Arc::clone(&self.target),
            key,
            value,
            previous,
        ));
        Ok(())
    }

    /// Check whether `key` resolves on the target, publishing an `in` event
    /// when observed.
    pub fn has(&self, key: &str) -> bool {
        let present = self.target.read().has(key);

        if self.observed(AccessKind::In, key) {
            self.publish(PropertyEvent::has(Arc::clone(&self.target), key, present));
        }

        present
    }

    /// Delete the own property `key`, publishing a `delete` event when
    /// observed.
    ///
    /// Deleting a key the target does not own is a no-op that publishes
    /// nothing and returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns the target's error if it rejects the delete.
    pub fn delete(&self, key: &str) -> PropertyResult<bool> {
        let previous = {
            let mut target = self.target.write();
            if !target.has_own(key) {
                return Ok(false);
            }
            target.delete(key)?
        };

        if self.observed(AccessKind::Delete, key) {
            self.publish(PropertyEvent::delete(
                Arc::clone(&self.target),
                key,
                previous,
            ));
        }

        Ok(true)
    }

    /// Own keys of the target. Not instrumented.
    pub fn keys(&self) -> Vec<String> {
        self.target.read().keys()
    }

    /// Number of own keys. Not instrumented.
    pub fn len(&self) -> usize {
        self.target.read().keys().len()
    }

    /// Check if the target has no own keys. Not instrumented.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn observed(&self, kind: AccessKind, key: &str) -> bool {
        if self.exempt.as_deref() == Some(key) {
            return false;
        }
        self.sink.has_listeners(kind.channel().as_str())
            || self.sink.has_listeners(Channel::Any.as_str())
    }

    fn publish(&self, event: PropertyEvent<T, T::Value>) {
        trace!(event = event.kind.as_str(), name = %event.name, "Publishing property event");
        self.sink.emit(event.kind.channel().as_str(), &event);
        self.sink.emit(Channel::Any.as_str(), &event);
    }
}

impl<T: Properties> Clone for Watched<T> {
    fn clone(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
            sink: Arc::clone(&self.sink),
            exempt: self.exempt.clone(),
        }
    }
}

impl<T: Properties> fmt::Debug for Watched<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watched")
            .field("keys", &self.target.read().keys())
            .field("exempt", &self.exempt)
            .finish()
    }
}
