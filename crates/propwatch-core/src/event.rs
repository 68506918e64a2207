//! Property access events.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use propwatch_events::{Channel, DynSink, EventEmitter, Listener};
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::properties::Properties;

/// The kind of property access that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    /// A read.
    Get,
    /// An assignment.
    Set,
    /// An existence check.
    In,
    /// A deletion.
    Delete,
}

impl AccessKind {
    /// Get the event type name.
    pub fn as_str(&self) -> &'static str {
        self.channel().as_str()
    }

    /// The channel events of this kind are published on, before `any`.
    pub fn channel(&self) -> Channel {
        match self {
            AccessKind::Get => Channel::Get,
            AccessKind::Set => Channel::Set,
            AccessKind::In => Channel::In,
            AccessKind::Delete => Channel::Delete,
        }
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One intercepted property access.
///
/// Built fresh for each observed operation and handed to listeners by
/// reference. `object` is the raw target; no lock on it is held while
/// listeners run.
pub struct PropertyEvent<T, V> {
    /// The target object.
    pub object: Arc<RwLock<T>>,
    /// What kind of access happened.
    pub kind: AccessKind,
    /// The accessed key.
    pub name: String,
    /// The value read (`get`) or assigned (`set`).
    pub current: Option<V>,
    /// The value before the operation (`set`, `delete`).
    pub previous: Option<V>,
    /// The membership result (`in`).
    pub present: Option<bool>,
}

impl<T, V> PropertyEvent<T, V> {
    fn new(object: Arc<RwLock<T>>, kind: AccessKind, name: &str) -> Self {
        Self {
            object,
            kind,
            name: name.to_string(),
            current: None,
            previous: None,
            present: None,
        }
    }

    pub(crate) fn get(object: Arc<RwLock<T>>, name: &str, current: Option<V>) -> Self {
        Self {
            current,
            ..Self::new(object, AccessKind::Get, name)
        }
    }

    pub(crate) fn set(object: Arc<RwLock<T>>, name: &str, current: V, previous: Option<V>) -> Self {
        Self {
            current: Some(current),
            previous,
            ..Self::new(object, AccessKind::Set, name)
        }
    }

    pub(crate) fn has(object: Arc<RwLock<T>>, name: &str, present: bool) -> Self {
        Self {
            present: Some(present),
            ..Self::new(object, AccessKind::In, name)
        }
    }

    pub(crate) fn delete(object: Arc<RwLock<T>>, name: &str, previous: Option<V>) -> Self {
        Self {
            previous,
            ..Self::new(object, AccessKind::Delete, name)
        }
    }
}

impl<T, V: Clone> PropertyEvent<T, V> {
    /// A detached, serializable copy of this event without the object.
    pub fn record(&self) -> AccessRecord<V> {
        AccessRecord {
            kind: self.kind,
            name: self.name.clone(),
            current: self.current.clone(),
            previous: self.previous.clone(),
            present: self.present,
        }
    }
}

impl<T, V: Clone> Clone for PropertyEvent<T, V> {
    fn clone(&self) -> Self {
        Self {
            object: Arc::clone(&self.object),
            kind: self.kind,
            name: self.name.clone(),
            current: self.current.clone(),
            previous: self.previous.clone(),
            present: self.present,
        }
    }
}

impl<T, V: fmt::Debug> fmt::Debug for PropertyEvent<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyEvent")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("present", &self.present)
            .finish_non_exhaustive()
    }
}

/// Serializable summary of a [`PropertyEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRecord<V> {
    /// What kind of access happened.
    #[serde(rename = "event")]
    pub kind: AccessKind,
    /// The accessed key.
    pub name: String,
    /// The value read or assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<V>,
    /// The value before the operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<V>,
    /// The membership result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present: Option<bool>,
}

/// The stock emitter for a watcher over `T`.
pub type PropertySink<T> = EventEmitter<PropertyEvent<T, <T as Properties>::Value>>;

/// The sink a watcher over `T` publishes on, shared with its owner.
///
/// Any [`EventSink`](propwatch_events::EventSink) implementation fits, not
/// only [`PropertySink`].
pub type SharedSink<T> = DynSink<PropertyEvent<T, <T as Properties>::Value>>;

/// A listener that logs property events through `tracing`.
pub struct LoggingListener {
    /// Level events are logged at.
    pub log_level: Level,
}

impl LoggingListener {
    /// Create a new logging listener.
    pub fn new() -> Self {
        Self {
            log_level: Level::DEBUG,
        }
    }

    /// Set the log level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! log_property_event {
    ($macro:ident, $event:expr) => {
        tracing::$macro!(
            event = $event.kind.as_str(),
            name = %$event.name,
            current = ?$event.current,
            previous = ?$event.previous,
            present = ?$event.present,
            "Property accessed"
        )
    };
}

impl<T, V> Listener<PropertyEvent<T, V>> for LoggingListener
where
    T: Send + Sync,
    V: fmt::Debug + Send + Sync,
{
    fn on_event(&self, event: &PropertyEvent<T, V>) {
        if self.log_level == Level::ERROR {
            log_property_event!(error, event);
        } else if self.log_level == Level::WARN {
            log_property_event!(warn, event);
        } else if self.log_level == Level::INFO {
            log_property_event!(info, event);
        } else if self.log_level == Level::DEBUG {
            log_property_event!(debug, event);
        } else {
            log_property_event!(trace, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn object() -> Arc<RwLock<()>> {
        Arc::new(RwLock::new(()))
    }

    #[test]
    fn test_access_kind_channels() {
        assert_eq!(AccessKind::Get.channel(), Channel::Get);
        assert_eq!(AccessKind::In.as_str(), "in");
        assert_eq!(AccessKind::Delete.to_string(), "delete");
    }

    #[test]
    fn test_event_fields_by_kind() {
        let get = PropertyEvent::get(object(), "a", Some(json!(1)));
        assert_eq!(get.kind, AccessKind::Get);
        assert_eq!(get.current, Some(json!(1)));
        assert_eq!(get.previous, None);

        let set = PropertyEvent::set(object(), "a", json!(2), Some(json!(1)));
        assert_eq!(set.current, Some(json!(2)));
        assert_eq!(set.previous, Some(json!(1)));

        let has = PropertyEvent::<(), Value>::has(object(), "a", false);
        assert_eq!(has.present, Some(false));
        assert_eq!(has.current, None);

        let delete = PropertyEvent::delete(object(), "a", Some(json!(2)));
        assert_eq!(delete.kind, AccessKind::Delete);
        assert_eq!(delete.previous, Some(json!(2)));
    }

    #[test]
    fn test_record_serialization() {
        let event = PropertyEvent::set(object(), "testProp", json!("test"), None);
        let record = serde_json::to_value(event.record()).unwrap();

        assert_eq!(
            record,
            json!({"event": "set", "name": "testProp", "current": "test"})
        );

        let back: AccessRecord<Value> = serde_json::from_value(record).unwrap();
        assert_eq!(back, event.record());
    }

    #[test]
    fn test_logging_listener_levels() {
        let event = PropertyEvent::<(), Value>::has(object(), "a", true);
        for level in [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE] {
            LoggingListener::new().with_level(level).on_event(&event);
        }
    }
}
