//! Named-channel event emitter.
//!
//! Listeners are grouped by channel name and invoked synchronously, in
//! registration order, each time the channel is emitted. The listener list is
//! snapshotted before invocation and no internal lock is held while listeners
//! run, so a listener may register, remove or emit re-entrantly.

use std::fmt;
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use tracing::{debug, trace, warn};

use crate::config::SinkConfig;
use crate::listener::{Listener, ListenerFn, ListenerId};
use crate::sink::{DynSink, EventSink};

/// An emitter shared between its owner and any watchers publishing on it.
pub type SharedEmitter<E> = Arc<EventEmitter<E>>;

struct Registration<E> {
    id: ListenerId,
    once: bool,
    callback: ListenerFn<E>,
}

/// Publish/subscribe hub keyed by channel name.
///
/// # Example
///
/// ```
/// use propwatch_events::EventEmitter;
///
/// let emitter = EventEmitter::<String>::new();
/// emitter.on("greet", |name: &String| println!("hello {name}"));
///
/// assert_eq!(emitter.listener_count("greet"), 1);
/// assert!(emitter.emit("greet", &"world".to_string()));
/// ```
pub struct EventEmitter<E> {
    /// Listeners per channel, in invocation order.
    channels: DashMap<String, Vec<Registration<E>>>,
    /// Channels that already logged a leak warning.
    warned: DashSet<String>,
    config: SinkConfig,
}

impl<E: 'static> EventEmitter<E> {
    /// Create an emitter with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SinkConfig::default())
    }

    /// Create an emitter with the given configuration.
    pub fn with_config(config: SinkConfig) -> Self {
        Self {
            channels: DashMap::new(),
            warned: DashSet::new(),
            config,
        }
    }

    /// Create a new emitter behind an `Arc`.
    pub fn shared() -> SharedEmitter<E> {
        Arc::new(Self::new())
    }

    /// Move this emitter behind an `Arc`.
    pub fn into_shared(self) -> SharedEmitter<E> {
        Arc::new(self)
    }

    /// Move this emitter behind an `Arc` as a trait-object sink.
    pub fn into_sink(self) -> DynSink<E> {
        Arc::new(self)
    }

    /// Get the configuration.
    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// Register a listener at the end of `channel`.
    pub fn on<F>(&self, channel: impl AsRef<str>, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(channel.as_ref(), Arc::new(listener), false, false)
    }

    /// Register a listener that is removed before its first invocation.
    pub fn once<F>(&self, channel: impl AsRef<str>, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(channel.as_ref(), Arc::new(listener), true, false)
    }

    /// Register a listener at the front of `channel`.
    pub fn prepend<F>(&self, channel: impl AsRef<str>, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(channel.as_ref(), Arc::new(listener), false, true)
    }

    /// Register a trait-object listener at the end of `channel`.
    pub fn subscribe(&self, channel: impl AsRef<str>, listener: Arc<dyn Listener<E>>) -> ListenerId {
        self.register(
            channel.as_ref(),
            Arc::new(move |event: &E| listener.on_event(event)),
            false,
            false,
        )
    }

    fn register(&self, channel: &str, callback: ListenerFn<E>, once: bool, prepend: bool) -> ListenerId {
        let id = ListenerId::new();
        let registration = Registration { id, once, callback };

        let count = {
            let mut listeners = self.channels.entry(channel.to_string()).or_default();
            if prepend {
                listeners.insert(0, registration);
            } else {
                listeners.push(registration);
            }
            listeners.len()
        };

        debug!(channel, listener = %id, once, count, "Listener registered");

        if self.config.exceeds(count) && self.warned.insert(channel.to_string()) {
            warn!(
                channel,
                count,
                max_listeners = self.config.max_listeners,
                "Possible listener leak: channel exceeds max listeners"
            );
        }

        id
    }

    /// Remove a listener. Returns `true` if it was registered on `channel`.
    pub fn off(&self, channel: impl AsRef<str>, id: ListenerId) -> bool {
        let channel = channel.as_ref();

        let removed = {
            let Some(mut listeners) = self.channels.get_mut(channel) else {
                return false;
            };
            let before = listeners.len();
            listeners.retain(|r| r.id != id);
            before != listeners.len()
        };
        self.channels.remove_if(channel, |_, listeners| listeners.is_empty());

        if removed {
            debug!(channel, listener = %id, "Listener removed");
        }
        removed
    }

    /// Remove every listener on `channel`, or on all channels when `None`.
    pub fn remove_all_listeners(&self, channel: Option<&str>) {
        match channel {
            Some(channel) => {
                self.channels.remove(channel);
                self.warned.remove(channel);
                debug!(channel, "All listeners removed from channel");
            }
            None => {
                self.channels.clear();
                self.warned.clear();
                debug!("All listeners removed");
            }
        }
    }

    /// Get the number of listeners registered on `channel`.
    pub fn listener_count(&self, channel: impl AsRef<str>) -> usize {
        self.channels
            .get(channel.as_ref())
            .map(|listeners| listeners.len())
            .unwrap_or(0)
    }

    /// Check whether `channel` has at least one listener.
    pub fn has_listeners(&self, channel: impl AsRef<str>) -> bool {
        self.listener_count(channel) > 0
    }

    /// Get the IDs of the listeners on `channel`, in invocation order.
    pub fn listener_ids(&self, channel: impl AsRef<str>) -> Vec<ListenerId> {
        self.channels
            .get(channel.as_ref())
            .map(|listeners| listeners.iter().map(|r| r.id).collect())
            .unwrap_or_default()
    }

    /// Get the names of all channels with listeners, sorted.
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Invoke every listener on `channel` with `event`.
    ///
    /// Returns `true` if at least one listener ran. A panicking listener is
    /// not caught; the panic unwinds through the caller.
    pub fn emit(&self, channel: impl AsRef<str>, event: &E) -> bool {
        let channel = channel.as_ref();

        let callbacks: Vec<ListenerFn<E>> = {
            let Some(mut listeners) = self.channels.get_mut(channel) else {
                return false;
            };
            let callbacks = listeners.iter().map(|r| Arc::clone(&r.callback)).collect();
            listeners.retain(|r| !r.once);
            callbacks
        };
        self.channels.remove_if(channel, |_, listeners| listeners.is_empty());

        if callbacks.is_empty() {
            return false;
        }

        trace!(channel, listeners = callbacks.len(), "Emitting event");
        for callback in &callbacks {
            callback(event);
        }
        true
    }
}

impl<E: 'static> EventSink<E> for EventEmitter<E> {
    fn add_listener(&self, channel: &str, listener: ListenerFn<E>, once: bool) -> ListenerId {
        self.register(channel, listener, once, false)
    }

    fn remove_listener(&self, channel: &str, id: ListenerId) -> bool {
        self.off(channel, id)
    }

    fn listener_count(&self, channel: &str) -> usize {
        EventEmitter::listener_count(self, channel)
    }

    fn emit(&self, channel: &str, event: &E) -> bool {
        EventEmitter::emit(self, channel, event)
    }
}

impl<E: 'static> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut channels: Vec<(String, usize)> = self
            .channels
            .iter()
            .map(|r| (r.key().clone(), r.value().len()))
            .collect();
        channels.sort();

        f.debug_struct("EventEmitter")
            .field("channels", &channels)
            .field("config", &self.config)
            .finish()
    }
}
