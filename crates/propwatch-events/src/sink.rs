//! The sink interface watchers publish through.
//!
//! [`EventEmitter`](crate::EventEmitter) is the stock implementation. Any
//! other hub that can register listeners per channel, count them and emit
//! synchronously can stand in for it behind a [`DynSink`].

use std::sync::Arc;

use crate::listener::{ListenerFn, ListenerId};

/// A sink shared as a trait object.
pub type DynSink<E> = Arc<dyn EventSink<E>>;

/// A named-channel publish/subscribe hub.
pub trait EventSink<E>: Send + Sync {
    /// Register `listener` at the end of `channel`.
    ///
    /// A `once` listener is removed before its first invocation.
    fn add_listener(&self, channel: &str, listener: ListenerFn<E>, once: bool) -> ListenerId;

    /// Remove a listener. Returns `true` if it was registered on `channel`.
    fn remove_listener(&self, channel: &str, id: ListenerId) -> bool;

    /// Number of listeners registered on `channel`.
    fn listener_count(&self, channel: &str) -> usize;

    /// Invoke every listener on `channel` in registration order.
    ///
    /// Returns `true` if at least one listener ran.
    fn emit(&self, channel: &str, event: &E) -> bool;

    /// Check whether `channel` has at least one listener.
    fn has_listeners(&self, channel: &str) -> bool {
        self.listener_count(channel) > 0
    }
}

impl<E: 'static> dyn EventSink<E> {
    /// Register a closure at the end of `channel`.
    pub fn on<F>(&self, channel: impl AsRef<str>, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.add_listener(channel.as_ref(), Arc::new(listener), false)
    }

    /// Register a closure that is removed before its first invocation.
    pub fn once<F>(&self, channel: impl AsRef<str>, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.add_listener(channel.as_ref(), Arc::new(listener), true)
    }

    /// Remove a listener registered with [`on`](Self::on) or
    /// [`once`](Self::once).
    pub fn off(&self, channel: impl AsRef<str>, id: ListenerId) -> bool {
        self.remove_listener(channel.as_ref(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Channel, EventEmitter};
    use parking_lot::Mutex;

    #[test]
    fn test_emitter_behind_trait_object() {
        let sink: DynSink<u32> = EventEmitter::new().into_sink();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        let id = sink.on(Channel::Set, move |value: &u32| log.lock().push(*value));
        let log = Arc::clone(&seen);
        sink.once(Channel::Set, move |value: &u32| log.lock().push(value * 10));

        assert!(sink.has_listeners("set"));
        assert_eq!(sink.listener_count("set"), 2);

        assert!(sink.emit("set", &1));
        assert!(sink.emit("set", &2));
        assert_eq!(*seen.lock(), vec![1, 10, 2]);

        assert!(sink.off(Channel::Set, id));
        assert!(!sink.has_listeners("set"));
        assert!(!sink.emit("set", &3));
    }
}
