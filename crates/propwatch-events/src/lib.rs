//! Propwatch Events
//!
//! The notification sink used by propwatch watchers:
//!
//! - [`EventEmitter`]: publish/subscribe hub keyed by channel name
//! - [`Channel`]: the well-known channels (`get`, `set`, `in`, `delete`, `any`)
//! - [`Listener`] and [`CollectingListener`]: trait-object listeners
//! - [`EventSink`]: the interface a sink implements, for swapping in another hub
//! - [`SinkConfig`]: emitter configuration
//!
//! # Example
//!
//! ```
//! use propwatch_events::{Channel, EventEmitter};
//!
//! let emitter = EventEmitter::<u32>::shared();
//! emitter.once("test", |value| assert_eq!(*value, 42));
//!
//! emitter.emit("test", &42);
//! assert_eq!(emitter.listener_count(Channel::Get), 0);
//! ```

pub mod channel;
pub mod config;
pub mod emitter;
pub mod listener;
pub mod sink;

// Re-export main types
pub use channel::Channel;
pub use config::{DEFAULT_MAX_LISTENERS, SinkConfig};
pub use emitter::{EventEmitter, SharedEmitter};
pub use listener::{CollectingListener, Listener, ListenerFn, ListenerId};
pub use sink::{DynSink, EventSink};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::channel::Channel;
    pub use crate::emitter::{EventEmitter, SharedEmitter};
    pub use crate::listener::{Listener, ListenerId};
    pub use crate::sink::{DynSink, EventSink};
}
