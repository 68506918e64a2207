//! Propwatch Core - Property Interception
//!
//! This crate wraps key/value objects so that every property access publishes
//! an event on a named-channel sink. It includes:
//!
//! - [`Properties`]: the keyed access capability a watchable target implements
//! - [`PropertyMap`]: the stock insertion-ordered property bag
//! - [`Watched`] and [`wrap_properties`]: the interception wrapper
//! - [`PropertyEmitter`]: an object that owns its sink and watches itself
//! - [`PropertyEvent`]: the record handed to listeners
//!
//! # Quick Start
//!
//! ```
//! use propwatch_core::prelude::*;
//! use serde_json::json;
//!
//! // Watch an existing object with an external sink
//! let target: PropertyMap = PropertyMap::new();
//! let watched = wrap_properties(target, EventEmitter::new().into_sink());
//!
//! watched
//!     .sink()
//!     .on(Channel::Set, |event| println!("{} = {:?}", event.name, event.current));
//! watched.set("answer", json!(42))?;
//!
//! // Or let the object carry its own sink
//! let obj: PropertyEmitter = PropertyEmitter::default();
//! obj.sink().on(Channel::Get, |event| println!("read {}", event.name));
//! obj.get("answer");
//! # Ok::<(), PropertyError>(())
//! ```
//!
//! # Channels
//!
//! Each observed access is published on its own channel (`get`, `set`, `in`,
//! `delete`) and then on `any`. Nothing is published when neither channel has
//! a listener, for the exempt key, for a rejected write, or for a delete of a
//! key the target does not own.
//!
//! The sink is held as an [`EventSink`] trait object, so any hub implementing
//! it can replace the stock [`EventEmitter`].

pub mod config;
pub mod emitter;
pub mod error;
pub mod event;
pub mod properties;
pub mod watched;

// Re-export main types at crate root
pub use config::{DEFAULT_SINK_ATTRIBUTE, EmitterConfig};
pub use emitter::{ComputedFn, EmitterInstance, InstanceSink, PropertyEmitter, PropertyEmitterBuilder};
pub use error::{PropertyError, PropertyResult};
pub use event::{AccessKind, AccessRecord, LoggingListener, PropertyEvent, PropertySink, SharedSink};
pub use properties::{Properties, PropertyMap};
pub use propwatch_events::{Channel, EventEmitter, EventSink};
pub use watched::{Watched, wrap_properties};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```ignore
/// use propwatch_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::EmitterConfig;
    pub use crate::emitter::PropertyEmitter;
    pub use crate::error::{PropertyError, PropertyResult};
    pub use crate::event::{AccessKind, PropertyEvent, SharedSink};
    pub use crate::properties::{Properties, PropertyMap};
    pub use crate::watched::{Watched, wrap_properties};
    pub use propwatch_events::{Channel, EventEmitter, EventSink};
}
