//! # Propwatch - Property Access Events
//!
//! Propwatch intercepts reads, writes, existence checks and deletes on a
//! key/value object and publishes an event describing each one, without
//! otherwise changing how the object behaves. It is meant for in-process
//! observation of object mutation: debugging, reactive bindings, audit logs.
//!
//! ## Quick Start
//!
//! ```
//! use propwatch::prelude::*;
//! use serde_json::json;
//!
//! // An object that carries its own sink under the "emitter" attribute
//! let obj = propwatch::create_emitter(EmitterConfig::new())?;
//! obj.sink().on(Channel::Set, |event| {
//!     assert_eq!(event.name, "testProp");
//! });
//! obj.set("testProp", json!("test"))?;
//!
//! // Or watch a plain object with an external sink
//! let target: PropertyMap = PropertyMap::new();
//! let watched = wrap_properties(target, EventEmitter::new().into_sink());
//! watched
//!     .sink()
//!     .on(Channel::Any, |event| println!("{} {}", event.kind, event.name));
//! watched.has("testProp");
//! # Ok::<(), PropertyError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               Your Application              │
//! ├─────────────────────────────────────────────┤
//! │             propwatch (facade)              │
//! ├──────────────────────┬──────────────────────┤
//! │    propwatch-core    │   propwatch-events   │
//! │  (Watched, Property- │   (EventEmitter,     │
//! │   Emitter, events)   │    channels)         │
//! └──────────────────────┴──────────────────────┘
//! ```

use serde_json::Value;
use tracing::debug;

use propwatch_core::{EmitterConfig, PropertyEmitter, PropertyResult};

// Re-export from sub-crates
pub use propwatch_core;
pub use propwatch_events;

pub use propwatch_core::{
    AccessKind, AccessRecord, EmitterInstance, InstanceSink, LoggingListener, Properties,
    PropertyError, PropertyEvent, PropertyMap, PropertySink, SharedSink, Watched,
    wrap_properties,
};
pub use propwatch_events::{
    Channel, CollectingListener, DynSink, EventEmitter, EventSink, Listener, SinkConfig,
};

/// Create an object that publishes events for accesses to its own
/// properties.
///
/// The sink is taken from `config` or created fresh, and exposed under
/// `config.sink_attribute`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
pub fn create_emitter(config: EmitterConfig<Value>) -> PropertyResult<PropertyEmitter<Value>> {
    debug!(sink_attribute = %config.sink_attribute, "Creating property emitter");
    PropertyEmitter::new(config)
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use propwatch_core::{
        AccessKind, EmitterConfig, Properties, PropertyEmitter, PropertyError, PropertyEvent,
        PropertyMap, PropertyResult, SharedSink, Watched, wrap_properties,
    };
    pub use propwatch_events::{Channel, EventEmitter, EventSink, Listener, SinkConfig};

    // Common std types
    pub use std::sync::Arc;
}
