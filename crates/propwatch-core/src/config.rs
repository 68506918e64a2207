//! Configuration for self-hosting property emitters.

use std::fmt;

use propwatch_events::SinkConfig;
use serde_json::Value;

use crate::emitter::InstanceSink;
use crate::error::{PropertyError, PropertyResult};

/// Attribute name the sink is exposed under by default.
pub const DEFAULT_SINK_ATTRIBUTE: &str = "emitter";

/// Configuration for a [`PropertyEmitter`](crate::PropertyEmitter).
pub struct EmitterConfig<V = Value> {
    /// An existing sink to publish on.
    ///
    /// When `None`, a fresh sink is created from `sink_config`.
    pub sink: Option<InstanceSink<V>>,

    /// Attribute name the sink is exposed under.
    ///
    /// Accesses to this key never publish events. Defaults to `"emitter"`.
    pub sink_attribute: String,

    /// Configuration for a freshly created sink.
    ///
    /// Ignored when `sink` is set.
    pub sink_config: SinkConfig,
}

impl<V> Default for EmitterConfig<V> {
    fn default() -> Self {
        Self {
            sink: None,
            sink_attribute: DEFAULT_SINK_ATTRIBUTE.to_string(),
            sink_config: SinkConfig::default(),
        }
    }
}

impl<V> EmitterConfig<V> {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish on an existing sink.
    pub fn with_sink(mut self, sink: InstanceSink<V>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Expose the sink under a different attribute name.
    pub fn with_sink_attribute(mut self, name: impl Into<String>) -> Self {
        self.sink_attribute = name.into();
        self
    }

    /// Configure the sink created when none is supplied.
    pub fn with_sink_config(mut self, config: SinkConfig) -> Self {
        self.sink_config = config;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink attribute name is empty.
    pub fn validate(&self) -> PropertyResult<()> {
        if self.sink_attribute.is_empty() {
            return Err(PropertyError::InvalidConfig(
                "sink attribute name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl<V> Clone for EmitterConfig<V> {
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
            sink_attribute: self.sink_attribute.clone(),
            sink_config: self.sink_config.clone(),
        }
    }
}

impl<V> fmt::Debug for EmitterConfig<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterConfig")
            .field("sink", &self.sink.as_ref().map(|_| "<supplied>"))
            .field("sink_attribute", &self.sink_attribute)
            .field("sink_config", &self.sink_config)
            .finish()
    }
}
