//! Configuration for event emitters.

use serde::{Deserialize, Serialize};

/// Default per-channel listener count above which a leak warning is logged.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

/// Configuration for an [`EventEmitter`](crate::EventEmitter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Listener count per channel above which a possible-leak warning is
    /// logged.
    ///
    /// Registration is never refused. `0` disables the warning. Defaults
    /// to 10.
    pub max_listeners: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            max_listeners: DEFAULT_MAX_LISTENERS,
        }
    }
}

impl SinkConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the leak warning threshold.
    pub fn with_max_listeners(mut self, max: usize) -> Self {
        self.max_listeners = max;
        self
    }

    /// A configuration that never warns.
    pub fn unlimited() -> Self {
        Self { max_listeners: 0 }
    }

    /// Whether `count` listeners on one channel exceeds the threshold.
    pub fn exceeds(&self, count: usize) -> bool {
        self.max_listeners > 0 && count > self.max_listeners
    }
}
