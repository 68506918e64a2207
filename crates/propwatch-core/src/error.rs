//! Error types for property access.
//!
//! Instrumented operations never fail on their own. These errors come from
//! the target rejecting an operation and reach the caller unchanged.

use thiserror::Error;

/// Errors raised by a property target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    /// The target is frozen and rejects writes and deletes.
    #[error("Cannot modify property '{key}': object is frozen")]
    Frozen {
        /// The key that was written or deleted.
        key: String,
    },

    /// The property cannot be assigned or deleted.
    #[error("Property '{key}' is read-only")]
    ReadOnly {
        /// The key that was written or deleted.
        key: String,
    },

    /// Invalid emitter configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PropertyError {
    /// Create a frozen-target error.
    pub fn frozen(key: impl Into<String>) -> Self {
        Self::Frozen { key: key.into() }
    }

    /// Create a read-only property error.
    pub fn read_only(key: impl Into<String>) -> Self {
        Self::ReadOnly { key: key.into() }
    }
}

/// Result type alias for property operations.
pub type PropertyResult<T> = std::result::Result<T, PropertyError>;
