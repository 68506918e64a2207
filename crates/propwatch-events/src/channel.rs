//! Well-known channel names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Channels published by property watchers.
///
/// The emitter accepts any string channel; this enum only names the ones the
/// property wrapper publishes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// A property was read.
    Get,
    /// A property was assigned.
    Set,
    /// A property was checked for existence.
    In,
    /// A property was deleted.
    Delete,
    /// Catch-all channel, fired after each of the above.
    Any,
}

impl Channel {
    /// All well-known channels, in publication order.
    pub const ALL: [Channel; 5] = [
        Channel::Get,
        Channel::Set,
        Channel::In,
        Channel::Delete,
        Channel::Any,
    ];

    /// Get the channel name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Get => "get",
            Channel::Set => "set",
            Channel::In => "in",
            Channel::Delete => "delete",
            Channel::Any => "any",
        }
    }

    /// Look up a well-known channel by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.as_str() == name)
    }
}

impl AsRef<str> for Channel {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
