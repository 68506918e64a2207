//! The property access abstraction and the plain-object store.
//!
//! [`Properties`] is the capability every watchable target implements: keyed
//! reads, writes, existence checks and deletes. [`PropertyMap`] is the stock
//! implementation, an insertion-ordered map with an optional prototype.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{PropertyError, PropertyResult};

/// Keyed access to a property bag.
///
/// Lookups (`get`, `has`) may consult more than the object's own keys, for
/// instance a prototype. `has_own` and `delete` only ever see own keys.
pub trait Properties: Send + Sync {
    /// The value type stored under each key.
    type Value: Clone + Send + Sync;

    /// Get the value for `key`, if any.
    fn get(&self, key: &str) -> Option<Self::Value>;

    /// Check whether `key` resolves to a property.
    fn has(&self, key: &str) -> bool;

    /// Check whether `key` is an own property.
    fn has_own(&self, key: &str) -> bool {
        self.has(key)
    }

    /// Assign `value` to `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the target rejects the write.
    fn set(&mut self, key: &str, value: Self::Value) -> PropertyResult<()>;

    /// Remove the own property `key`, returning its value.
    ///
    /// # Errors
    ///
    /// Returns an error if the target rejects the delete.
    fn delete(&mut self, key: &str) -> PropertyResult<Option<Self::Value>>;

    /// Own keys, in insertion order.
    fn keys(&self) -> Vec<String>;
}

/// An insertion-ordered property bag.
///
/// A map may have a shared prototype that `get` and `has` fall back to when
/// a key is not an own key. Writes and deletes only touch own keys. A frozen
/// map rejects both.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use propwatch_core::{Properties, PropertyMap};
/// use serde_json::json;
///
/// let proto = Arc::new(PropertyMap::new().with("kind", json!("base")));
/// let mut map = PropertyMap::new().with_prototype(proto);
///
/// assert_eq!(map.get("kind"), Some(json!("base")));
/// assert!(!map.has_own("kind"));
///
/// map.set("kind", json!("own")).unwrap();
/// assert_eq!(map.get("kind"), Some(json!("own")));
/// ```
#[derive(Debug, Clone)]
pub struct PropertyMap<V = Value> {
    entries: IndexMap<String, V>,
    prototype: Option<Arc<PropertyMap<V>>>,
    frozen: bool,
}

impl<V> Default for PropertyMap<V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            prototype: None,
            frozen: false,
        }
    }
}

impl<V> PropertyMap<V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prototype consulted for keys this map does not own.
    pub fn with_prototype(mut self, prototype: Arc<PropertyMap<V>>) -> Self {
        self.prototype = Some(prototype);
        self
    }

    /// Add an own property.
    pub fn with(mut self, key: impl Into<String>, value: V) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    /// Get the prototype, if any.
    pub fn prototype(&self) -> Option<&Arc<PropertyMap<V>>> {
        self.prototype.as_ref()
    }

    /// Make the map reject further writes and deletes.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Check whether the map is frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Number of own properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map has no own properties.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over own properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> + '_ {
        self.entries.iter()
    }

    fn lookup(&self, key: &str) -> Option<&V> {
        match self.entries.get(key) {
            Some(value) => Some(value),
            None => self.prototype.as_ref().and_then(|proto| proto.lookup(key)),
        }
    }
}

impl<V: Clone + Send + Sync> Properties for PropertyMap<V> {
    type Value = V;

    fn get(&self, key: &str) -> Option<V> {
        self.lookup(key).cloned()
    }

    fn has(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    fn has_own(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn set(&mut self, key: &str, value: V) -> PropertyResult<()> {
        if self.frozen {
            return Err(PropertyError::frozen(key));
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> PropertyResult<Option<V>> {
        if self.frozen {
            return Err(PropertyError::frozen(key));
        }
        // shift_remove keeps the remaining keys in insertion order
        Ok(self.entries.shift_remove(key))
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for PropertyMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            prototype: None,
            frozen: false,
        }
    }
}

impl From<serde_json::Map<String, Value>> for PropertyMap<Value> {
    fn from(object: serde_json::Map<String, Value>) -> Self {
        object.into_iter().collect()
    }
}
