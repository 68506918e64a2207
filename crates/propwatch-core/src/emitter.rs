//! Self-hosting property emitters.
//!
//! A [`PropertyEmitter`] owns its sink, exposes it under a configurable
//! attribute name, and is only ever handed out as the interception wrapper
//! around its own instance. Accesses to the sink attribute never publish.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use indexmap::IndexMap;
use propwatch_events::{DynSink, EventEmitter, SinkConfig};
use serde_json::Value;
use tracing::debug;

use crate::config::EmitterConfig;
use crate::error::{PropertyError, PropertyResult};
use crate::event::PropertyEvent;
use crate::properties::{Properties, PropertyMap};
use crate::watched::Watched;

/// The sink of a [`PropertyEmitter`] with values of type `V`.
pub type InstanceSink<V> = DynSink<PropertyEvent<EmitterInstance<V>, V>>;

/// A computed property: derives a value from the stored fields.
pub type ComputedFn<V> = Arc<dyn Fn(&PropertyMap<V>) -> V + Send + Sync>;

/// The instance a [`PropertyEmitter`] wraps.
///
/// Holds the sink under its attribute name, the computed properties, and the
/// stored fields. The sink attribute and computed properties are members
/// that cannot be assigned or deleted.
pub struct EmitterInstance<V = Value> {
    sink_attribute: Arc<str>,
    sink: InstanceSink<V>,
    computed: IndexMap<String, ComputedFn<V>>,
    fields: PropertyMap<V>,
}

impl<V> EmitterInstance<V> {
    /// Attribute name the sink is stored under.
    pub fn sink_attribute(&self) -> &str {
        &self.sink_attribute
    }

    /// The sink stored on this instance.
    pub fn sink(&self) -> &InstanceSink<V> {
        &self.sink
    }

    /// The stored fields, without computed properties.
    pub fn fields(&self) -> &PropertyMap<V> {
        &self.fields
    }

    fn is_sink_attribute(&self, key: &str) -> bool {
        *self.sink_attribute == *key
    }

    fn is_read_only(&self, key: &str) -> bool {
        self.is_sink_attribute(key) || self.computed.contains_key(key)
    }
}

/// The sink attribute is a member without a plain value: `get` yields
/// `None` while `has` is true and `keys` lists it.
impl<V: Clone + Send + Sync + 'static> Properties for EmitterInstance<V> {
    type Value = V;

    fn get(&self, key: &str) -> Option<V> {
        if self.is_sink_attribute(key) {
            return None;
        }
        match self.computed.get(key) {
            Some(getter) => Some(getter(&self.fields)),
            None => self.fields.get(key),
        }
    }

    fn has(&self, key: &str) -> bool {
        self.is_read_only(key) || self.fields.has(key)
    }

    fn has_own(&self, key: &str) -> bool {
        self.is_read_only(key) || self.fields.has_own(key)
    }

    fn set(&mut self, key: &str, value: V) -> PropertyResult<()> {
        if self.is_read_only(key) {
            return Err(PropertyError::read_only(key));
        }
        self.fields.set(key, value)
    }

    fn delete(&mut self, key: &str) -> PropertyResult<Option<V>> {
        if self.is_read_only(key) {
            return Err(PropertyError::read_only(key));
        }
        self.fields.delete(key)
    }

    fn keys(&self) -> Vec<String> {
        std::iter::once(self.sink_attribute.to_string())
            .chain(self.computed.keys().cloned())
            .chain(self.fields.keys())
            .collect()
    }
}

/// An object that publishes events for accesses to its own properties.
///
/// Built by [`PropertyEmitter::new`] or [`PropertyEmitter::builder`], it
/// dereferences to the [`Watched`] wrapper around its instance, so `get`,
/// `set`, `has` and `delete` are called on it directly.
///
/// # Example
///
/// ```
/// use propwatch_core::{Channel, PropertyEmitter};
/// use serde_json::json;
///
/// let obj: PropertyEmitter = PropertyEmitter::default();
/// obj.sink().on(Channel::Set, |event| {
///     assert_eq!(event.name, "testProp");
///     assert_eq!(event.current, Some(json!("test")));
/// });
///
/// obj.set("testProp", json!("test")).unwrap();
/// ```
pub struct PropertyEmitter<V = Value>
where
    V: Clone + Send + Sync + 'static,
{
    watched: Watched<EmitterInstance<V>>,
    sink_attribute: Arc<str>,
}

impl<V: Clone + Send + Sync + 'static> PropertyEmitter<V> {
    /// Create an emitter from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: EmitterConfig<V>) -> PropertyResult<Self> {
        PropertyEmitterBuilder::from_config(config).build()
    }

    /// Create a builder.
    pub fn builder() -> PropertyEmitterBuilder<V> {
        PropertyEmitterBuilder::new()
    }

    /// The sink this emitter publishes on.
    pub fn sink(&self) -> &InstanceSink<V> {
        self.watched.sink()
    }

    /// Attribute name the sink is exposed under.
    pub fn sink_attribute(&self) -> &str {
        &self.sink_attribute
    }

    /// Look the sink up by attribute name. Never publishes.
    ///
    /// The sink is not a value of type `V`, so reading the attribute through
    /// [`get`](Watched::get) returns `None` even though
    /// [`has`](Watched::has) reports it and [`keys`](Watched::keys) lists it.
    /// This is the by-name accessor for it.
    pub fn attribute_sink(&self, name: &str) -> Option<InstanceSink<V>> {
        (*self.sink_attribute == *name).then(|| Arc::clone(self.target().read().sink()))
    }
}

impl<V: Clone + Send + Sync + 'static> Default for PropertyEmitter<V> {
    fn default() -> Self {
        PropertyEmitterBuilder::new().assemble()
    }
}

impl<V: Clone + Send + Sync + 'static> Deref for PropertyEmitter<V> {
    type Target = Watched<EmitterInstance<V>>;

    fn deref(&self) -> &Self::Target {
        &self.watched
    }
}

impl<V: Clone + Send + Sync + 'static> Clone for PropertyEmitter<V> {
    fn clone(&self) -> Self {
        Self {
            watched: self.watched.clone(),
            sink_attribute: Arc::clone(&self.sink_attribute),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> fmt::Debug for PropertyEmitter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyEmitter")
            .field("sink_attribute", &self.sink_attribute)
            .field("keys", &self.watched.keys())
            .finish()
    }
}

/// Builder for [`PropertyEmitter`].
pub struct PropertyEmitterBuilder<V = Value> {
    config: EmitterConfig<V>,
    computed: IndexMap<String, ComputedFn<V>>,
    fields: PropertyMap<V>,
}

impl<V: Clone + Send + Sync + 'static> PropertyEmitterBuilder<V> {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::from_config(EmitterConfig::default())
    }

    /// Create a builder from an existing configuration.
    pub fn from_config(config: EmitterConfig<V>) -> Self {
        Self {
            config,
            computed: IndexMap::new(),
            fields: PropertyMap::new(),
        }
    }

    /// Publish on an existing sink.
    pub fn with_sink(mut self, sink: InstanceSink<V>) -> Self {
        self.config = self.config.with_sink(sink);
        self
    }

    /// Expose the sink under a different attribute name.
    pub fn with_sink_attribute(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.with_sink_attribute(name);
        self
    }

    /// Configure the sink created when none is supplied.
    pub fn with_sink_config(mut self, config: SinkConfig) -> Self {
        self.config = self.config.with_sink_config(config);
        self
    }

    /// Add a computed, read-only property.
    ///
    /// Reads of it publish `get` events like any stored value.
    pub fn with_computed<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&PropertyMap<V>) -> V + Send + Sync + 'static,
    {
        self.computed.insert(name.into(), Arc::new(getter));
        self
    }

    /// Add an initial stored field. Publishes nothing.
    pub fn with_field(mut self, name: impl Into<String>, value: V) -> Self {
        self.fields = self.fields.with(name, value);
        self
    }

    /// Build the emitter.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, or if a field or
    /// computed property uses the sink attribute name.
    pub fn build(self) -> PropertyResult<PropertyEmitter<V>> {
        self.config.validate()?;

        let attribute = self.config.sink_attribute.as_str();
        if self.computed.contains_key(attribute) || self.fields.has_own(attribute) {
            return Err(PropertyError::InvalidConfig(format!(
                "'{attribute}' is reserved for the sink"
            )));
        }

        Ok(self.assemble())
    }

    fn assemble(self) -> PropertyEmitter<V> {
        let EmitterConfig {
            sink,
            sink_attribute,
            sink_config,
        } = self.config;

        let sink = sink.unwrap_or_else(|| EventEmitter::with_config(sink_config).into_sink());
        let sink_attribute: Arc<str> = sink_attribute.into();

        debug!(
            sink_attribute = %sink_attribute,
            computed = self.computed.len(),
            fields = self.fields.len(),
            "Property emitter created"
        );

        let instance = EmitterInstance {
            sink_attribute: Arc::clone(&sink_attribute),
            sink: Arc::clone(&sink),
            computed: self.computed,
            fields: self.fields,
        };

        PropertyEmitter {
            watched: Watched::new(instance, sink).with_exempt_key(Arc::clone(&sink_attribute)),
            sink_attribute,
        }
    }
}

impl<V: Clone + Send + Sync + 'static> Default for PropertyEmitterBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use propwatch_events::{Channel, EventSink, ListenerFn, ListenerId};
    use serde_json::json;

    type Event = PropertyEvent<EmitterInstance<Value>, Value>;

    /// An emitter with a computed `prop`, like a subclass adding a getter.
    fn test_class() -> PropertyEmitter {
        PropertyEmitter::builder()
            .with_computed("prop", |_| json!("test"))
            .build()
            .unwrap()
    }

    fn record(emitter: &PropertyEmitter, channel: Channel) -> Arc<Mutex<Vec<Event>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&events);
        emitter.sink().on(channel, move |event: &Event| log.lock().push(event.clone()));
        events
    }

    #[test]
    fn test_instantiate() {
        let obj: PropertyEmitter = PropertyEmitter::default();
        assert_eq!(obj.sink_attribute(), "emitter");
        assert!(obj.attribute_sink("emitter").is_some());
        assert!(obj.has("emitter"));
        assert_eq!(obj.keys(), vec!["emitter"]);
    }

    #[test]
    fn test_new_from_config() {
        let obj: PropertyEmitter = PropertyEmitter::new(EmitterConfig::new()).unwrap();
        assert_eq!(obj.exempt_key(), Some("emitter"));
    }

    #[test]
    fn test_computed_property() {
        let obj = test_class();
        assert_eq!(obj.get("prop"), Some(json!("test")));
        assert!(obj.has("prop"));
        assert_eq!(obj.sink().listener_count(Channel::Get.as_str()), 0);
    }

    #[test]
    fn test_computed_reads_fields() {
        let obj: PropertyEmitter = PropertyEmitter::builder()
            .with_field("first", json!("Ada"))
            .with_computed("greeting", |fields| {
                let first = fields
                    .get("first")
                    .and_then(|v| v.as_str().map(str::to_owned))
                    .unwrap_or_default();
                json!(format!("hello {first}"))
            })
            .build()
            .unwrap();

        let gets = record(&obj, Channel::Get);
        obj.set("first", json!("Grace")).unwrap();

        assert_eq!(obj.get("greeting"), Some(json!("hello Grace")));
        assert_eq!(gets.lock().len(), 1);
    }

    #[test]
    fn test_still_a_standard_emitter() {
        let obj: PropertyEmitter = PropertyEmitter::default();
        let fired = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&fired);
        obj.sink().once("test", move |_: &Event| *flag.lock() = true);

        let event = PropertyEvent::get(Arc::clone(obj.target()), "test", None);
        assert!(obj.sink().emit("test", &event));
        assert!(*fired.lock());
    }

    #[test]
    fn test_custom_sink_attribute() {
        let obj: PropertyEmitter = PropertyEmitter::builder()
            .with_sink_attribute("myEmitter")
            .build()
            .unwrap();

        assert_eq!(obj.sink_attribute(), "myEmitter");
        assert!(obj.attribute_sink("myEmitter").is_some());
        assert!(obj.attribute_sink("emitter").is_none());
        assert!(obj.has("myEmitter"));
        assert!(!obj.has("emitter"));
    }

    #[test]
    fn test_custom_sink() {
        let sink = EventEmitter::<Event>::with_config(SinkConfig::unlimited()).into_shared();
        let obj: PropertyEmitter =
            PropertyEmitter::new(EmitterConfig::<Value>::new().with_sink(sink.clone())).unwrap();

        let sets = record(&obj, Channel::Set);
        obj.set("a", json!(1)).unwrap();
        assert_eq!(sink.listener_count(Channel::Set), 1);
        assert_eq!(sink.config().max_listeners, 0);
        assert_eq!(sets.lock().len(), 1);
    }

    /// A second sink implementation: one flat listener list, recording every
    /// channel it is asked to emit.
    #[derive(Default)]
    struct FlatSink {
        listeners: Mutex<Vec<(String, ListenerId, bool, ListenerFn<Event>)>>,
        emitted: Mutex<Vec<String>>,
    }

    impl EventSink<Event> for FlatSink {
        fn add_listener(&self, channel: &str, listener: ListenerFn<Event>, once: bool) -> ListenerId {
            let id = ListenerId::new();
            self.listeners
                .lock()
                .push((channel.to_string(), id, once, listener));
            id
        }

        fn remove_listener(&self, channel: &str, id: ListenerId) -> bool {
            let mut listeners = self.listeners.lock();
            let before = listeners.len();
            listeners.retain(|(c, i, _, _)| !(c == channel && *i == id));
            before != listeners.len()
        }

        fn listener_count(&self, channel: &str) -> usize {
            self.listeners
                .lock()
                .iter()
                .filter(|(c, ..)| c == channel)
                .count()
        }

        fn emit(&self, channel: &str, event: &Event) -> bool {
            self.emitted.lock().push(channel.to_string());
            let callbacks: Vec<ListenerFn<Event>> = {
                let mut listeners = self.listeners.lock();
                let callbacks = listeners
                    .iter()
                    .filter(|(c, ..)| c == channel)
                    .map(|(.., callback)| Arc::clone(callback))
                    .collect();
                listeners.retain(|(c, _, once, _)| !(c == channel && *once));
                callbacks
            };
            for callback in &callbacks {
                callback(event);
            }
            !callbacks.is_empty()
        }
    }

    #[test]
    fn test_custom_sink_implementation() {
        let sink = Arc::new(FlatSink::default());
        let obj: PropertyEmitter = PropertyEmitter::new(
            EmitterConfig::<Value>::new().with_sink(sink.clone() as InstanceSink<Value>),
        )
        .unwrap();

        let sets = record(&obj, Channel::Set);
        let fired = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&fired);
        obj.sink().once(Channel::Delete, move |_: &Event| *counter.lock() += 1);

        obj.set("a", json!(1)).unwrap();
        obj.get("a");
        obj.delete("a").unwrap();
        obj.set("emitter", json!(1)).unwrap_err();

        assert_eq!(sets.lock().len(), 1);
        assert_eq!(*fired.lock(), 1);
        assert_eq!(sink.listener_count("delete"), 0);
        assert_eq!(*sink.emitted.lock(), vec!["set", "any", "delete", "any"]);
        assert!(obj.attribute_sink("emitter").is_some());
    }

    #[test]
    fn test_instance_holds_its_sink() {
        let obj: PropertyEmitter = PropertyEmitter::default();
        record(&obj, Channel::Get);

        let instance = obj.target().read();
        assert_eq!(instance.sink_attribute(), "emitter");
        assert_eq!(instance.sink().listener_count("get"), 1);
        assert_eq!(instance.get("emitter"), None);
        assert!(instance.has_own("emitter"));
    }

    #[test]
    fn test_get_event() {
        let obj = test_class();
        let gets = record(&obj, Channel::Get);

        obj.get("prop");

        let events = gets.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind.as_str(), "get");
        assert_eq!(events[0].name, "prop");
        assert_eq!(events[0].current, Some(json!("test")));
        assert_eq!(events[0].previous, None);
    }

    #[test]
    fn test_set_event() {
        let obj: PropertyEmitter = PropertyEmitter::default();
        let seen = Arc::new(Mutex::new(None));

        let reader = obj.clone();
        let log = Arc::clone(&seen);
        obj.sink().once(Channel::Set, move |event: &Event| {
            assert_eq!(event.kind.as_str(), "set");
            assert_eq!(event.name, "testProp");
            assert_eq!(event.current, Some(json!("test")));
            *log.lock() = reader.get("testProp");
        });

        obj.set("testProp", json!("test")).unwrap();
        assert_eq!(*seen.lock(), Some(json!("test")));
    }

    #[test]
    fn test_delete_event() {
        let obj: PropertyEmitter = PropertyEmitter::default();
        let deletes = record(&obj, Channel::Delete);

        obj.set("testProp", json!("test")).unwrap();
        assert!(obj.delete("testProp").unwrap());

        let events = deletes.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "testProp");
        assert_eq!(events[0].previous, Some(json!("test")));
        assert_eq!(obj.get("testProp"), None);
    }

    #[test]
    fn test_delete_nonexistent_property() {
        let obj: PropertyEmitter = PropertyEmitter::default();
        let deletes = record(&obj, Channel::Delete);
        let any = record(&obj, Channel::Any);

        assert!(!obj.delete("testProp").unwrap());
        assert!(deletes.lock().is_empty());
        assert!(any.lock().is_empty());
    }

    #[test]
    fn test_in_event() {
        let obj: PropertyEmitter = PropertyEmitter::default();
        let checks = record(&obj, Channel::In);

        assert!(!obj.has("test"));

        let events = checks.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind.as_str(), "in");
        assert_eq!(events[0].name, "test");
        assert_eq!(events[0].present, Some(false));
    }

    #[test]
    fn test_without_listeners() {
        let obj = test_class();

        assert_eq!(obj.get("prop"), Some(json!("test")));
        obj.set("testProp", json!("test")).unwrap();
        assert_eq!(obj.get("testProp"), Some(json!("test")));
        assert!(obj.delete("testProp").unwrap());
        assert_eq!(obj.get("testProp"), None);
        assert!(!obj.has("test"));

        for channel in Channel::ALL {
            assert_eq!(obj.sink().listener_count(channel.as_str()), 0);
        }
    }

    #[test]
    fn test_sink_attribute_never_publishes() {
        let obj = test_class();
        let mut logs = Vec::new();
        for _ in 0..3 {
            logs.push(record(&obj, Channel::Get));
        }
        let any = record(&obj, Channel::Any);

        assert_eq!(obj.get("emitter"), None);
        assert!(obj.attribute_sink("emitter").is_some());
        assert!(obj.has("emitter"));
        assert_eq!(
            obj.set("emitter", json!(1)),
            Err(PropertyError::read_only("emitter"))
        );
        assert_eq!(
            obj.delete("emitter"),
            Err(PropertyError::read_only("emitter"))
        );

        for log in &logs {
            assert!(log.lock().is_empty());
        }
        assert!(any.lock().is_empty());
    }

    #[test]
    fn test_computed_property_is_read_only() {
        let obj = test_class();
        let sets = record(&obj, Channel::Set);

        assert_eq!(
            obj.set("prop", json!("other")),
            Err(PropertyError::read_only("prop"))
        );
        assert_eq!(obj.delete("prop"), Err(PropertyError::read_only("prop")));
        assert!(sets.lock().is_empty());
        assert_eq!(obj.get("prop"), Some(json!("test")));
    }

    #[test]
    fn test_initial_fields_publish_nothing() {
        let obj: PropertyEmitter = PropertyEmitter::builder()
            .with_field("a", json!(1))
            .with_field("b", json!(2))
            .build()
            .unwrap();

        assert_eq!(obj.keys(), vec!["emitter", "a", "b"]);
        assert_eq!(obj.target().read().fields().len(), 2);
    }

    #[test]
    fn test_reserved_attribute_rejected() {
        let result: PropertyResult<PropertyEmitter> = PropertyEmitter::builder()
            .with_field("emitter", json!(1))
            .build();
        assert!(matches!(result, Err(PropertyError::InvalidConfig(_))));

        let result: PropertyResult<PropertyEmitter> = PropertyEmitter::builder()
            .with_sink_attribute("")
            .build();
        assert!(matches!(result, Err(PropertyError::InvalidConfig(_))));
    }
}
