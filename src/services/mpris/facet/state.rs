use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use futures::Stream;
use tokio::sync::{RwLock, mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, trace};

use crate::services::mpris::{
    contract::MprisInterface,
    types::{FacetEvent, PropertyValue},
};

/// Property cache and event channel of one facet.
///
/// Holds no bus handle, so the forwarder can update it without knowing how
/// the facet was bound. Every subscriber has its own unbounded queue, so a
/// slow consumer sees every event in order instead of losing the oldest.
#[derive(Debug)]
pub struct FacetState {
    interface: MprisInterface,
    cache: RwLock<HashMap<String, PropertyValue>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<FacetEvent>>>,
}

impl FacetState {
    /// Empty state for `interface`.
    pub fn new(interface: MprisInterface) -> Arc<Self> {
        Arc::new(Self {
            interface,
            cache: RwLock::new(HashMap::new()),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    /// Interface this state mirrors.
    pub fn interface(&self) -> MprisInterface {
        self.interface
    }

    /// Last value observed for `property`.
    pub async fn cached(&self, property: &str) -> Option<PropertyValue> {
        self.cache.read().await.get(property).cloned()
    }

    /// Copy of every cached property.
    pub async fn snapshot(&self) -> HashMap<String, PropertyValue> {
        self.cache.read().await.clone()
    }

    /// Subscribe to events emitted from now on.
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<FacetEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers().push(tx);
        rx
    }

    /// Events emitted from now on, as a stream.
    pub fn events(&self) -> impl Stream<Item = FacetEvent> + Send + use<> {
        UnboundedReceiverStream::new(self.subscribe())
    }

    /// Record a value without emitting anything.
    pub(crate) async fn store(&self, property: &str, value: PropertyValue) {
        self.cache.write().await.insert(property.to_string(), value);
    }

    /// Apply a change notification.
    ///
    /// With a value, the cache is overwritten before `<Property>Changed(new, old)`
    /// is published. Without one, only a value-less event is published.
    pub(crate) async fn apply(&self, property: &str, value: Option<PropertyValue>) {
        let event = match value {
            Some(new) => {
                let old = self
                    .cache
                    .write()
                    .await
                    .insert(property.to_string(), Arc::clone(&new));
                FacetEvent::PropertyChanged {
                    property: property.to_string(),
                    new,
                    old,
                }
            }
            None => FacetEvent::PropertyInvalidated {
                property: property.to_string(),
            },
        };

        debug!(interface = %self.interface, event = %event.name(), "property changed");
        self.publish(event);
    }

    /// Re-emit a remote signal.
    pub(crate) fn emit_signal(&self, name: &str, args: Vec<PropertyValue>) {
        trace!(interface = %self.interface, signal = name, "forwarding signal");
        self.publish(FacetEvent::Signal {
            name: name.to_string(),
            args,
        });
    }

    fn publish(&self, event: FacetEvent) {
        self.subscribers()
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<mpsc::UnboundedSender<FacetEvent>>> {
        // Senders stay valid even if a holder panicked.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
