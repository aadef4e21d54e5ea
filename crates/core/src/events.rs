//! Publish/subscribe signal for newly recorded analysis data
//!
//! The notification carries no payload. Subscribers are expected to re-query
//! the storage manager for whatever state they care about; delivery is
//! at-least-once to every subscriber registered at publish time, with no
//! further guarantee.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Trait for components interested in new analysis data
pub trait NewDataSubscriber: Send + Sync {
    /// Called after a new result or failure has been recorded
    fn on_new_data(&self);

    /// Subscriber name for debugging
    fn name(&self) -> &str;
}

/// Publisher for the "new data available" signal
#[derive(Default)]
pub struct DataChangeNotifier {
    subscribers: RwLock<Vec<Arc<dyn NewDataSubscriber>>>,
}

impl DataChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber
    pub fn subscribe(&self, subscriber: Arc<dyn NewDataSubscriber>) {
        debug!("subscriber added: {}", subscriber.name());
        self.subscribers.write().push(subscriber);
    }

    /// Remove a subscriber by name
    pub fn unsubscribe(&self, name: &str) -> bool {
        let mut subscribers = self.subscribers.write();
        let initial_len = subscribers.len();
        subscribers.retain(|s| s.name() != name);
        let removed = subscribers.len() != initial_len;
        if removed {
            debug!("subscriber removed: {name}");
        }
        removed
    }

    /// Notify every currently registered subscriber
    pub fn publish(&self) {
        // Snapshot the list so a subscriber may re-subscribe from its handler
        // without deadlocking.
        let subscribers: Vec<_> = self.subscribers.read().iter().cloned().collect();
        for subscriber in subscribers {
            subscriber.on_new_data();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
