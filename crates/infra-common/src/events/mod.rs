//! Typed event notification
//!
//! Every observable entity in the workspace (identities, endpoints, media
//! instances) composes a [`Notifier`] per event type instead of carrying an
//! ad hoc publish/subscribe surface. Subscriptions are explicit and return a
//! [`SubscriptionId`] that can be used to unsubscribe; [`Notifier::subscribe_once`]
//! registers a callback that is dropped after its first delivery, which is
//! what auto-cleanup listeners (call hangup, stream ended) rely on.
//!
//! # Usage
//!
//! ```rust
//! use peerlink_infra_common::events::Notifier;
//!
//! let notifier: Notifier<String> = Notifier::new();
//! let id = notifier.subscribe(|msg| println!("got: {msg}"));
//! notifier.emit(&"hello".to_string());
//! notifier.unsubscribe(id);
//! assert_eq!(notifier.subscriber_count(), 0);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Handle identifying one subscription on a [`Notifier`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber<E> {
    id: SubscriptionId,
    once: bool,
    callback: Arc<dyn Fn(&E) + Send + Sync>,
}

/// A typed publish/subscribe channel for one event type
///
/// Callbacks run synchronously on the emitting thread, outside the internal
/// lock, so a callback may subscribe or unsubscribe without deadlocking.
/// Delivery order follows subscription order.
pub struct Notifier<E> {
    subscribers: Mutex<Vec<Subscriber<E>>>,
    next_id: AtomicU64,
}

impl<E> Notifier<E> {
    /// Create an empty notifier
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn register(&self, once: bool, callback: Arc<dyn Fn(&E) + Send + Sync>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push(Subscriber { id, once, callback });
        id
    }

    /// Subscribe to every future emission
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(false, Arc::new(callback))
    }

    /// Subscribe for at most one emission
    ///
    /// The subscription is removed before the callback runs, so re-entrant
    /// emissions cannot deliver twice.
    pub fn subscribe_once<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(true, Arc::new(callback))
    }

    /// Remove a subscription; returns `false` when the id is unknown
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.lock();
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Deliver an event to every subscriber
    pub fn emit(&self, event: &E) {
        let callbacks: Vec<Arc<dyn Fn(&E) + Send + Sync>> = {
            let mut subs = self.subscribers.lock();
            let callbacks = subs.iter().map(|s| s.callback.clone()).collect();
            subs.retain(|s| !s.once);
            callbacks
        };
        for callback in callbacks {
            callback(event);
        }
    }
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn delivers_to_all_subscribers() {
        let notifier: Notifier<u32> = Notifier::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let hits = hits.clone();
            notifier.subscribe(move |value| {
                hits.fetch_add(*value as usize, Ordering::SeqCst);
            });
        }

        notifier.emit(&2);
        assert_eq!(hits.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn once_subscription_fires_exactly_once() {
        let notifier: Notifier<()> = Notifier::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = hits.clone();
        notifier.subscribe_once(move |()| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        notifier.emit(&());
        notifier.emit(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let notifier: Notifier<()> = Notifier::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = hits.clone();
        let id = notifier.subscribe(move |()| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        notifier.emit(&());
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.emit(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_may_subscribe_reentrantly() {
        let notifier: Arc<Notifier<()>> = Arc::new(Notifier::new());

        let inner = notifier.clone();
        notifier.subscribe_once(move |()| {
            inner.subscribe(|()| {});
        });

        notifier.emit(&());
        assert_eq!(notifier.subscriber_count(), 1);
    }
}
