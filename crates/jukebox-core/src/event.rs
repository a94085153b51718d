// ── Observer registry ──
//
// Multi-subscriber, synchronous event channels. Subscribers are kept in
// an `ArcSwap` snapshot: writers publish a new list, dispatch iterates
// whatever list was current when it started, so handlers may subscribe
// or unsubscribe mid-dispatch without disturbing the in-flight event.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use tracing::trace;

/// Handle returned by [`EventChannel::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Subscriber<E> {
    id: SubscriptionId,
    /// Diagnostic label for the subscribing component.
    target: Arc<str>,
    handler: Handler<E>,
}

impl<E> Clone for Subscriber<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            target: Arc::clone(&self.target),
            handler: Arc::clone(&self.handler),
        }
    }
}

/// Subscribe/unsubscribe capability shared by every event source.
pub trait Notifier<E> {
    fn subscribe<F>(&self, target: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static;

    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// An ordered broadcast channel with synchronous fan-out.
///
/// Every [`dispatch`](Self::dispatch) invokes all handlers registered at
/// the moment the dispatch began, in registration order, before returning.
pub struct EventChannel<E> {
    name: &'static str,
    next_id: AtomicU64,
    subscribers: ArcSwap<Vec<Subscriber<E>>>,
}

impl<E: 'static> EventChannel<E> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            next_id: AtomicU64::new(1),
            subscribers: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Channel name used in log output.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register a handler. `target` identifies the subscriber in logs.
    pub fn subscribe<F>(&self, target: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let subscriber = Subscriber {
            id,
            target: Arc::from(target),
            handler: Arc::new(handler),
        };

        self.subscribers.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(subscriber.clone());
            next
        });

        trace!(channel = self.name, %id, target, "subscribed");
        id
    }

    /// Remove a handler. Returns `false` if the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut removed = false;
        self.subscribers.rcu(|current| {
            let next: Vec<Subscriber<E>> = current.iter().filter(|s| s.id != id).cloned().collect();
            removed = next.len() != current.len();
            next
        });

        if removed {
            trace!(channel = self.name, %id, "unsubscribed");
        }
        removed
    }

    /// Deliver `event` to every current subscriber. Returns the number of
    /// handlers invoked.
    pub fn dispatch(&self, event: &E) -> usize {
        let snapshot = self.subscribers.load_full();
        for subscriber in snapshot.iter() {
            (subscriber.handler)(event);
        }
        snapshot.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load().len()
    }

    /// Subscriber targets in registration order.
    pub fn targets(&self) -> Vec<String> {
        self.subscribers
            .load()
            .iter()
            .map(|s| s.target.to_string())
            .collect()
    }
}

impl<E: 'static> Notifier<E> for EventChannel<E> {
    fn subscribe<F>(&self, target: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        EventChannel::subscribe(self, target, handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        EventChannel::unsubscribe(self, id)
    }
}

impl<E> fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.name)
            .field("subscribers", &self.subscribers.load().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&u32) + Send + Sync>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |label: &str| -> Box<dyn Fn(&u32) + Send + Sync> {
            let sink = Arc::clone(&sink);
            let label = label.to_owned();
            Box::new(move |v: &u32| sink.lock().unwrap().push(format!("{label}:{v}")))
        };
        (log, make)
    }

    #[test]
    fn dispatch_reaches_subscribers_in_registration_order() {
        let channel = EventChannel::new("test");
        let (log, make) = recorder();
        channel.subscribe("a", make("a"));
        channel.subscribe("b", make("b"));
        channel.subscribe("c", make("c"));

        assert_eq!(channel.dispatch(&7), 3);
        assert_eq!(*log.lock().unwrap(), vec!["a:7", "b:7", "c:7"]);
    }

    #[test]
    fn unsubscribe_leaves_other_subscribers_intact() {
        let channel = EventChannel::new("test");
        let (log, make) = recorder();
        channel.subscribe("a", make("a"));
        let b = channel.subscribe("b", make("b"));
        channel.subscribe("c", make("c"));

        assert!(channel.unsubscribe(b));
        assert!(!channel.unsubscribe(b));
        channel.dispatch(&1);

        assert_eq!(*log.lock().unwrap(), vec!["a:1", "c:1"]);
        assert_eq!(channel.targets(), vec!["a", "c"]);
    }

    #[test]
    fn unsubscribe_during_dispatch_does_not_skip_in_flight_delivery() {
        let channel = Arc::new(EventChannel::<u32>::new("test"));
        let (log, make) = recorder();

        let victim = Arc::new(Mutex::new(None));
        let victim_slot = Arc::clone(&victim);
        let ch = Arc::clone(&channel);
        channel.subscribe("remover", move |_| {
            if let Some(id) = victim_slot.lock().unwrap().take() {
                ch.unsubscribe(id);
            }
        });
        let id = channel.subscribe("victim", make("victim"));
        *victim.lock().unwrap() = Some(id);

        // The snapshot taken at dispatch start still includes the victim.
        channel.dispatch(&1);
        channel.dispatch(&2);

        assert_eq!(*log.lock().unwrap(), vec!["victim:1"]);
        assert_eq!(channel.subscriber_count(), 1);
    }

    #[test]
    fn subscribe_during_dispatch_applies_to_next_event() {
        let channel = Arc::new(EventChannel::<u32>::new("test"));
        let (log, make) = recorder();
        let ch = Arc::clone(&channel);
        let late = Arc::new(Mutex::new(Some(make("late"))));
        channel.subscribe("adder", move |_| {
            if let Some(handler) = late.lock().unwrap().take() {
                ch.subscribe("late", handler);
            }
        });

        channel.dispatch(&1);
        channel.dispatch(&2);

        assert_eq!(*log.lock().unwrap(), vec!["late:2"]);
    }

    #[test]
    fn dispatch_without_subscribers_is_a_noop() {
        let channel = EventChannel::<u32>::new("empty");
        assert_eq!(channel.dispatch(&0), 0);
        assert_eq!(channel.subscriber_count(), 0);
    }
}
