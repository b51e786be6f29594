use crate::resource::UpdateEvent;
use futures_channel::mpsc;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Handler = Arc<dyn Fn(&UpdateEvent) + Send + Sync>;

/// Returned by [`NotificationBus::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

#[derive(Default)]
struct Subscribers {
    next_token: u64,
    handlers: BTreeMap<u64, Handler>,
    channels: Vec<mpsc::UnboundedSender<UpdateEvent>>,
}

/// Broadcasts [`UpdateEvent`]s to every registered handler and channel.
///
/// Clones share one subscriber list. `publish` is synchronous and never
/// fails: a panicking handler is logged and skipped, and closed channels are
/// dropped from the list.
#[derive(Clone, Default)]
pub struct NotificationBus {
    subscribers: Arc<Mutex<Subscribers>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionToken
    where
        F: Fn(&UpdateEvent) + Send + Sync + 'static,
    {
        let mut subs = self.lock();
        let token = subs.next_token;
        subs.next_token += 1;
        subs.handlers.insert(token, Arc::new(handler));
        SubscriptionToken(token)
    }

    /// Returns false if the token was already removed.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.lock().handlers.remove(&token.0).is_some()
    }

    /// Receive future events as a stream. Dropping the receiver unsubscribes.
    pub fn subscribe_channel(&self) -> mpsc::UnboundedReceiver<UpdateEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.lock().channels.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        let subs = self.lock();
        subs.handlers.len() + subs.channels.iter().filter(|tx| !tx.is_closed()).count()
    }

    pub fn publish(&self, event: UpdateEvent) {
        // Handlers run outside the lock so they may (un)subscribe.
        let handlers: Vec<Handler> = {
            let mut subs = self.lock();
            subs.channels
                .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
            subs.handlers.values().cloned().collect()
        };

        for handler in handlers {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                log::warn!(
                    "{} handler panicked while handling {}",
                    event.name(),
                    event.resource
                );
            }
        }
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceId;
    use futures::StreamExt;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event() -> UpdateEvent {
        UpdateEvent::new(
            ResourceId::new("logo", "png"),
            PathBuf::from("/cache/com.example.app/logo.png"),
        )
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        NotificationBus::new().publish(event());
    }

    #[test]
    fn every_handler_receives_the_event() {
        let bus = NotificationBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = hits.clone();
            bus.subscribe(move |e| {
                assert_eq!(e.resource, ResourceId::new("logo", "png"));
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        bus.publish(event());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn panicking_handler_does_not_stop_delivery() {
        let bus = NotificationBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe(|_| panic!("boom"));
        let counter = hits.clone();
        bus.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(event());
        bus.publish(event());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = NotificationBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let token = bus.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(event());
        assert!(bus.unsubscribe(token));
        assert!(!bus.unsubscribe(token));
        bus.publish(event());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_may_unsubscribe_itself() {
        let bus = NotificationBus::new();
        let slot: Arc<Mutex<Option<SubscriptionToken>>> = Arc::new(Mutex::new(None));
        let (bus2, slot2) = (bus.clone(), slot.clone());
        let token = bus.subscribe(move |_| {
            if let Some(t) = slot2.lock().unwrap().take() {
                bus2.unsubscribe(t);
            }
        });
        *slot.lock().unwrap() = Some(token);

        bus.publish(event());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[async_std::test]
    async fn channel_subscribers_receive_and_are_pruned() {
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe_channel();
        let dropped = bus.subscribe_channel();
        drop(dropped);

        bus.publish(event());
        assert_eq!(rx.next().await, Some(event()));
        assert_eq!(bus.subscriber_count(), 1);
    }
}
