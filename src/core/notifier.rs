use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

/// Kind of pet-state mutation being announced to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateChange {
    Stage,
    Emotion,
    PetType,
    All,
}

impl StateChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::Emotion => "emotion",
            Self::PetType => "type",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(StateChange) + Send + Sync>;

/// Synchronous pub/sub hub for pet display updates.
///
/// Handlers run in subscription order. The subscriber list is copied before
/// iteration, so a handler may unsubscribe itself (or anyone else) while a
/// notification is being delivered, and a panicking handler does not prevent
/// later handlers from running.
pub struct ChangeNotifier {
    handlers: Mutex<Vec<(SubscriptionId, Handler)>>,
    next_id: AtomicU64,
    notifications: AtomicU64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            notifications: AtomicU64::new(0),
        }
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(StateChange) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.lock().push((id, Arc::new(handler)));
        debug!(subscription = id.0, "state change subscription added");
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        if handlers.len() < before {
            debug!(subscription = id.0, "state change subscription removed");
        }
    }

    pub fn notify(&self, change: StateChange) {
        let snapshot: Vec<(SubscriptionId, Handler)> = self.handlers.lock().clone();
        for (id, handler) in snapshot {
            let result = catch_unwind(AssertUnwindSafe(|| handler(change)));
            if result.is_err() {
                warn!(
                    subscription = id.0,
                    change = change.as_str(),
                    "state change handler panicked"
                );
            }
        }
        self.notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn notification_count(&self) -> u64 {
        self.notifications.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> NotifierStats {
        NotifierStats {
            subscribers: self.subscriber_count(),
            notifications_sent: self.notification_count(),
        }
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifierStats {
    pub subscribers: usize,
    pub notifications_sent: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let notifier = ChangeNotifier::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            notifier.subscribe(move |_| order.lock().push(tag));
        }

        notifier.notify(StateChange::All);
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_panicking_handler_does_not_block_others() {
        let notifier = ChangeNotifier::new();
        let delivered = Arc::new(AtomicUsize::new(0));

        notifier.subscribe(|_| panic!("boom"));
        {
            let delivered = Arc::clone(&delivered);
            notifier.subscribe(move |_| {
                delivered.fetch_add(1, Ordering::SeqCst);
            });
        }

        notifier.notify(StateChange::Emotion);
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.subscriber_count(), 2);
    }

    #[test]
    fn test_handler_can_unsubscribe_itself_during_notify() {
        let notifier = Arc::new(ChangeNotifier::new());
        let self_id = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));
        let later_calls = Arc::new(AtomicUsize::new(0));

        let id = {
            let notifier = Arc::clone(&notifier);
            let self_id = Arc::clone(&self_id);
            let calls = Arc::clone(&calls);
            notifier.clone().subscribe(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(id) = *self_id.lock() {
                    notifier.unsubscribe(id);
                }
            })
        };
        *self_id.lock() = Some(id);

        {
            let later_calls = Arc::clone(&later_calls);
            notifier.subscribe(move |_| {
                later_calls.fetch_add(1, Ordering::SeqCst);
            });
        }

        notifier.notify(StateChange::Stage);
        notifier.notify(StateChange::Stage);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(later_calls.load(Ordering::SeqCst), 2);
        assert_eq!(notifier.subscriber_count(), 1);
    }

    #[test]
    fn test_unsubscribe_unknown_id_is_noop() {
        let notifier = ChangeNotifier::new();
        let id = notifier.subscribe(|_| {});
        notifier.unsubscribe(id);
        notifier.unsubscribe(id);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_notification_count_tracks_notify_calls() {
        let notifier = ChangeNotifier::new();
        notifier.notify(StateChange::All);
        notifier.notify(StateChange::PetType);
        let stats = notifier.stats();
        assert_eq!(stats.notifications_sent, 2);
        assert_eq!(stats.subscribers, 0);
    }
}
