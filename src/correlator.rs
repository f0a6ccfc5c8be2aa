use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, trace};

use crate::dbus_signal::{CloseReason, DbusSignal};

pub type Handler = Arc<dyn Fn(&DbusSignal) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationState {
    Open,
    Closed(CloseReason),
}

struct Entry {
    state: NotificationState,
    handler: Handler,
}

/// Routes inbound signals to whoever registered for their notification id.
///
/// Other clients on the same bus get signals too, so ids nobody registered are ignored.
/// Handlers run without the lock held: a handler may unregister itself (or anything else).
#[derive(Clone, Default)]
pub struct SignalCorrelator {
    entries: Arc<Mutex<HashMap<u32, Entry>>>,
}

impl SignalCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<u32, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts tracking `id` as open. Registering an id twice replaces the handler and keeps the state.
    pub fn register<F>(&self, id: u32, handler: F)
    where
        F: Fn(&DbusSignal) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        let mut entries = self.entries();
        match entries.get_mut(&id) {
            Some(entry) => entry.handler = handler,
            None => {
                entries.insert(id, Entry { state: NotificationState::Open, handler });
            }
        }
        debug!(id, "registered notification");
    }

    /// Like [`register`](Self::register) but hands signals to a channel.
    ///
    /// The channel closes once the id is unregistered and the last queued signal is read.
    pub fn register_channel(&self, id: u32) -> UnboundedReceiver<DbusSignal> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.register(id, move |signal| {
            // receiver gone: the caller stopped listening
            let _ = sender.send(signal.clone());
        });
        receiver
    }

    /// Returns whether `id` was registered. Signals for it arriving later are dropped.
    pub fn unregister(&self, id: u32) -> bool {
        let removed = self.entries().remove(&id).is_some();
        if removed {
            debug!(id, "unregistered notification");
        }
        removed
    }

    pub fn is_registered(&self, id: u32) -> bool {
        self.entries().contains_key(&id)
    }

    pub fn state(&self, id: u32) -> Option<NotificationState> {
        self.entries().get(&id).map(|entry| entry.state)
    }

    /// Delivers one signal. Returns `false` when nobody registered its id.
    pub fn dispatch(&self, signal: &DbusSignal) -> bool {
        let id = signal.notification_id();
        let handler = {
            let mut entries = self.entries();
            let Some(entry) = entries.get_mut(&id) else {
                trace!(id, signal = signal.member(), "no handler for notification");
                return false;
            };
            if let DbusSignal::NotificationClosed { reason, .. } = signal {
                entry.state = NotificationState::Closed(*reason);
            }
            Arc::clone(&entry.handler)
        };

        handler(signal);
        true
    }
}

impl fmt::Debug for SignalCorrelator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries();
        let mut ids: Vec<_> = entries.keys().copied().collect();
        ids.sort_unstable();
        f.debug_struct("SignalCorrelator").field("registered", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counter(correlator: &SignalCorrelator, id: u32) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        correlator.register(id, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    fn closed(id: u32, reason: u32) -> DbusSignal {
        DbusSignal::NotificationClosed { notification_id: id, reason: CloseReason(reason) }
    }

    #[test]
    fn close_only_affects_its_own_id() {
        let correlator = SignalCorrelator::new();
        let seven = counter(&correlator, 7);
        let nine = counter(&correlator, 9);

        assert!(correlator.dispatch(&closed(7, 1)));

        assert_eq!(correlator.state(7), Some(NotificationState::Closed(CloseReason::EXPIRED)));
        assert_eq!(correlator.state(9), Some(NotificationState::Open));
        assert_eq!(seven.load(Ordering::SeqCst), 1);
        assert_eq!(nine.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let correlator = SignalCorrelator::new();
        assert!(!correlator.dispatch(&closed(3, 2)));
        assert_eq!(correlator.state(3), None);
    }

    #[test]
    fn actions_after_close_are_still_delivered() {
        let correlator = SignalCorrelator::new();
        let count = counter(&correlator, 1);

        correlator.dispatch(&closed(1, 3));
        correlator.dispatch(&DbusSignal::NotificationReplied {
            notification_id: 1,
            message: "late".into(),
        });

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(correlator.state(1), Some(NotificationState::Closed(CloseReason::CLOSED_BY_CALL)));
    }

    #[test]
    fn handler_can_unregister_itself() {
        let correlator = SignalCorrelator::new();
        let inner = correlator.clone();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        correlator.register(4, move |signal| {
            c.fetch_add(1, Ordering::SeqCst);
            inner.unregister(signal.notification_id());
        });

        let invoked = DbusSignal::ActionInvoked { notification_id: 4, action: "ok".into() };
        assert!(correlator.dispatch(&invoked));
        assert!(!correlator.dispatch(&invoked));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!correlator.is_registered(4));
    }

    #[tokio::test]
    async fn channel_receives_in_order() {
        let correlator = SignalCorrelator::new();
        let mut receiver = correlator.register_channel(2);

        correlator.dispatch(&DbusSignal::ActivationToken { notification_id: 2, token: "t".into() });
        correlator.dispatch(&closed(2, 2));
        correlator.unregister(2);

        assert!(matches!(receiver.recv().await, Some(DbusSignal::ActivationToken { .. })));
        assert!(matches!(receiver.recv().await, Some(DbusSignal::NotificationClosed { .. })));
        assert_eq!(receiver.recv().await, None);
    }
}
