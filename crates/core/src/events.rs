//! Change notification for store subscribers.
//!
//! Two ways to observe the store:
//! - callbacks registered with [`ChangeNotifier::subscribe`], invoked with no payload;
//! - a [`watch`] revision counter from [`ChangeNotifier::changes`], bumped on every notify.
//!
//! In both cases the observer re-reads the store to see what changed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::watch;

type Listener = Arc<dyn Fn() + Send + Sync>;

pub struct ChangeNotifier {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, Listener>>,
    revision: watch::Sender<u64>,
}

impl ChangeNotifier {
    pub fn new() -> Arc<Self> {
        let (revision, _) = watch::channel(0);
        Arc::new(Self {
            next_id: AtomicU64::new(0),
            listeners: Mutex::new(BTreeMap::new()),
            revision,
        })
    }

    /// Register `callback`; it stays registered until [`Subscription::unsubscribe`] is called.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(callback));

        Subscription {
            id,
            notifier: Arc::downgrade(self),
        }
    }

    pub fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Invoke every listener in registration order.
    ///
    /// The listener set is copied before calling out, so a callback may subscribe or
    /// unsubscribe without deadlocking; such changes apply from the next notification.
    pub fn notify(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));

        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for listener in listeners {
            listener();
        }
    }

    fn remove(&self, id: u64) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }
}

/// Handle returned by [`ChangeNotifier::subscribe`].
///
/// Dropping the handle does not unregister the listener.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    notifier: Weak<ChangeNotifier>,
}

impl Subscription {
    /// Unregister the listener. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.notifier.upgrade() {
            Some(notifier) => notifier.remove(self.id),
            None => false,
        }
    }
}
