//! In-process notification of log changes.
//!
//! Two delivery styles share one publish call:
//! - synchronous handlers registered with [`LogEventBus::subscribe`], run
//!   on the publishing thread;
//! - an async [`broadcast`] feed from [`LogEventBus::watch`] for
//!   long-lived consumers.
//!
//! Neither replays past events. A late subscriber must read the store to
//! catch up.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::entry::LogEntry;

type Handler = Arc<dyn Fn(&LogEntry) + Send + Sync>;

const WATCH_CAPACITY: usize = 128;

struct BusInner {
    handlers: RwLock<Vec<(u64, Handler)>>,
    next_id: AtomicU64,
    tx: broadcast::Sender<LogEntry>,
}

/// Fan-out of changed [`LogEntry`] values to subscribers.
#[derive(Clone)]
pub struct LogEventBus {
    inner: Arc<BusInner>,
}

impl Default for LogEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(WATCH_CAPACITY);
        Self {
            inner: Arc::new(BusInner {
                handlers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                tx,
            }),
        }
    }

    /// Deliver `entry` once to every current subscriber.
    ///
    /// The handler list is snapshotted first, so a handler may subscribe
    /// or unsubscribe without deadlocking.
    pub fn publish(&self, entry: &LogEntry) {
        let handlers: Vec<Handler> = self
            .inner
            .handlers
            .read()
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        for handler in handlers {
            handler(entry);
        }
        // No receivers is fine.
        let _ = self.inner.tx.send(entry.clone());
    }

    /// Register a handler invoked on every publish until the returned
    /// [`Subscription`] is unsubscribed or dropped.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.handlers.write().push((id, Arc::new(handler)));
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Async feed of published entries. Slow receivers skip ahead
    /// (`RecvError::Lagged`) rather than block publishers.
    pub fn watch(&self) -> broadcast::Receiver<LogEntry> {
        self.inner.tx.subscribe()
    }

    /// Number of registered synchronous handlers.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.read().len()
    }
}

/// Handle to a registered handler. Dropping it unsubscribes.
#[must_use = "dropping a Subscription immediately unsubscribes the handler"]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Remove the handler now.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            inner.handlers.write().retain(|(id, _)| *id != self.id);
        }
    }
}
