//! In-process fan-out of events to live subscribers.
//!
//! Every subscriber owns a bounded queue. `publish` never waits: a full queue
//! drops the event for that subscriber only, and a queue whose receiver is
//! gone is pruned from the registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Default per-subscriber queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

type Registry<E> = Arc<Mutex<HashMap<u64, mpsc::Sender<E>>>>;

fn lock<E>(registry: &Mutex<HashMap<u64, mpsc::Sender<E>>>) -> MutexGuard<'_, HashMap<u64, mpsc::Sender<E>>> {
    // the map stays consistent even if a holder panicked
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of subscriber queues
pub struct EventBroadcaster<E> {
    subscribers: Registry<E>,
    next_id: AtomicU64,
    capacity: usize,
}

impl<E: Clone + Send + 'static> EventBroadcaster<E> {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    /// Registers a new queue
    ///
    /// The next `publish` after this returns will reach it.
    pub fn subscribe(&self) -> Subscription<E> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.capacity);
        lock(&self.subscribers).insert(id, tx);
        debug!(subscriber_id = id, "Subscriber registered");

        Subscription {
            id,
            receiver: rx,
            registry: Arc::downgrade(&self.subscribers),
        }
    }

    /// Hands a clone of `event` to every registered queue
    ///
    /// # Returns
    ///
    /// Number of queues that accepted the event
    pub fn publish(&self, event: E) -> usize {
        let mut subscribers = lock(&self.subscribers);
        let mut delivered = 0;
        let mut closed = Vec::new();

        for (id, tx) in subscribers.iter() {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(subscriber_id = id, "Subscriber queue full, event dropped");
                }
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        for id in closed {
            subscribers.remove(&id);
            debug!(subscriber_id = id, "Pruned closed subscriber");
        }

        delivered
    }

    /// Removes a subscriber; unknown ids are ignored
    pub fn unsubscribe(&self, id: u64) {
        if lock(&self.subscribers).remove(&id).is_some() {
            debug!(subscriber_id = id, "Subscriber removed");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<E: Clone + Send + 'static> Default for EventBroadcaster<E> {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

/// A live subscription
///
/// Dropping it unregisters the queue.
pub struct Subscription<E> {
    id: u64,
    receiver: mpsc::Receiver<E>,
    registry: std::sync::Weak<Mutex<HashMap<u64, mpsc::Sender<E>>>>,
}

impl<E> Subscription<E> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Waits for the next event; `None` once the broadcaster is gone
    pub async fn recv(&mut self) -> Option<E> {
        self.receiver.recv().await
    }

    /// Returns an already-queued event without waiting
    pub fn try_recv(&mut self) -> Option<E> {
        self.receiver.try_recv().ok()
    }
}

impl<E: Send + 'static> Subscription<E> {
    /// Converts into a `Stream` that unregisters when dropped
    pub fn into_stream(self) -> SubscriptionStream<E> {
        SubscriptionStream { inner: self }
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).remove(&self.id);
        }
    }
}

/// Stream adapter over a [`Subscription`]
pub struct SubscriptionStream<E> {
    inner: Subscription<E>,
}

impl<E> futures::Stream for SubscriptionStream<E> {
    type Item = E;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<E>> {
        self.inner.receiver.poll_recv(cx)
    }
}
