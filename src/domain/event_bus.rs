//! In-memory fan-out queue behind the long-poll endpoint.
//!
//! [`EventBus`] keeps every undelivered [`EventRecord`] in one
//! insertion-ordered list guarded by a single lock. A poll scans the list
//! for records addressed to the polling identity, strips that identity
//! from each match and removes records whose recipient set became empty,
//! all in the same locked pass. Each recipient therefore sees each event
//! exactly once, and a fully delivered record is never observed again.
//!
//! Publishers wake waiting pollers through a [`Notify`]; pollers also
//! rescan on a short fixed interval, and never hold the lock while waiting.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use super::{DeliveredEvent, EventKind, EventRecord, UserId};

/// Tuning for an [`EventBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventBusOptions {
    /// Maximum number of undelivered records kept. When exceeded, the
    /// oldest records are dropped even if some recipients never polled
    /// them. `0` (the default) disables the limit, so every published
    /// event stays pending until each recipient has received it.
    pub capacity: usize,
    /// Upper bound on the time a waiting poller goes without rescanning.
    pub rescan_interval: Duration,
}

impl Default for EventBusOptions {
    fn default() -> Self {
        Self {
            capacity: 0,
            rescan_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug)]
struct Inner {
    pending: Mutex<VecDeque<EventRecord>>,
    published: Notify,
    options: EventBusOptions,
}

/// Pending notifications addressed to user identities.
///
/// Cheap to clone; all clones share the same queue. Created once at
/// startup and handed to request handlers through the application state.
#[derive(Debug, Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new(options: EventBusOptions) -> Self {
        let options = EventBusOptions {
            rescan_interval: options.rescan_interval.max(Duration::from_millis(1)),
            ..options
        };
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(VecDeque::new()),
                published: Notify::new(),
                options,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<EventRecord>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues an event for every identity in `recipients`.
    ///
    /// Never blocks beyond a brief lock hold. An empty recipient set is
    /// ignored.
    pub fn publish(
        &self,
        kind: EventKind,
        recipients: impl IntoIterator<Item = UserId>,
        payload: serde_json::Value,
    ) {
        let recipients: HashSet<UserId> = recipients.into_iter().collect();
        if recipients.is_empty() {
            tracing::debug!(kind = kind.as_str(), "ignoring event without recipients");
            return;
        }
        let audience = recipients.len();
        let capacity = self.inner.options.capacity;

        let dropped = {
            let mut pending = self.lock();
            pending.push_back(EventRecord::new(kind, recipients, payload));
            let overflow = if capacity == 0 {
                0
            } else {
                pending.len().saturating_sub(capacity)
            };
            pending.drain(..overflow).count()
        };

        if dropped > 0 {
            tracing::warn!(dropped, capacity, "event bus full, dropped oldest undelivered events");
        }
        tracing::debug!(kind = kind.as_str(), audience, "event published");
        self.inner.published.notify_waiters();
    }

    /// Waits up to `timeout` for events addressed to `recipient`.
    ///
    /// Returns as soon as a scan finds at least one event, or an empty
    /// batch once `timeout` has elapsed. Returned events are marked as
    /// delivered to `recipient` and will not be returned to it again.
    /// Dropping the future stops the wait and leaves the queue untouched.
    pub async fn poll(&self, recipient: UserId, timeout: Duration) -> Vec<DeliveredEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            let published = self.inner.published.notified();
            tokio::pin!(published);
            published.as_mut().enable();

            let batch = self.take_for(recipient);
            if !batch.is_empty() {
                tracing::debug!(%recipient, delivered = batch.len(), "events delivered");
                return batch;
            }

            let now = Instant::now();
            if now >= deadline {
                return batch;
            }
            let wake_at = deadline.min(now + self.inner.options.rescan_interval);
            let _ = tokio::time::timeout_at(wake_at, published.as_mut()).await;
        }
    }

    /// One locked scan: collects and marks the events owed to `recipient`
    /// and drops every record nobody is owed any more.
    fn take_for(&self, recipient: UserId) -> Vec<DeliveredEvent> {
        let mut batch = Vec::new();
        let mut pending = self.lock();
        pending.retain_mut(|record| {
            if record.recipients.remove(&recipient) {
                batch.push(record.delivered());
            }
            !record.recipients.is_empty()
        });
        batch
    }

    /// Number of records still owed to at least one recipient.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.lock().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EventBusOptions::default())
    }
}
