//! Pool state and the acquire / release / close protocol.
//!
//! All bookkeeping lives in one [`Mutex`]-protected [`State`]. The lock is
//! only held for short decision phases and never across an `.await`:
//! creating a resource happens outside the lock while an `acquiring`
//! reservation keeps the size accounting exact, so concurrent acquirers
//! racing to grow the pool can never push it past `max_size`.
//!
//! Two [`Notify`] handles replace a condition variable: `available` wakes
//! acquirers when a resource is returned or room to grow appears, and
//! `drained` wakes [`ResourcePool::close`] whenever the pool shrinks.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::Notify;
use utoipa::ToSchema;

use super::{Manager, PoolError, PooledResource};

/// Size bounds for a [`ResourcePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Size the pool fills up to on the first acquisitions.
    pub min_size: usize,
    /// Hard cap on live resources. `0` means unbounded.
    pub max_size: usize,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: 10,
        }
    }
}

/// Point-in-time occupancy of a [`ResourcePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PoolStatus {
    /// `free + used + acquiring`.
    pub size: usize,
    /// Idle resources ready to be handed out.
    pub free: usize,
    /// Resources currently checked out.
    pub used: usize,
    /// Resources being created right now.
    pub acquiring: usize,
    /// Configured minimum size.
    pub min_size: usize,
    /// Configured maximum size (`0` = unbounded).
    pub max_size: usize,
    /// Whether [`ResourcePool::close`] has been initiated.
    pub closing: bool,
}

struct Slot<R> {
    id: u64,
    resource: R,
}

struct State<R> {
    free: VecDeque<Slot<R>>,
    used: HashSet<u64>,
    acquiring: usize,
    closing: bool,
    closed: bool,
}

impl<R> State<R> {
    fn size(&self) -> usize {
        self.free.len() + self.used.len() + self.acquiring
    }
}

/// State shared between a pool, its clones and every outstanding lease.
pub(super) struct Shared<M: Manager> {
    pub(super) manager: M,
    options: PoolOptions,
    state: Mutex<State<M::Resource>>,
    next_id: AtomicU64,
    available: Notify,
    drained: Notify,
}

enum Step<R> {
    Checkout(Slot<R>),
    Grow,
    Wait,
}

enum Release<R> {
    Recycled,
    Discarded { resource: Option<R>, closing: bool },
    Unknown(Option<R>),
}

impl<M: Manager> Shared<M> {
    fn lock(&self) -> MutexGuard<'_, State<M::Resource>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn has_room(&self, state: &State<M::Resource>) -> bool {
        self.options.max_size == 0 || state.size() < self.options.max_size
    }

    /// Takes a resource back from a dropped [`PooledResource`].
    ///
    /// `resource` is `None` when the lease lost its resource during a
    /// failed reconnect; the slot is then simply freed.
    pub(super) fn give_back(&self, id: u64, mut resource: Option<M::Resource>) {
        let broken = resource
            .as_mut()
            .is_some_and(|resource| self.manager.has_broken(resource));

        let outcome = {
            let mut state = self.lock();
            if state.used.remove(&id) {
                match resource {
                    Some(resource) if !broken && !state.closing => {
                        state.free.push_back(Slot { id, resource });
                        Release::Recycled
                    }
                    resource => Release::Discarded {
                        resource,
                        closing: state.closing,
                    },
                }
            } else {
                Release::Unknown(resource)
            }
        };

        match outcome {
            Release::Recycled => self.available.notify_one(),
            Release::Discarded { resource, closing } => {
                if let Some(resource) = resource {
                    self.manager.destroy(resource);
                    tracing::debug!(resource_id = id, broken, closing, "destroyed released resource");
                }
                self.available.notify_one();
                if closing {
                    self.drained.notify_waiters();
                }
            }
            Release::Unknown(resource) => {
                tracing::error!(resource_id = id, "released a resource that is not checked out");
                if let Some(resource) = resource {
                    self.manager.destroy(resource);
                }
                debug_assert!(false, "resource {id} released but not checked out");
            }
        }
    }
}

/// Holds one unit of `acquiring` while a resource is being created.
///
/// Dropping it without calling [`Reservation::fill`] (creation failed or
/// the acquiring future was abandoned) gives the unit back.
struct Reservation<'a, M: Manager> {
    shared: &'a Shared<M>,
    pending: bool,
}

impl<'a, M: Manager> Reservation<'a, M> {
    /// Wraps a unit of `acquiring` already counted under the lock.
    fn taken(shared: &'a Shared<M>) -> Self {
        Self {
            shared,
            pending: true,
        }
    }

    fn fill(mut self, resource: M::Resource) {
        self.pending = false;
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);

        let rejected = {
            let mut state = self.shared.lock();
            state.acquiring -= 1;
            if state.closing {
                Some(resource)
            } else {
                state.free.push_back(Slot { id, resource });
                None
            }
        };

        if let Some(resource) = rejected {
            self.shared.manager.destroy(resource);
            self.shared.drained.notify_waiters();
        } else {
            tracing::debug!(resource_id = id, "pool grew by one resource");
            self.shared.available.notify_one();
        }
    }
}

impl<M: Manager> Drop for Reservation<'_, M> {
    fn drop(&mut self) {
        if !self.pending {
            return;
        }
        let closing = {
            let mut state = self.shared.lock();
            state.acquiring -= 1;
            state.closing
        };
        self.shared.available.notify_one();
        if closing {
            self.shared.drained.notify_waiters();
        }
    }
}

/// Bounded pool of exclusive resources.
///
/// Cloning is cheap and yields another handle to the same pool.
///
/// # Invariants
///
/// - `free + used + acquiring <= max_size` whenever `max_size > 0`.
/// - A resource is either idle in `free`, checked out in `used`, or gone.
pub struct ResourcePool<M: Manager> {
    shared: Arc<Shared<M>>,
}

impl<M: Manager> ResourcePool<M> {
    /// Creates an empty pool. No resource is opened until the first
    /// [`acquire`](Self::acquire).
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if `min_size` exceeds a bounded
    /// `max_size`.
    pub fn new(manager: M, options: PoolOptions) -> Result<Self, PoolError<M::Error>> {
        if options.max_size != 0 && options.min_size > options.max_size {
            return Err(PoolError::InvalidConfig {
                min_size: options.min_size,
                max_size: options.max_size,
            });
        }

        let free = VecDeque::with_capacity(options.max_size.max(options.min_size));
        Ok(Self {
            shared: Arc::new(Shared {
                manager,
                options,
                state: Mutex::new(State {
                    free,
                    used: HashSet::new(),
                    acquiring: 0,
                    closing: false,
                    closed: false,
                }),
                next_id: AtomicU64::new(0),
                available: Notify::new(),
                drained: Notify::new(),
            }),
        })
    }

    /// Checks out a resource, waiting until one is free or can be created.
    ///
    /// The pool first fills up to `min_size`, then hands out an idle
    /// resource, then grows by one if under `max_size`; otherwise it waits
    /// for a release. The chosen idle resource is probed with
    /// [`Manager::is_alive`] and transparently replaced if it is dead.
    ///
    /// Dropping the returned future at any point leaks nothing.
    ///
    /// # Errors
    ///
    /// - [`PoolError::Closed`] once [`close`](Self::close) has started.
    /// - [`PoolError::Create`] if opening a new resource fails.
    pub async fn acquire(&self) -> Result<PooledResource<M>, PoolError<M::Error>> {
        let shared = &self.shared;
        loop {
            let notified = shared.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let step = {
                let mut state = shared.lock();
                if state.closing {
                    return Err(PoolError::Closed);
                }
                if state.size() < shared.options.min_size {
                    state.acquiring += 1;
                    Step::Grow
                } else if let Some(slot) = state.free.pop_front() {
                    state.used.insert(slot.id);
                    Step::Checkout(slot)
                } else if shared.has_room(&state) {
                    state.acquiring += 1;
                    Step::Grow
                } else {
                    Step::Wait
                }
            };

            match step {
                Step::Checkout(slot) => {
                    let lease = PooledResource::new(Arc::clone(shared), slot.id, slot.resource);
                    return revive(lease).await;
                }
                Step::Grow => {
                    let reservation = Reservation::taken(shared);
                    let resource = shared.manager.create().await.map_err(|e| {
                        tracing::warn!(error = %e, "failed to open pooled resource");
                        PoolError::Create(e)
                    })?;
                    reservation.fill(resource);
                }
                Step::Wait => notified.await,
            }
        }
    }

    /// Returns a resource to the pool.
    ///
    /// Equivalent to dropping the lease. Handing in a lease issued by
    /// another pool is a programming error: it asserts in debug builds and
    /// is logged in release builds, leaving this pool untouched.
    pub fn release(&self, lease: PooledResource<M>) {
        if !lease.issued_by(&self.shared) {
            tracing::error!(
                resource_id = lease.id(),
                "resource released to a pool that did not issue it"
            );
            debug_assert!(false, "resource released to a pool that did not issue it");
        }
        drop(lease);
    }

    /// Closes the pool.
    ///
    /// New acquisitions fail with [`PoolError::Closed`], idle resources
    /// are destroyed immediately, and the call then waits until every
    /// checked-out resource has come back and been destroyed. Calling it
    /// again after it completed returns immediately.
    pub async fn close(&self) {
        let shared = &self.shared;
        let idle = {
            let mut state = shared.lock();
            if state.closed {
                return;
            }
            state.closing = true;
            std::mem::take(&mut state.free)
        };

        tracing::info!(idle = idle.len(), "closing resource pool");
        for slot in idle {
            shared.manager.destroy(slot.resource);
        }
        shared.available.notify_waiters();

        loop {
            let drained = shared.drained.notified();
            tokio::pin!(drained);
            drained.as_mut().enable();

            {
                let mut state = shared.lock();
                if state.size() == 0 {
                    state.closed = true;
                    break;
                }
                tracing::debug!(
                    used = state.used.len(),
                    acquiring = state.acquiring,
                    "waiting for outstanding resources"
                );
            }

            drained.await;
        }

        tracing::info!("resource pool closed");
    }

    /// Returns a snapshot of the pool's occupancy.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let state = self.shared.lock();
        PoolStatus {
            size: state.size(),
            free: state.free.len(),
            used: state.used.len(),
            acquiring: state.acquiring,
            min_size: self.shared.options.min_size,
            max_size: self.shared.options.max_size,
            closing: state.closing,
        }
    }

    /// Returns the manager that creates this pool's resources.
    #[must_use]
    pub fn manager(&self) -> &M {
        &self.shared.manager
    }
}

async fn revive<M: Manager>(
    mut lease: PooledResource<M>,
) -> Result<PooledResource<M>, PoolError<M::Error>> {
    if lease.is_alive().await {
        return Ok(lease);
    }
    tracing::warn!(resource_id = lease.id(), "pooled resource failed liveness probe, reconnecting");
    lease.reconnect().await?;
    Ok(lease)
}

impl<M: Manager> Clone for ResourcePool<M> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<M: Manager> fmt::Debug for ResourcePool<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePool")
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct Refused;

    #[derive(Debug)]
    struct FakeConn {
        serial: usize,
        alive: Arc<AtomicBool>,
        busy: AtomicBool,
    }

    #[derive(Debug, Default)]
    struct Counters {
        created: AtomicUsize,
        destroyed: AtomicUsize,
        refuse: AtomicBool,
    }

    #[derive(Debug, Default)]
    struct FakeManager {
        counters: Arc<Counters>,
        connect_delay: Duration,
    }

    impl Manager for FakeManager {
        type Resource = FakeConn;
        type Error = Refused;

        async fn create(&self) -> Result<FakeConn, Refused> {
            if !self.connect_delay.is_zero() {
                tokio::time::sleep(self.connect_delay).await;
            }
            if self.counters.refuse.load(Ordering::SeqCst) {
                return Err(Refused);
            }
            let serial = self.counters.created.fetch_add(1, Ordering::SeqCst);
            Ok(FakeConn {
                serial,
                alive: Arc::new(AtomicBool::new(true)),
                busy: AtomicBool::new(false),
            })
        }

        async fn is_alive(&self, conn: &mut FakeConn) -> bool {
            conn.alive.load(Ordering::SeqCst)
        }

        fn destroy(&self, _conn: FakeConn) {
            self.counters.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn make_pool(min_size: usize, max_size: usize) -> (ResourcePool<FakeManager>, Arc<Counters>) {
        make_slow_pool(min_size, max_size, Duration::ZERO)
    }

    fn make_slow_pool(
        min_size: usize,
        max_size: usize,
        connect_delay: Duration,
    ) -> (ResourcePool<FakeManager>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let manager = FakeManager {
            counters: Arc::clone(&counters),
            connect_delay,
        };
        let Ok(pool) = ResourcePool::new(manager, PoolOptions { min_size, max_size }) else {
            panic!("valid pool bounds");
        };
        (pool, counters)
    }

    fn assert_consistent(pool: &ResourcePool<FakeManager>) {
        let state = pool.shared.lock();
        for slot in &state.free {
            assert!(
                !state.used.contains(&slot.id),
                "resource {} both free and used",
                slot.id
            );
        }
        let max = pool.shared.options.max_size;
        assert!(max == 0 || state.size() <= max, "size {} over cap", state.size());
    }

    async fn checkout(pool: &ResourcePool<FakeManager>) -> PooledResource<FakeManager> {
        match pool.acquire().await {
            Ok(lease) => lease,
            Err(e) => panic!("acquire failed: {e}"),
        }
    }

    #[test]
    fn rejects_min_above_bounded_max() {
        let result = ResourcePool::new(
            FakeManager::default(),
            PoolOptions {
                min_size: 3,
                max_size: 2,
            },
        );
        assert!(matches!(
            result,
            Err(PoolError::InvalidConfig {
                min_size: 3,
                max_size: 2
            })
        ));
    }

    #[test]
    fn unbounded_max_accepts_any_min() {
        let result = ResourcePool::new(
            FakeManager::default(),
            PoolOptions {
                min_size: 5,
                max_size: 0,
            },
        );
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn construction_is_lazy() {
        let (pool, counters) = make_pool(3, 5);
        assert_eq!(pool.status().size, 0);
        assert_eq!(counters.created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn first_acquire_fills_to_min_size() {
        let (pool, counters) = make_pool(2, 4);
        let _lease = checkout(&pool).await;

        let status = pool.status();
        assert_eq!(status.size, 2);
        assert_eq!(status.used, 1);
        assert_eq!(status.free, 1);
        assert_eq!(status.acquiring, 0);
        assert_eq!(counters.created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn released_resource_is_reused() {
        let (pool, counters) = make_pool(0, 2);

        let first = checkout(&pool).await;
        let serial = first.serial;
        drop(first);
        assert_eq!(pool.status().free, 1);

        let second = checkout(&pool).await;
        assert_eq!(second.serial, serial);
        assert_eq!(counters.created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn explicit_release_recycles() {
        let (pool, _) = make_pool(0, 1);
        let lease = checkout(&pool).await;
        pool.release(lease);

        let status = pool.status();
        assert_eq!(status.used, 0);
        assert_eq!(status.free, 1);
    }

    #[tokio::test]
    async fn unbounded_pool_grows_on_demand() {
        let (pool, _) = make_pool(0, 0);
        let mut leases = Vec::new();
        for _ in 0..20 {
            leases.push(checkout(&pool).await);
        }
        assert_eq!(pool.status().used, 20);
        assert_consistent(&pool);
    }

    #[tokio::test]
    async fn acquire_waits_for_release_when_exhausted() {
        let (pool, _) = make_pool(0, 1);
        let held = checkout(&pool).await;
        let held_serial = held.serial;

        let waiter_pool = pool.clone();
        let waiter = tokio::spawn(async move {
            waiter_pool.acquire().await.map(|lease| lease.serial)
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished(), "acquire must wait while the pool is full");

        drop(held);
        let Ok(Ok(serial)) = waiter.await else {
            panic!("waiter should obtain the released resource");
        };
        assert_eq!(serial, held_serial);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_acquirers_never_share_or_exceed_cap() {
        let (pool, counters) = make_slow_pool(1, 3, Duration::from_millis(5));

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let pool = pool.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..4 {
                    let lease = match pool.acquire().await {
                        Ok(lease) => lease,
                        Err(e) => panic!("acquire failed: {e}"),
                    };
                    assert!(
                        !lease.busy.swap(true, Ordering::SeqCst),
                        "resource {} handed out twice",
                        lease.serial
                    );
                    assert_consistent(&pool);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    lease.busy.store(false, Ordering::SeqCst);
                }
            }));
        }
        for task in tasks {
            assert!(task.await.is_ok());
        }

        assert!(counters.created.load(Ordering::SeqCst) <= 3);
        let status = pool.status();
        assert_eq!(status.used, 0);
        assert_eq!(status.acquiring, 0);
        assert!(status.size <= 3);
    }

    #[tokio::test]
    async fn close_waits_for_outstanding_resources() {
        let (pool, counters) = make_pool(0, 2);
        let kept = checkout(&pool).await;
        let returned = checkout(&pool).await;
        drop(returned);

        let closer_pool = pool.clone();
        let closer = tokio::spawn(async move { closer_pool.close().await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!closer.is_finished(), "close must wait for checked-out resources");
        let status = pool.status();
        assert!(status.closing);
        assert_eq!(status.free, 0);
        assert_eq!(counters.destroyed.load(Ordering::SeqCst), 1);

        drop(kept);
        assert!(closer.await.is_ok());

        assert_eq!(pool.status().size, 0);
        assert_eq!(counters.destroyed.load(Ordering::SeqCst), 2);
        assert!(matches!(pool.acquire().await, Err(PoolError::Closed)));
    }

    #[tokio::test]
    async fn close_fails_pending_acquirers() {
        let (pool, _) = make_pool(0, 1);
        let held = checkout(&pool).await;

        let waiter_pool = pool.clone();
        let waiter = tokio::spawn(async move { waiter_pool.acquire().await.map(|_| ()) });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let closer_pool = pool.clone();
        let closer = tokio::spawn(async move { closer_pool.close().await });

        let Ok(result) = waiter.await else {
            panic!("waiter task panicked");
        };
        assert!(matches!(result, Err(PoolError::Closed)));

        drop(held);
        assert!(closer.await.is_ok());
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (pool, counters) = make_pool(2, 2);
        drop(checkout(&pool).await);

        pool.close().await;
        pool.close().await;

        assert_eq!(pool.status().size, 0);
        assert_eq!(counters.destroyed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dead_resource_is_replaced_on_checkout() {
        let (pool, counters) = make_pool(0, 1);
        let lease = checkout(&pool).await;
        let liveness = Arc::clone(&lease.alive);
        drop(lease);

        liveness.store(false, Ordering::SeqCst);

        let lease = checkout(&pool).await;
        assert_eq!(lease.serial, 1);
        assert_eq!(counters.destroyed.load(Ordering::SeqCst), 1);
        assert_eq!(pool.status().size, 1);
    }

    #[tokio::test]
    async fn failed_reconnect_frees_the_slot() {
        let (pool, counters) = make_pool(0, 1);
        let lease = checkout(&pool).await;
        lease.alive.store(false, Ordering::SeqCst);
        drop(lease);

        counters.refuse.store(true, Ordering::SeqCst);
        assert!(matches!(pool.acquire().await, Err(PoolError::Create(_))));
        assert_eq!(pool.status().size, 0);
    }

    #[tokio::test]
    async fn creation_failure_propagates_without_leaking_capacity() {
        let (pool, counters) = make_pool(0, 1);
        counters.refuse.store(true, Ordering::SeqCst);

        assert!(matches!(pool.acquire().await, Err(PoolError::Create(_))));
        let status = pool.status();
        assert_eq!(status.size, 0);
        assert_eq!(status.acquiring, 0);

        counters.refuse.store(false, Ordering::SeqCst);
        let _lease = checkout(&pool).await;
        assert_eq!(pool.status().used, 1);
    }

    #[tokio::test]
    async fn abandoned_wait_does_not_leak() {
        let (pool, _) = make_pool(0, 1);
        let held = checkout(&pool).await;

        let attempt = tokio::time::timeout(Duration::from_millis(30), pool.acquire()).await;
        assert!(attempt.is_err(), "acquire should still be waiting");

        drop(held);
        let again = tokio::time::timeout(Duration::from_secs(1), pool.acquire()).await;
        assert!(matches!(again, Ok(Ok(_))));
        assert_eq!(pool.status().size, 1);
    }

    #[tokio::test]
    async fn abandoned_creation_returns_reservation() {
        let (pool, counters) = make_slow_pool(0, 1, Duration::from_millis(200));

        let attempt = tokio::time::timeout(Duration::from_millis(20), pool.acquire()).await;
        assert!(attempt.is_err());

        let status = pool.status();
        assert_eq!(status.acquiring, 0);
        assert_eq!(status.size, 0);
        assert_eq!(counters.created.load(Ordering::SeqCst), 0);
    }

    #[cfg(debug_assertions)]
    #[tokio::test]
    #[should_panic(expected = "did not issue it")]
    async fn releasing_into_foreign_pool_is_a_defect() {
        let (pool, _) = make_pool(0, 1);
        let (other, _) = make_pool(0, 1);
        let lease = checkout(&other).await;
        pool.release(lease);
    }
}
