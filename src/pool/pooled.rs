//! Scoped acquisition guard.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use super::resource_pool::Shared;
use super::{Manager, PoolError};

/// A resource checked out of a [`super::ResourcePool`].
///
/// Dereferences to the underlying resource. The resource goes back to the
/// pool when the guard is dropped, whichever way the holder's scope ends:
/// normal return, `?` propagation, panic unwinding or a cancelled future.
pub struct PooledResource<M: Manager> {
    shared: Arc<Shared<M>>,
    id: u64,
    resource: Option<M::Resource>,
}

impl<M: Manager> PooledResource<M> {
    pub(super) fn new(shared: Arc<Shared<M>>, id: u64, resource: M::Resource) -> Self {
        Self {
            shared,
            id,
            resource: Some(resource),
        }
    }

    /// Pool-unique identifier of the slot this resource occupies.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub(super) fn issued_by(&self, shared: &Arc<Shared<M>>) -> bool {
        Arc::ptr_eq(&self.shared, shared)
    }

    pub(super) async fn is_alive(&mut self) -> bool {
        match self.resource.as_mut() {
            Some(resource) => self.shared.manager.is_alive(resource).await,
            None => false,
        }
    }

    /// Destroys the current resource and opens a fresh one in the same
    /// slot. The slot stays counted as checked out throughout, so the pool
    /// size never moves.
    pub(super) async fn reconnect(&mut self) -> Result<(), PoolError<M::Error>> {
        if let Some(dead) = self.resource.take() {
            self.shared.manager.destroy(dead);
        }
        let fresh = self
            .shared
            .manager
            .create()
            .await
            .map_err(PoolError::Create)?;
        self.resource = Some(fresh);
        Ok(())
    }
}

impl<M: Manager> Deref for PooledResource<M> {
    type Target = M::Resource;

    fn deref(&self) -> &Self::Target {
        match &self.resource {
            Some(resource) => resource,
            None => unreachable!("pooled resource accessed after release"),
        }
    }
}

impl<M: Manager> DerefMut for PooledResource<M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.resource {
            Some(resource) => resource,
            None => unreachable!("pooled resource accessed after release"),
        }
    }
}

impl<M: Manager> Drop for PooledResource<M> {
    fn drop(&mut self) {
        self.shared.give_back(self.id, self.resource.take());
    }
}

impl<M: Manager> fmt::Debug for PooledResource<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledResource")
            .field("id", &self.id)
            .field("present", &self.resource.is_some())
            .finish()
    }
}
