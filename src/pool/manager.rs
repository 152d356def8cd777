//! Connection-factory contract used by [`super::ResourcePool`].

use std::future::Future;

/// Creates, probes and destroys the resources a pool hands out.
///
/// The pool never shares a resource between holders, so implementations
/// only have to be `Sync` for the factory itself, not for the resource.
pub trait Manager: Send + Sync + 'static {
    /// The pooled resource, typically a database connection.
    type Resource: Send + 'static;

    /// Error returned when a new resource cannot be opened.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Opens a new resource.
    fn create(&self) -> impl Future<Output = Result<Self::Resource, Self::Error>> + Send;

    /// Liveness probe run before an idle resource is handed out.
    ///
    /// Returning `false` makes the pool destroy the resource and open a
    /// replacement in its slot.
    fn is_alive(&self, resource: &mut Self::Resource) -> impl Future<Output = bool> + Send;

    /// Cheap synchronous check performed when a resource is released.
    ///
    /// A broken resource is destroyed instead of going back to the idle
    /// list.
    fn has_broken(&self, _resource: &mut Self::Resource) -> bool {
        false
    }

    /// Tears down a resource that leaves the pool.
    fn destroy(&self, resource: Self::Resource) {
        drop(resource);
    }
}
