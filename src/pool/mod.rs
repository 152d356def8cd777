//! Bounded connection pool.
//!
//! [`ResourcePool`] hands out exclusive handles produced by a [`Manager`]
//! to concurrent request handlers. The pool grows lazily toward
//! `min_size`, never exceeds `max_size`, probes every handle before
//! giving it out and drains all handles on [`ResourcePool::close`].
//!
//! Handles are returned through the [`PooledResource`] guard, so a
//! handler that errors out or whose future is dropped still gives its
//! connection back.

pub mod manager;
pub mod pooled;
pub mod resource_pool;

pub use manager::Manager;
pub use pooled::PooledResource;
pub use resource_pool::{PoolOptions, PoolStatus, ResourcePool};

/// Errors surfaced by [`ResourcePool`].
///
/// An unhealthy handle is never reported here: it is replaced during
/// acquisition. Only a failure to create the replacement surfaces, as
/// [`PoolError::Create`].
#[derive(Debug, thiserror::Error)]
pub enum PoolError<E> {
    /// The pool is closing or closed and accepts no new acquisitions.
    #[error("pool is closed")]
    Closed,

    /// `min_size` is larger than a bounded `max_size`.
    #[error("invalid pool bounds: min_size {min_size} exceeds max_size {max_size}")]
    InvalidConfig {
        /// Requested minimum size.
        min_size: usize,
        /// Requested maximum size.
        max_size: usize,
    },

    /// The manager failed to open a new resource while the pool was growing.
    #[error("failed to create pooled resource: {0}")]
    Create(#[source] E),
}
