//! Persistence layer: PostgreSQL connections, schema and queries.
//!
//! Connections come from the crate's own [`crate::pool::ResourcePool`]
//! through [`PgManager`]; queries in [`postgres`] run on one checked-out
//! connection at a time.

pub mod connection;
pub mod models;
pub mod postgres;

pub use connection::{DbPool, PgManager};
