//! PostgreSQL connection factory for the [`ResourcePool`].

use std::fmt;

use sqlx::Connection;
use sqlx::postgres::{PgConnectOptions, PgConnection};

use crate::pool::{Manager, ResourcePool};

/// Pool of raw PostgreSQL connections.
pub type DbPool = ResourcePool<PgManager>;

/// Opens, pings and closes [`PgConnection`]s.
pub struct PgManager {
    options: PgConnectOptions,
}

impl PgManager {
    /// Builds a manager from a `postgres://` connection string.
    ///
    /// Nothing is connected until the pool asks for a connection.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error::Configuration`] if the URL cannot be parsed.
    pub fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        Ok(Self::from_options(database_url.parse()?))
    }

    /// Builds a manager from prepared connect options.
    #[must_use]
    pub fn from_options(options: PgConnectOptions) -> Self {
        Self { options }
    }
}

impl Manager for PgManager {
    type Resource = PgConnection;
    type Error = sqlx::Error;

    async fn create(&self) -> Result<PgConnection, sqlx::Error> {
        let conn = PgConnection::connect_with(&self.options).await?;
        tracing::debug!(host = self.options.get_host(), "opened postgres connection");
        Ok(conn)
    }

    async fn is_alive(&self, conn: &mut PgConnection) -> bool {
        match conn.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "postgres connection failed ping");
                false
            }
        }
    }

    fn destroy(&self, conn: PgConnection) {
        // Close politely when a runtime is around, otherwise just drop the socket.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = conn.close().await {
                    tracing::debug!(error = %e, "postgres connection did not close cleanly");
                }
            });
        }
    }
}

impl fmt::Debug for PgManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgManager")
            .field("host", &self.options.get_host())
            .field("port", &self.options.get_port())
            .field("database", &self.options.get_database())
            .finish_non_exhaustive()
    }
}
