//! Database gateway: a single bb8 connection pool over `tokio_postgres`,
//! parameterised by the two search-path schemas NLDI reads from. Every query
//! elsewhere in the crate goes through [`DbPool::with_session`] so that
//! session acquisition/release and the `search_path` are handled in one
//! place (spec.md §4.1).

use std::time::Duration;

use bb8_postgres::PostgresConnectionManager;
use tokio_postgres::NoTls;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

pub type PooledConnection<'a> =
    bb8::PooledConnection<'a, PostgresConnectionManager<NoTls>>;

/// Schemas consulted by this system: `nhdplus` is the upstream-curated
/// reference hydrography; `nldi_data` is the crawler-managed feature tables
/// plus the administratively-writable `crawler_source` table.
const SEARCH_PATH: &str = "nhdplus, nldi_data, public";

#[derive(Clone)]
pub struct DbPool {
    pool: bb8::Pool<PostgresConnectionManager<NoTls>>,
    acquire_timeout: Duration,
}

impl DbPool {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let conn_string = format!(
            "host={} port={} dbname={} user={} password={} options='-c search_path={}'",
            config.host, config.port, config.name, config.username, config.password, SEARCH_PATH
        );

        let manager = PostgresConnectionManager::new_from_stringlike(conn_string, NoTls)
            .map_err(|e| Error::ConfigurationError {
                message: format!("invalid database configuration: {e}"),
            })?;

        let pool = bb8::Pool::builder()
            .max_size(config.pool_size)
            .build(manager)
            .await
            .map_err(|e| Error::DatabaseUnavailable {
                message: format!("failed to build connection pool: {e}"),
            })?;

        Ok(DbPool {
            pool,
            acquire_timeout: Duration::from_millis(config.pool_timeout_ms),
        })
    }

    /// Scoped acquisition of a pooled session: `f` gets a live connection,
    /// and the connection is released back to the pool on every exit path
    /// (success, application error, or panic-unwind through the guard's
    /// drop), including when `f` itself fails.
    pub async fn with_session<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(PooledConnection<'_>) -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let conn = tokio::time::timeout(self.acquire_timeout, self.pool.get())
            .await
            .map_err(|_| Error::DatabaseUnavailable {
                message: "timed out waiting for a database connection".to_owned(),
            })?
            .map_err(|e| Error::DatabaseUnavailable {
                message: format!("failed to acquire connection: {e}"),
            })?;

        f(conn).await
    }
}
