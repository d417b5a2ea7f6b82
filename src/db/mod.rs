//! Connection pool and schema setup for the `PostgreSQL` remote.
//!
//! SYSTEM CONTEXT
//! ==============
//! The sync agent (and the live database tests) call `init_pool` once before
//! building a `PgRemote`. Point reads and column writes share the pool; each
//! change feed takes a connection out of it for its `LISTEN` session and
//! detaches it, so feeds never starve writes.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::env_parse;

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Connect, apply the `projects` migrations, and return the pool.
///
/// Pool size and acquire timeout come from `DB_MAX_CONNECTIONS` and
/// `DB_ACQUIRE_TIMEOUT_SECS`.
///
/// # Errors
///
/// Returns an error if the connection or a migration fails.
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let max_connections = env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
    let acquire_timeout = Duration::from_secs(env_parse("DB_ACQUIRE_TIMEOUT_SECS", DEFAULT_DB_ACQUIRE_TIMEOUT_SECS));

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;
    info!(max_connections, "database ready; projects schema migrated");

    Ok(pool)
}
