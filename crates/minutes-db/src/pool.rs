//! PostgreSQL pool for the worker.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use minutes_core::defaults::{
    self, DB_ACQUIRE_TIMEOUT_SECS, DB_IDLE_TIMEOUT_SECS, DB_MAX_CONNECTIONS,
    DB_MAX_LIFETIME_SECS, DB_MIN_CONNECTIONS, ENV_DB_MAX_CONNECTIONS,
};
use minutes_core::{Error, Result};

/// Sizing and timeouts for the meeting store's pool.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a caller waits for a free connection.
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DB_MAX_CONNECTIONS,
            min_connections: DB_MIN_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DB_ACQUIRE_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DB_IDLE_TIMEOUT_SECS),
            max_lifetime: Duration::from_secs(DB_MAX_LIFETIME_SECS),
        }
    }
}

impl PoolConfig {
    /// Defaults, with `DB_MAX_CONNECTIONS` (default `15`, floor `1`) applied.
    pub fn from_env() -> Self {
        let max = defaults::env_or(ENV_DB_MAX_CONNECTIONS, DB_MAX_CONNECTIONS);
        Self::default().with_max_connections(max)
    }

    /// Cap the pool at `n` connections. The floor stays at or below the cap.
    pub fn with_max_connections(mut self, n: u32) -> Self {
        self.max_connections = n.max(1);
        self.min_connections = self.min_connections.min(self.max_connections);
        self
    }
}

/// Open the pool and wait for its first connection.
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    if database_url.trim().is_empty() {
        return Err(Error::Config("database URL is empty".to_string()));
    }

    let start = Instant::now();
    debug!(
        subsystem = "db",
        component = "pool",
        max_connections = config.max_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        "Opening meeting store pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .test_before_acquire(true)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        pool_size = pool.size(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Meeting store pool ready"
    );
    Ok(pool)
}

/// Log pool occupancy; warn when every connection is checked out.
pub fn log_pool_metrics(pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle();
    debug!(subsystem = "db", component = "pool", size, idle, "Pool occupancy");

    if size > 0 && idle == 0 {
        warn!(subsystem = "db", component = "pool", size, "No idle database connections");
    }
}
