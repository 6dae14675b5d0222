//! # minutes-db
//!
//! PostgreSQL persistence for the minutes meeting processor.
//!
//! This crate provides:
//! - Connection pool management
//! - [`PgMeetingRepository`], the [`MeetingStore`] the job pipeline writes to
//!
//! ## Example
//!
//! ```rust,ignore
//! use minutes_db::{Database, MeetingFields, MeetingStatus, MeetingStore, PoolConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect_with_config("postgres://localhost/minutes", PoolConfig::from_env()).await?;
//!
//!     db.meetings
//!         .set_status(42, MeetingStatus::Processing, MeetingFields::none())
//!         .await?;
//!     Ok(())
//! }
//! ```
pub mod meetings;
pub mod pool;
pub mod test_fixtures;

// Re-export core types
pub use minutes_core::*;

pub use meetings::PgMeetingRepository;
pub use pool::{create_pool_with_config, log_pool_metrics, PoolConfig};

/// Database handle holding the pool and the meeting repository.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Meeting status and results.
    pub meetings: PgMeetingRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            meetings: PgMeetingRepository::new(pool.clone()),
            pool,
        }
    }

    /// Open a pool with `config` and wrap it.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Round-trip a trivial query to confirm the database answers.
    pub async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(true)
    }
}
