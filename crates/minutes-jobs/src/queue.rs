//! Redis list transport for meeting jobs.
//!
//! The upload API appends payloads with `RPUSH`; consumers take them from the
//! head with `BLPOP`, so delivery is FIFO and each payload reaches exactly one
//! consumer.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use minutes_core::defaults::{
    self, ENV_QUEUE_NAME, ENV_REDIS_HOST, ENV_REDIS_PORT, ENV_REDIS_URL, QUEUE_NAME, REDIS_HOST,
    REDIS_PORT,
};
use minutes_core::{Error, JobQueue, MeetingId, MeetingJob, Result};

/// Where the job queue lives.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueConfig {
    /// Redis connection URL.
    pub url: String,
    /// Name of the list holding job payloads.
    pub name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: format!("redis://{}:{}", REDIS_HOST, REDIS_PORT),
            name: QUEUE_NAME.to_string(),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `REDIS_URL` | *(unset)* | Full URL; overrides host and port |
    /// | `REDIS_HOST` | `localhost` | Redis host |
    /// | `REDIS_PORT` | `6379` | Redis port |
    /// | `QUEUE_NAME` | `meeting_jobs` | List name |
    pub fn from_env() -> Self {
        let url = defaults::env_string(ENV_REDIS_URL).unwrap_or_else(|| {
            let host =
                defaults::env_string(ENV_REDIS_HOST).unwrap_or_else(|| REDIS_HOST.to_string());
            let port = defaults::env_or(ENV_REDIS_PORT, REDIS_PORT);
            format!("redis://{}:{}", host, port)
        });
        let name = defaults::env_string(ENV_QUEUE_NAME).unwrap_or_else(|| QUEUE_NAME.to_string());
        Self { url, name }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// URL with credentials masked, for logging.
    pub fn redacted_url(&self) -> String {
        match (self.url.find("://"), self.url.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                format!("{}://***{}", &self.url[..scheme_end], &self.url[at..])
            }
            _ => self.url.clone(),
        }
    }
}

/// [`JobQueue`] over a Redis list.
#[derive(Clone)]
pub struct RedisJobQueue {
    conn: ConnectionManager,
    name: String,
}

impl RedisJobQueue {
    /// Connect and verify the server answers `PING`.
    ///
    /// The first connection is a single attempt: a refused or silent server is
    /// reported at once. Only after it answers is the reconnecting manager built.
    pub async fn connect(config: &QueueConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| Error::Queue(format!("Invalid Redis URL: {}", e)))?;

        let mut first = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Queue(format!("Failed to connect to Redis: {}", e)))?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut first)
            .await
            .map_err(|e| Error::Queue(format!("PING failed: {}", e)))?;
        debug!(reply = %pong, "Redis PING");

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::Queue(format!("Failed to connect to Redis: {}", e)))?;
        let queue = Self {
            conn,
            name: config.name.clone(),
        };

        info!(
            subsystem = "queue",
            component = "redis",
            url = %config.redacted_url(),
            queue = %queue.name,
            "Connected to job queue"
        );
        Ok(queue)
    }

    /// Number of payloads waiting.
    pub async fn len(&self) -> Result<usize> {
        let mut conn = self.conn.clone();
        conn.llen(&self.name)
            .await
            .map_err(|e| Error::Queue(format!("LLEN failed: {}", e)))
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn pop(&self, wait: Duration) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let popped: Option<(String, String)> = conn
            .blpop(&self.name, wait.as_secs_f64())
            .await
            .map_err(|e| Error::Queue(format!("BLPOP failed: {}", e)))?;
        Ok(popped.map(|(_, payload)| payload))
    }

    async fn push(&self, payload: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn
            .rpush(&self.name, payload)
            .await
            .map_err(|e| Error::Queue(format!("RPUSH failed: {}", e)))?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Push a job for `meeting_id` the way the upload API does.
pub async fn enqueue(queue: &dyn JobQueue, meeting_id: MeetingId, file_path: &str) -> Result<()> {
    if meeting_id <= 0 {
        return Err(Error::InvalidInput(format!(
            "meeting id must be positive, got {}",
            meeting_id
        )));
    }

    let payload = MeetingJob::new(meeting_id, file_path).to_payload()?;
    queue.push(&payload).await?;

    info!(
        subsystem = "queue",
        meeting_id,
        queue = %queue.name(),
        "Job enqueued"
    );
    Ok(())
}
