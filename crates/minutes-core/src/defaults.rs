//! Centralized default constants for the meeting processor.
//!
//! **This module is the single source of truth** for shared default values and
//! environment variable names. Components read their configuration through
//! `from_env()` constructors that fall back to these values.

// =============================================================================
// QUEUE
// =============================================================================

/// Name of the Redis list the upload API pushes jobs onto.
pub const QUEUE_NAME: &str = "meeting_jobs";

/// Default Redis host.
pub const REDIS_HOST: &str = "localhost";

/// Default Redis port.
pub const REDIS_PORT: u16 = 6379;

/// Seconds a single blocking pop waits before the consumer re-checks for shutdown.
pub const QUEUE_WAIT_SECS: u64 = 5;

/// Pause after a failed queue read before waiting again.
pub const QUEUE_ERROR_PAUSE_MS: u64 = 1000;

/// Buffered consumer events per subscriber before slow receivers start lagging.
pub const CONSUMER_EVENT_CAPACITY: usize = 256;

// =============================================================================
// DATABASE
// =============================================================================

/// Pool ceiling: five steady connections plus ten overflow.
pub const DB_MAX_CONNECTIONS: u32 = 15;

/// Connections kept warm in the pool.
pub const DB_MIN_CONNECTIONS: u32 = 1;

/// Seconds to wait for a pooled connection.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Seconds an unused connection may sit idle before it is closed.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Seconds before a connection is recycled regardless of use.
pub const DB_MAX_LIFETIME_SECS: u64 = 1800;

// =============================================================================
// TRANSCRIPTION
// =============================================================================

/// Default base URL of the Whisper ASR webservice.
pub const WHISPER_API_URL: &str = "http://localhost:9000";

/// Transcription requests can take minutes for long recordings.
pub const WHISPER_TIMEOUT_SECS: u64 = 300;

/// Multipart field carrying the audio bytes.
pub const WHISPER_AUDIO_FIELD: &str = "audio_file";

/// Directory recordings are resolved against.
pub const UPLOADS_DIR: &str = "./uploads";

// =============================================================================
// SUMMARIZATION
// =============================================================================

/// Default Ollama host.
pub const OLLAMA_HOST: &str = "localhost";

/// Default Ollama port.
pub const OLLAMA_PORT: u16 = 11434;

/// Default generation model.
pub const OLLAMA_MODEL: &str = "mistral";

/// Timeout for a summarization request (seconds).
pub const OLLAMA_TIMEOUT_SECS: u64 = 300;

/// Transcript characters sent to the model. Keeps the prompt inside an 8k-token window.
pub const SUMMARY_MAX_TRANSCRIPT_CHARS: usize = 12_000;

/// Characters of an unparsable reply kept as the fallback summary.
pub const SUMMARY_FALLBACK_CHARS: usize = 500;

/// Summary written when there was no transcript to summarize.
pub const NO_TRANSCRIPT_SUMMARY: &str = "No transcript available";

/// Summary written when the model could not be reached or replied with nothing.
pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable";

// =============================================================================
// HEALTH PROBES
// =============================================================================

/// Timeout for startup health probes (seconds).
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
pub const ENV_REDIS_URL: &str = "REDIS_URL";
pub const ENV_REDIS_HOST: &str = "REDIS_HOST";
pub const ENV_REDIS_PORT: &str = "REDIS_PORT";
pub const ENV_QUEUE_NAME: &str = "QUEUE_NAME";
pub const ENV_QUEUE_WAIT_SECS: &str = "QUEUE_WAIT_SECS";
pub const ENV_UPLOADS_DIR: &str = "UPLOADS_DIR";
pub const ENV_WHISPER_API_URL: &str = "WHISPER_API_URL";
pub const ENV_WHISPER_TIMEOUT_SECS: &str = "WHISPER_TIMEOUT_SECS";
pub const ENV_OLLAMA_BASE: &str = "OLLAMA_BASE";
pub const ENV_OLLAMA_HOST: &str = "OLLAMA_HOST";
pub const ENV_OLLAMA_PORT: &str = "OLLAMA_PORT";
pub const ENV_OLLAMA_MODEL: &str = "OLLAMA_MODEL";
pub const ENV_OLLAMA_TIMEOUT_SECS: &str = "OLLAMA_TIMEOUT_SECS";
pub const ENV_SUMMARY_MAX_TRANSCRIPT_CHARS: &str = "SUMMARY_MAX_TRANSCRIPT_CHARS";

/// Read an environment variable and parse it, falling back to `default` when
/// unset or unparsable.
pub fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Read a non-empty string environment variable.
pub fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
