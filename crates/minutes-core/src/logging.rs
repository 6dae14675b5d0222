//! Structured logging schema and field name constants.
//!
//! All crates use these names for consistent structured logging fields so that
//! log aggregation can follow one meeting through every stage of its job.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Job failed, service unreachable, status write lost |
//! | WARN  | Degraded summary, dropped payload, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), job start and completion |
//! | DEBUG | Request details, intermediate values, config choices |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "queue", "jobs", "db", "inference"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "consumer", "pipeline", "whisper", "ollama", "pool"
pub const COMPONENT: &str = "component";

/// Meeting id the job targets.
pub const MEETING_ID: &str = "meeting_id";

/// Pipeline stage the event belongs to (see [`stage`]).
pub const STAGE: &str = "stage";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of a transcript.
pub const TRANSCRIPT_LEN: &str = "transcript_len";

/// Number of action items extracted.
pub const ACTION_ITEM_COUNT: &str = "action_item_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Outcome label of a finished job.
pub const OUTCOME: &str = "outcome";

/// Stage names used as the value of the [`STAGE`] field.
pub mod stage {
    pub const QUEUE: &str = "queue";
    pub const VALIDATE: &str = "validate";
    pub const PROCESSING: &str = "processing";
    pub const TRANSCRIPTION: &str = "transcription";
    pub const SUMMARIZATION: &str = "summarization";
    pub const PERSISTENCE: &str = "persistence";
    pub const MARK_FAILED: &str = "mark_failed";
}
