//! Seams between the job pipeline and its collaborators.
//!
//! The pipeline only sees these traits; the Postgres store, the Redis queue and
//! the HTTP clients live in their own crates and are swapped for in-memory
//! doubles in tests.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Meeting, MeetingFields, MeetingId, MeetingResults, MeetingStatus, Summarized,
};

// =============================================================================
// STORE
// =============================================================================

/// Durable meeting state. Every write is a single transactional update keyed
/// by meeting id.
///
/// All writes return [`Error::MeetingNotFound`](crate::Error::MeetingNotFound)
/// when no record matches.
#[async_trait]
pub trait MeetingStore: Send + Sync {
    /// Update status plus any provided fields atomically.
    ///
    /// `completed` is refused with [`Error::InvalidInput`](crate::Error::InvalidInput):
    /// only [`save_results`](Self::save_results) completes a meeting. Any write
    /// onto a `completed` meeting returns
    /// [`Error::StatusConflict`](crate::Error::StatusConflict) and changes nothing.
    async fn set_status(
        &self,
        id: MeetingId,
        status: MeetingStatus,
        fields: MeetingFields,
    ) -> Result<()>;

    /// Persist transcript, summary and action items together with `status = completed`.
    async fn save_results(&self, id: MeetingId, results: &MeetingResults) -> Result<()>;

    /// Flip status to `failed`, leaving any stored results untouched.
    async fn mark_failed(&self, id: MeetingId) -> Result<()>;

    /// Read a meeting record.
    async fn get(&self, id: MeetingId) -> Result<Option<Meeting>>;
}

// =============================================================================
// AI SERVICES
// =============================================================================

/// Speech-to-text backend.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Transcribe the recording at `file_path` (relative to the uploads root).
    async fn transcribe(&self, file_path: &str) -> Result<String>;

    /// Check if the transcription service is reachable.
    async fn health_check(&self) -> Result<bool>;
}

/// Transcript summarization backend. Infallible by contract: failures degrade
/// to fallback content.
#[async_trait]
pub trait SummarizationBackend: Send + Sync {
    /// Summarize a transcript and extract action items.
    async fn summarize(&self, transcript: &str) -> Summarized;

    /// Check if the generation service is reachable.
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

// =============================================================================
// QUEUE
// =============================================================================

/// List-like job queue with a blocking pop.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Wait up to `wait` for the next raw payload. `Ok(None)` on timeout.
    async fn pop(&self, wait: Duration) -> Result<Option<String>>;

    /// Append a raw payload to the tail of the queue.
    async fn push(&self, payload: &str) -> Result<()>;

    /// Queue name, for logging.
    fn name(&self) -> &str;
}
