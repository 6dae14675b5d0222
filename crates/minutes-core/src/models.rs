//! Domain models for meetings and the jobs that process them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::Error;

/// Primary key of a meeting record.
pub type MeetingId = i64;

// =============================================================================
// MEETING
// =============================================================================

/// Lifecycle status of a meeting.
///
/// Transitions only move forward: `created/any -> processing -> {completed, failed}`.
/// Nothing leaves `completed` except a repeated `completed` write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    #[default]
    Created,
    Processing,
    Completed,
    Failed,
}

impl MeetingStatus {
    /// Database/wire representation (matches the `meeting_status` enum type).
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Created => "created",
            MeetingStatus::Processing => "processing",
            MeetingStatus::Completed => "completed",
            MeetingStatus::Failed => "failed",
        }
    }

    /// Whether this status ends a processing run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MeetingStatus::Completed | MeetingStatus::Failed)
    }

    /// Whether a write of `next` is allowed from this status.
    pub fn can_transition_to(&self, next: MeetingStatus) -> bool {
        match self {
            MeetingStatus::Completed => next == MeetingStatus::Completed,
            _ => true,
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(MeetingStatus::Created),
            "processing" => Ok(MeetingStatus::Processing),
            "completed" => Ok(MeetingStatus::Completed),
            "failed" => Ok(MeetingStatus::Failed),
            other => Err(Error::InvalidInput(format!(
                "Unknown meeting status: {}",
                other
            ))),
        }
    }
}

/// A meeting record as seen by the processor.
///
/// Descriptive columns (title, platform, recording size) belong to the
/// producer and are not read here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub status: MeetingStatus,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub action_items: Option<Vec<String>>,
    pub key_points: Option<Vec<String>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Optional columns written together with a status change.
///
/// `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeetingFields {
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub action_items: Option<Vec<String>>,
    pub key_points: Option<Vec<String>>,
}

impl MeetingFields {
    /// No extra columns: a bare status flip.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_none()
            && self.summary.is_none()
            && self.action_items.is_none()
            && self.key_points.is_none()
    }
}

/// Everything persisted atomically with `status = completed`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingResults {
    pub transcript: String,
    pub summary: String,
    pub action_items: Vec<String>,
    pub key_points: Option<Vec<String>>,
}

impl MeetingResults {
    /// Combine a transcript with its summary.
    pub fn new(transcript: String, summary: MeetingSummary) -> Self {
        Self {
            transcript,
            summary: summary.summary,
            action_items: summary.action_items,
            key_points: summary.key_points,
        }
    }
}

// =============================================================================
// SUMMARY
// =============================================================================

/// Summary and action items extracted from a transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetingSummary {
    pub summary: String,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_points: Option<Vec<String>>,
}

impl MeetingSummary {
    /// Summary text with no action items.
    pub fn fallback(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            action_items: Vec::new(),
            key_points: None,
        }
    }
}

/// Outcome of summarization. Never an error: the model's reply either parsed
/// or was replaced by fallback content.
#[derive(Debug, Clone, PartialEq)]
pub enum Summarized {
    /// The model produced a usable JSON reply.
    Parsed(MeetingSummary),
    /// Fallback content, with the reason the model's reply was not used.
    Degraded {
        summary: MeetingSummary,
        reason: String,
    },
}

impl Summarized {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Summarized::Degraded { .. })
    }

    pub fn summary(&self) -> &MeetingSummary {
        match self {
            Summarized::Parsed(summary) | Summarized::Degraded { summary, .. } => summary,
        }
    }

    pub fn into_summary(self) -> MeetingSummary {
        match self {
            Summarized::Parsed(summary) | Summarized::Degraded { summary, .. } => summary,
        }
    }
}

// =============================================================================
// JOB PAYLOAD
// =============================================================================

/// One unit of queued work, as pushed by the upload API.
///
/// Wire format: `{"id": 42, "file_path": "2024/standup.mp3"}`. Unknown keys,
/// including a stray `meeting_id`, are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingJob {
    #[serde(rename = "id", default)]
    pub meeting_id: Option<MeetingId>,
    #[serde(default)]
    pub file_path: Option<String>,
}

impl MeetingJob {
    pub fn new(meeting_id: MeetingId, file_path: impl Into<String>) -> Self {
        Self {
            meeting_id: Some(meeting_id),
            file_path: Some(file_path.into()),
        }
    }

    /// Deserialize a raw queue payload.
    pub fn from_payload(raw: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Serialize for pushing onto the queue.
    pub fn to_payload(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The meeting id if present and positive.
    pub fn valid_meeting_id(&self) -> Option<MeetingId> {
        self.meeting_id.filter(|id| *id > 0)
    }
}

/// Truncate to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Fallback summary text for a reply that could not be parsed.
pub fn raw_reply_fallback(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        defaults::SUMMARY_UNAVAILABLE.to_string()
    } else {
        truncate_chars(trimmed, defaults::SUMMARY_FALLBACK_CHARS).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            MeetingStatus::Created,
            MeetingStatus::Processing,
            MeetingStatus::Completed,
            MeetingStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<MeetingStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_unknown_is_invalid_input() {
        let err = "archived".parse::<MeetingStatus>().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&MeetingStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }

    #[test]
    fn test_completed_never_regresses() {
        let completed = MeetingStatus::Completed;
        assert!(!completed.can_transition_to(MeetingStatus::Processing));
        assert!(!completed.can_transition_to(MeetingStatus::Failed));
        assert!(!completed.can_transition_to(MeetingStatus::Created));
        assert!(completed.can_transition_to(MeetingStatus::Completed));
    }

    #[test]
    fn test_non_completed_statuses_move_forward() {
        assert!(MeetingStatus::Created.can_transition_to(MeetingStatus::Processing));
        assert!(MeetingStatus::Processing.can_transition_to(MeetingStatus::Completed));
        assert!(MeetingStatus::Processing.can_transition_to(MeetingStatus::Failed));
        assert!(MeetingStatus::Failed.can_transition_to(MeetingStatus::Processing));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(MeetingStatus::Completed.is_terminal());
        assert!(MeetingStatus::Failed.is_terminal());
        assert!(!MeetingStatus::Processing.is_terminal());
        assert!(!MeetingStatus::Created.is_terminal());
    }

    #[test]
    fn test_job_payload_uses_id_key() {
        let job = MeetingJob::from_payload(r#"{"id": 42, "file_path": "missing.mp3"}"#).unwrap();
        assert_eq!(job.meeting_id, Some(42));
        assert_eq!(job.file_path.as_deref(), Some("missing.mp3"));

        let payload = job.to_payload().unwrap();
        assert!(payload.contains("\"id\":42"));
    }

    #[test]
    fn test_job_payload_reads_only_the_id_key() {
        let both =
            MeetingJob::from_payload(r#"{"id": 3, "meeting_id": 9, "file_path": "a.wav"}"#)
                .unwrap();
        assert_eq!(both.valid_meeting_id(), Some(3));

        let legacy = MeetingJob::from_payload(r#"{"meeting_id": 9, "file_path": "a.wav"}"#).unwrap();
        assert_eq!(legacy.valid_meeting_id(), None);
    }

    #[test]
    fn test_job_payload_missing_id_still_deserializes() {
        let job = MeetingJob::from_payload(r#"{"file_path": "a.wav"}"#).unwrap();
        assert_eq!(job.valid_meeting_id(), None);
    }

    #[test]
    fn test_job_payload_zero_id_is_invalid() {
        let job = MeetingJob::from_payload(r#"{"id": 0, "file_path": "a.wav"}"#).unwrap();
        assert_eq!(job.valid_meeting_id(), None);
    }

    #[test]
    fn test_job_payload_garbage_is_serialization_error() {
        let err = MeetingJob::from_payload("not json").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_fields_none_is_empty() {
        assert!(MeetingFields::none().is_empty());
        let fields = MeetingFields {
            summary: Some("s".into()),
            ..Default::default()
        };
        assert!(!fields.is_empty());
    }

    #[test]
    fn test_results_from_summary() {
        let summary = MeetingSummary {
            summary: "Shipped".into(),
            action_items: vec!["Tag release".into()],
            key_points: None,
        };
        let results = MeetingResults::new("hello".into(), summary);
        assert_eq!(results.transcript, "hello");
        assert_eq!(results.summary, "Shipped");
        assert_eq!(results.action_items, vec!["Tag release".to_string()]);
    }

    #[test]
    fn test_summarized_accessors() {
        let degraded = Summarized::Degraded {
            summary: MeetingSummary::fallback("No transcript available"),
            reason: "empty transcript".into(),
        };
        assert!(degraded.is_degraded());
        assert_eq!(degraded.summary().summary, "No transcript available");
        assert!(degraded.into_summary().action_items.is_empty());
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_raw_reply_fallback() {
        assert_eq!(
            raw_reply_fallback("I cannot summarize this."),
            "I cannot summarize this."
        );
        assert_eq!(raw_reply_fallback("   "), defaults::SUMMARY_UNAVAILABLE);

        let long = "x".repeat(defaults::SUMMARY_FALLBACK_CHARS + 50);
        assert_eq!(
            raw_reply_fallback(&long).chars().count(),
            defaults::SUMMARY_FALLBACK_CHARS
        );
    }
}
