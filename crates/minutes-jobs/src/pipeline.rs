//! The meeting job pipeline: processing → transcription → summarization → save.
//!
//! Every stage result is folded into a [`JobOutcome`]; the pipeline alone maps
//! outcomes to status writes. A validated job whose `processing` write landed
//! gets exactly one terminal write (`completed` or `failed`).

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use minutes_core::logging::stage;
use minutes_core::{
    Error, MeetingFields, MeetingId, MeetingJob, MeetingResults, MeetingStatus, MeetingStore,
    SummarizationBackend, Summarized, TranscriptionBackend,
};

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Results saved with a parsed summary.
    Completed,
    /// Results saved, but the summary is fallback content.
    SummarizationDegraded { reason: String },
    /// Payload had no usable meeting id; nothing was written.
    Rejected { reason: String },
    /// The recording could not be transcribed; meeting marked failed.
    TranscriptionFailed { error: String },
    /// A store write failed for a reason other than a missing meeting.
    PersistenceFailed { error: String },
    /// The meeting does not exist (or vanished mid-job).
    NotFound { error: String },
    /// The meeting was already completed; the job was skipped.
    AlreadyCompleted,
}

impl JobOutcome {
    /// True when the meeting ends up completed.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            JobOutcome::Completed
                | JobOutcome::SummarizationDegraded { .. }
                | JobOutcome::AlreadyCompleted
        )
    }

    /// The terminal status this outcome wrote (or attempted to write), if any.
    pub fn terminal_status(&self) -> Option<MeetingStatus> {
        match self {
            JobOutcome::Completed | JobOutcome::SummarizationDegraded { .. } => {
                Some(MeetingStatus::Completed)
            }
            JobOutcome::TranscriptionFailed { .. }
            | JobOutcome::PersistenceFailed { .. }
            | JobOutcome::NotFound { .. } => Some(MeetingStatus::Failed),
            JobOutcome::Rejected { .. } | JobOutcome::AlreadyCompleted => None,
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            JobOutcome::Completed => "completed",
            JobOutcome::SummarizationDegraded { .. } => "summarization_degraded",
            JobOutcome::Rejected { .. } => "rejected",
            JobOutcome::TranscriptionFailed { .. } => "transcription_failed",
            JobOutcome::PersistenceFailed { .. } => "persistence_failed",
            JobOutcome::NotFound { .. } => "not_found",
            JobOutcome::AlreadyCompleted => "already_completed",
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::SummarizationDegraded { reason } | JobOutcome::Rejected { reason } => {
                write!(f, "{}: {}", self.label(), reason)
            }
            JobOutcome::TranscriptionFailed { error }
            | JobOutcome::PersistenceFailed { error }
            | JobOutcome::NotFound { error } => write!(f, "{}: {}", self.label(), error),
            _ => f.write_str(self.label()),
        }
    }
}

/// Runs one meeting job against the store and the AI services.
#[derive(Clone)]
pub struct MeetingPipeline {
    store: Arc<dyn MeetingStore>,
    transcriber: Arc<dyn TranscriptionBackend>,
    summarizer: Arc<dyn SummarizationBackend>,
}

impl MeetingPipeline {
    pub fn new(
        store: Arc<dyn MeetingStore>,
        transcriber: Arc<dyn TranscriptionBackend>,
        summarizer: Arc<dyn SummarizationBackend>,
    ) -> Self {
        Self {
            store,
            transcriber,
            summarizer,
        }
    }

    /// Execute `job` to completion or to a recorded failure.
    pub async fn process(&self, job: &MeetingJob) -> JobOutcome {
        let Some(meeting_id) = job.valid_meeting_id() else {
            let reason = match job.meeting_id {
                Some(id) => format!("invalid meeting id {}", id),
                None => "job has no meeting id".to_string(),
            };
            warn!(
                subsystem = "jobs",
                component = "pipeline",
                stage = stage::VALIDATE,
                %reason,
                "Dropping job"
            );
            return JobOutcome::Rejected { reason };
        };

        let start = Instant::now();
        info!(
            subsystem = "jobs",
            component = "pipeline",
            meeting_id,
            file_path = job.file_path.as_deref().unwrap_or(""),
            "Processing meeting job"
        );

        let outcome = self.run(meeting_id, job.file_path.as_deref()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        if outcome.is_success() {
            info!(
                subsystem = "jobs",
                component = "pipeline",
                meeting_id,
                outcome = outcome.label(),
                duration_ms,
                "Meeting job finished"
            );
        } else {
            error!(
                subsystem = "jobs",
                component = "pipeline",
                meeting_id,
                outcome = outcome.label(),
                error = %outcome,
                duration_ms,
                "Meeting job failed"
            );
        }
        outcome
    }

    async fn run(&self, meeting_id: MeetingId, file_path: Option<&str>) -> JobOutcome {
        // Nothing else is written unless the processing write lands.
        if let Err(e) = self
            .store
            .set_status(meeting_id, MeetingStatus::Processing, MeetingFields::none())
            .await
        {
            warn!(meeting_id, stage = stage::PROCESSING, error = %e, "Processing status write failed");
            return match e {
                Error::MeetingNotFound(_) => JobOutcome::NotFound {
                    error: e.to_string(),
                },
                Error::StatusConflict {
                    current: MeetingStatus::Completed,
                    ..
                } => JobOutcome::AlreadyCompleted,
                other => JobOutcome::PersistenceFailed {
                    error: other.to_string(),
                },
            };
        }

        let transcribed = match file_path {
            Some(path) => self.transcriber.transcribe(path).await,
            None => Err(Error::InvalidInput("job has no file_path".to_string())),
        };
        let transcript = match transcribed {
            Ok(transcript) => transcript,
            Err(e) => {
                error!(meeting_id, stage = stage::TRANSCRIPTION, error = %e, "Transcription failed");
                self.mark_failed(meeting_id).await;
                return JobOutcome::TranscriptionFailed {
                    error: e.to_string(),
                };
            }
        };

        let summarized = self.summarizer.summarize(&transcript).await;
        let degraded_reason = match &summarized {
            Summarized::Degraded { reason, .. } => {
                warn!(meeting_id, stage = stage::SUMMARIZATION, %reason, "Using fallback summary");
                Some(reason.clone())
            }
            Summarized::Parsed(_) => None,
        };

        let results = MeetingResults::new(transcript, summarized.into_summary());
        match self.store.save_results(meeting_id, &results).await {
            Ok(()) => {
                info!(
                    meeting_id,
                    stage = stage::PERSISTENCE,
                    transcript_len = results.transcript.len(),
                    action_item_count = results.action_items.len(),
                    "Meeting results saved"
                );
                match degraded_reason {
                    Some(reason) => JobOutcome::SummarizationDegraded { reason },
                    None => JobOutcome::Completed,
                }
            }
            Err(e) => {
                error!(meeting_id, stage = stage::PERSISTENCE, error = %e, "Saving results failed");
                self.mark_failed(meeting_id).await;
                if matches!(e, Error::MeetingNotFound(_)) {
                    JobOutcome::NotFound {
                        error: e.to_string(),
                    }
                } else {
                    JobOutcome::PersistenceFailed {
                        error: e.to_string(),
                    }
                }
            }
        }
    }

    /// Best-effort `failed` write. Errors are logged and swallowed.
    pub async fn mark_failed(&self, meeting_id: MeetingId) {
        if let Err(e) = self.store.mark_failed(meeting_id).await {
            error!(
                meeting_id,
                stage = stage::MARK_FAILED,
                error = %e,
                "Could not mark meeting failed"
            );
        }
    }
}
