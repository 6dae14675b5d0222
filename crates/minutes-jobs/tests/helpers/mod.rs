//! In-memory doubles for pipeline and consumer tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use minutes_jobs::{
    Error, JobQueue, Meeting, MeetingFields, MeetingId, MeetingPipeline, MeetingResults,
    MeetingStatus, MeetingStore, MeetingSummary, Result, SummarizationBackend, Summarized,
    TranscriptionBackend,
};

// ============================================================================
// STORE
// ============================================================================

/// A store call as the pipeline issued it, recorded whether or not it succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    SetStatus(MeetingId, MeetingStatus),
    SaveResults(MeetingId),
    MarkFailed(MeetingId),
}

/// Store with the same zero-row and forward-only rules as the Postgres one.
#[derive(Default)]
pub struct InMemoryStore {
    meetings: Mutex<HashMap<MeetingId, Meeting>>,
    calls: Mutex<Vec<StoreCall>>,
    vanish_after_processing: Mutex<HashSet<MeetingId>>,
    fail_processing: Mutex<Option<String>>,
    fail_save: Mutex<Option<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with meetings in `created` status.
    pub fn with_meetings(ids: &[MeetingId]) -> Self {
        let store = Self::new();
        for id in ids {
            store.insert(*id, MeetingStatus::Created);
        }
        store
    }

    pub fn insert(&self, id: MeetingId, status: MeetingStatus) {
        self.meetings.lock().unwrap().insert(
            id,
            Meeting {
                id,
                status,
                transcript: None,
                summary: None,
                action_items: None,
                key_points: None,
                created_at: None,
                updated_at: None,
            },
        );
    }

    /// Delete the meeting right after its processing write succeeds.
    pub fn vanish_after_processing(&self, id: MeetingId) {
        self.vanish_after_processing.lock().unwrap().insert(id);
    }

    /// Make every processing write fail with an internal error.
    pub fn fail_processing(&self, message: &str) {
        *self.fail_processing.lock().unwrap() = Some(message.to_string());
    }

    /// Make every save fail with an internal error.
    pub fn fail_save(&self, message: &str) {
        *self.fail_save.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn meeting(&self, id: MeetingId) -> Option<Meeting> {
        self.meetings.lock().unwrap().get(&id).cloned()
    }

    pub fn status(&self, id: MeetingId) -> Option<MeetingStatus> {
        self.meeting(id).map(|m| m.status)
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MeetingStore for InMemoryStore {
    async fn set_status(
        &self,
        id: MeetingId,
        status: MeetingStatus,
        fields: MeetingFields,
    ) -> Result<()> {
        self.record(StoreCall::SetStatus(id, status));

        if status == MeetingStatus::Completed {
            return Err(Error::InvalidInput(format!(
                "meeting {} can only be completed by saving its results",
                id
            )));
        }
        if status == MeetingStatus::Processing {
            if let Some(message) = self.fail_processing.lock().unwrap().clone() {
                return Err(Error::Internal(message));
            }
        }

        {
            let mut meetings = self.meetings.lock().unwrap();
            let meeting = meetings.get_mut(&id).ok_or(Error::MeetingNotFound(id))?;
            if !meeting.status.can_transition_to(status) {
                return Err(Error::StatusConflict {
                    id,
                    current: meeting.status,
                });
            }
            meeting.status = status;
            if let Some(transcript) = fields.transcript {
                meeting.transcript = Some(transcript);
            }
            if let Some(summary) = fields.summary {
                meeting.summary = Some(summary);
            }
            if let Some(action_items) = fields.action_items {
                meeting.action_items = Some(action_items);
            }
            if let Some(key_points) = fields.key_points {
                meeting.key_points = Some(key_points);
            }
        }

        if status == MeetingStatus::Processing
            && self.vanish_after_processing.lock().unwrap().contains(&id)
        {
            self.meetings.lock().unwrap().remove(&id);
        }
        Ok(())
    }

    async fn save_results(&self, id: MeetingId, results: &MeetingResults) -> Result<()> {
        self.record(StoreCall::SaveResults(id));

        if let Some(message) = self.fail_save.lock().unwrap().clone() {
            return Err(Error::Internal(message));
        }

        let mut meetings = self.meetings.lock().unwrap();
        let meeting = meetings.get_mut(&id).ok_or(Error::MeetingNotFound(id))?;
        meeting.status = MeetingStatus::Completed;
        meeting.transcript = Some(results.transcript.clone());
        meeting.summary = Some(results.summary.clone());
        meeting.action_items = Some(results.action_items.clone());
        meeting.key_points = results.key_points.clone();
        Ok(())
    }

    async fn mark_failed(&self, id: MeetingId) -> Result<()> {
        self.record(StoreCall::MarkFailed(id));

        let mut meetings = self.meetings.lock().unwrap();
        let meeting = meetings.get_mut(&id).ok_or(Error::MeetingNotFound(id))?;
        if meeting.status == MeetingStatus::Completed {
            return Err(Error::StatusConflict {
                id,
                current: MeetingStatus::Completed,
            });
        }
        meeting.status = MeetingStatus::Failed;
        Ok(())
    }

    async fn get(&self, id: MeetingId) -> Result<Option<Meeting>> {
        Ok(self.meeting(id))
    }
}

// ============================================================================
// AI SERVICES
// ============================================================================

/// Transcriber returning a fixed result and counting calls.
pub struct StubTranscriber {
    result: std::result::Result<String, String>,
    panic_on: Option<String>,
    calls: AtomicUsize,
}

impl StubTranscriber {
    pub fn ok(transcript: &str) -> Self {
        Self {
            result: Ok(transcript.to_string()),
            panic_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            panic_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Panic when asked to transcribe `file_path`.
    pub fn panicking_on(mut self, file_path: &str) -> Self {
        self.panic_on = Some(file_path.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionBackend for StubTranscriber {
    async fn transcribe(&self, file_path: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on.as_deref() == Some(file_path) {
            panic!("transcriber exploded on {}", file_path);
        }
        self.result.clone().map_err(Error::Transcription)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Summarizer returning a fixed result and counting calls.
pub struct StubSummarizer {
    result: Summarized,
    calls: AtomicUsize,
}

impl StubSummarizer {
    pub fn parsed(summary: &str, action_items: &[&str]) -> Self {
        Self {
            result: Summarized::Parsed(MeetingSummary {
                summary: summary.to_string(),
                action_items: action_items.iter().map(|s| s.to_string()).collect(),
                key_points: None,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn degraded(summary: &str, reason: &str) -> Self {
        Self {
            result: Summarized::Degraded {
                summary: MeetingSummary::fallback(summary),
                reason: reason.to_string(),
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummarizationBackend for StubSummarizer {
    async fn summarize(&self, _transcript: &str) -> Summarized {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

// ============================================================================
// QUEUE
// ============================================================================

/// FIFO queue whose pop sleeps out the wait when empty, like BLPOP.
#[derive(Default)]
pub struct InMemoryQueue {
    items: Mutex<VecDeque<String>>,
    errors: Mutex<VecDeque<String>>,
    pops: AtomicUsize,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payloads(payloads: &[&str]) -> Self {
        let queue = Self::new();
        for payload in payloads {
            queue.items.lock().unwrap().push_back(payload.to_string());
        }
        queue
    }

    /// Fail the next pop with a queue error.
    pub fn fail_next_pop(&self, message: &str) {
        self.errors.lock().unwrap().push_back(message.to_string());
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn pops(&self) -> usize {
        self.pops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobQueue for InMemoryQueue {
    async fn pop(&self, wait: Duration) -> Result<Option<String>> {
        self.pops.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.errors.lock().unwrap().pop_front() {
            return Err(Error::Queue(message));
        }
        let next = self.items.lock().unwrap().pop_front();
        match next {
            Some(payload) => Ok(Some(payload)),
            None => {
                tokio::time::sleep(wait).await;
                Ok(None)
            }
        }
    }

    async fn push(&self, payload: &str) -> Result<()> {
        self.items.lock().unwrap().push_back(payload.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "meeting_jobs"
    }
}

// ============================================================================
// WIRING
// ============================================================================

pub fn pipeline(
    store: &Arc<InMemoryStore>,
    transcriber: &Arc<StubTranscriber>,
    summarizer: &Arc<StubSummarizer>,
) -> MeetingPipeline {
    MeetingPipeline::new(store.clone(), transcriber.clone(), summarizer.clone())
}
