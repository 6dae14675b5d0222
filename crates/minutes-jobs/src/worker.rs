//! Queue consumer that feeds payloads through the meeting pipeline.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use minutes_core::defaults::{
    self, CONSUMER_EVENT_CAPACITY, ENV_QUEUE_WAIT_SECS, QUEUE_ERROR_PAUSE_MS, QUEUE_WAIT_SECS,
};
use minutes_core::logging::stage;
use minutes_core::{Error, JobQueue, MeetingId, MeetingJob, Result};

use crate::pipeline::{JobOutcome, MeetingPipeline};

/// Configuration for the queue consumer.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Upper bound on one blocking pop; also the shutdown check interval.
    pub wait: Duration,
    /// Pause after a failed queue read.
    pub error_pause: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(QUEUE_WAIT_SECS),
            error_pause: Duration::from_millis(QUEUE_ERROR_PAUSE_MS),
        }
    }
}

impl ConsumerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `QUEUE_WAIT_SECS` | `5` | Blocking pop timeout |
    pub fn from_env() -> Self {
        let wait_secs = defaults::env_or(ENV_QUEUE_WAIT_SECS, QUEUE_WAIT_SECS).max(1);
        Self::default().with_wait(Duration::from_secs(wait_secs))
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_error_pause(mut self, pause: Duration) -> Self {
        self.error_pause = pause;
        self
    }
}

/// Event emitted by the consumer.
#[derive(Debug, Clone)]
pub enum ConsumerEvent {
    /// Consumer loop started.
    ConsumerStarted,
    /// A payload was decoded and handed to the pipeline.
    JobReceived { meeting_id: Option<MeetingId> },
    /// A payload could not be decoded and was discarded.
    PayloadRejected { error: String },
    /// The pipeline returned.
    JobFinished {
        meeting_id: Option<MeetingId>,
        outcome: JobOutcome,
    },
    /// The pipeline panicked; the meeting was marked failed where possible.
    JobPanicked {
        meeting_id: Option<MeetingId>,
        message: String,
    },
    /// Reading from the queue failed.
    QueueError { error: String },
    /// Consumer loop stopped.
    ConsumerStopped,
}

/// Handle for controlling a running consumer.
pub struct ConsumerHandle {
    cancel: CancellationToken,
    event_rx: broadcast::Receiver<ConsumerEvent>,
    join: JoinHandle<()>,
}

impl ConsumerHandle {
    /// Ask the consumer to stop after its current wait or job.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Token that stops the consumer when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Get a receiver for consumer events.
    pub fn events(&self) -> broadcast::Receiver<ConsumerEvent> {
        self.event_rx.resubscribe()
    }

    /// Wait for the consumer task to exit.
    pub async fn join(self) -> Result<()> {
        self.join
            .await
            .map_err(|e| Error::Internal(format!("Consumer task failed: {}", e)))
    }
}

/// Pulls payloads off a [`JobQueue`] and runs them one at a time.
pub struct Consumer {
    queue: Arc<dyn JobQueue>,
    pipeline: Arc<MeetingPipeline>,
    config: ConsumerConfig,
    event_tx: broadcast::Sender<ConsumerEvent>,
}

impl Consumer {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        pipeline: Arc<MeetingPipeline>,
        config: ConsumerConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(CONSUMER_EVENT_CAPACITY);
        Self {
            queue,
            pipeline,
            config,
            event_tx,
        }
    }

    /// Get a receiver for consumer events.
    pub fn events(&self) -> broadcast::Receiver<ConsumerEvent> {
        self.event_tx.subscribe()
    }

    /// Spawn the loop and return a handle for control.
    pub fn start(self) -> ConsumerHandle {
        let cancel = CancellationToken::new();
        let event_rx = self.event_tx.subscribe();
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            self.run(token).await;
        });

        ConsumerHandle {
            cancel,
            event_rx,
            join,
        }
    }

    /// Run until `cancel` fires.
    ///
    /// Cancellation is checked between pops, never during one: a dropped
    /// `BLPOP` can still remove its payload server-side.
    #[instrument(skip(self, cancel), fields(subsystem = "queue", component = "consumer", queue = %self.queue.name()))]
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            wait_secs = self.config.wait.as_secs_f64(),
            "Consumer started"
        );
        self.emit(ConsumerEvent::ConsumerStarted);

        while !cancel.is_cancelled() {
            match self.queue.pop(self.config.wait).await {
                Ok(Some(payload)) => self.handle_payload(&payload).await,
                Ok(None) => debug!("Queue wait elapsed"),
                Err(e) => {
                    error!(stage = stage::QUEUE, error = %e, "Queue read failed");
                    self.emit(ConsumerEvent::QueueError {
                        error: e.to_string(),
                    });
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = sleep(self.config.error_pause) => {}
                    }
                }
            }
        }

        self.emit(ConsumerEvent::ConsumerStopped);
        info!("Consumer stopped");
    }

    async fn handle_payload(&self, payload: &str) {
        let job = match MeetingJob::from_payload(payload) {
            Ok(job) => job,
            Err(e) => {
                warn!(
                    stage = stage::QUEUE,
                    error = %e,
                    payload_len = payload.len(),
                    "Discarding undecodable payload"
                );
                self.emit(ConsumerEvent::PayloadRejected {
                    error: e.to_string(),
                });
                return;
            }
        };

        let meeting_id = job.meeting_id;
        self.emit(ConsumerEvent::JobReceived { meeting_id });

        match AssertUnwindSafe(self.pipeline.process(&job))
            .catch_unwind()
            .await
        {
            Ok(outcome) => {
                self.emit(ConsumerEvent::JobFinished {
                    meeting_id,
                    outcome,
                });
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(?meeting_id, panic = %message, "Pipeline panicked");
                if let Some(id) = job.valid_meeting_id() {
                    self.pipeline.mark_failed(id).await;
                }
                self.emit(ConsumerEvent::JobPanicked {
                    meeting_id,
                    message,
                });
            }
        }
    }

    fn emit(&self, event: ConsumerEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
