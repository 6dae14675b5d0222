//! minutes-worker: consumes meeting jobs from Redis, transcribes the
//! recording with Whisper, summarizes it with Ollama and stores the results
//! in PostgreSQL.

mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use minutes_core::defaults::{self, ENV_DATABASE_URL};
use minutes_core::{MeetingId, SummarizationBackend, TranscriptionBackend};
use minutes_db::{Database, PoolConfig};
use minutes_inference::{OllamaSummarizer, WhisperAsrBackend};
use minutes_jobs::{
    enqueue, Consumer, ConsumerConfig, JobQueue, MeetingPipeline, QueueConfig, RedisJobQueue,
};

#[derive(Parser)]
#[command(name = "minutes-worker")]
#[command(author, version, about = "Meeting transcription and summarization worker")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Consume jobs until SIGINT/SIGTERM (default)
    Run,

    /// Push one job onto the queue
    Enqueue {
        /// Meeting id to process
        meeting_id: MeetingId,

        /// Recording path relative to the uploads directory
        file_path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_config = telemetry::LogConfig::from_env();
    let _file_guard = telemetry::init(&log_config);
    info!(
        json = log_config.json,
        log_file = log_config.file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run().await,
        Commands::Enqueue {
            meeting_id,
            file_path,
        } => enqueue_one(meeting_id, &file_path).await,
    }
}

async fn run() -> anyhow::Result<()> {
    let database_url =
        defaults::env_string(ENV_DATABASE_URL).context("DATABASE_URL must be set")?;
    let db = Database::connect_with_config(&database_url, PoolConfig::from_env())
        .await
        .context("Failed to connect to database")?;

    let queue_config = QueueConfig::from_env();
    let queue = match RedisJobQueue::connect(&queue_config).await {
        Ok(queue) => queue,
        Err(e) => {
            error!(
                url = %queue_config.redacted_url(),
                error = %e,
                "Job queue unreachable, not starting consumer"
            );
            return Err(e.into());
        }
    };

    match queue.len().await {
        Ok(backlog) => info!(queue = queue.name(), backlog, "Job queue backlog"),
        Err(e) => warn!(error = %e, "Could not read job queue length"),
    }

    let transcriber = Arc::new(WhisperAsrBackend::from_env());
    let summarizer = Arc::new(OllamaSummarizer::from_env());
    probe_services(&db, transcriber.as_ref(), summarizer.as_ref()).await;

    let pipeline = MeetingPipeline::new(Arc::new(db.meetings.clone()), transcriber, summarizer);
    let consumer = Consumer::new(
        Arc::new(queue),
        Arc::new(pipeline),
        ConsumerConfig::from_env(),
    );

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("Shutdown requested, finishing current wait or job");
        signal_token.cancel();
    });

    consumer.run(cancel).await;
    db.pool.close().await;
    info!("Worker exited");
    Ok(())
}

/// Log reachability of every collaborator. Failures are not fatal.
async fn probe_services(
    db: &Database,
    transcriber: &dyn TranscriptionBackend,
    summarizer: &dyn SummarizationBackend,
) {
    match db.health_check().await {
        Ok(_) => info!("Database reachable"),
        Err(e) => warn!(error = %e, "Database health check failed"),
    }
    minutes_db::log_pool_metrics(&db.pool);

    match transcriber.health_check().await {
        Ok(true) => info!("Transcription service reachable"),
        _ => warn!("Transcription service unreachable; jobs will fail until it is up"),
    }

    match summarizer.health_check().await {
        Ok(true) => info!(model = summarizer.model_name(), "Summarization service reachable"),
        _ => warn!(
            model = summarizer.model_name(),
            "Summarization service unreachable; summaries will fall back"
        ),
    }
}

async fn enqueue_one(meeting_id: MeetingId, file_path: &str) -> anyhow::Result<()> {
    let queue = RedisJobQueue::connect(&QueueConfig::from_env())
        .await
        .context("Failed to connect to job queue")?;
    enqueue(&queue, meeting_id, file_path).await?;
    info!(
        meeting_id,
        file_path,
        queue = queue.name(),
        "Job queued"
    );
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
