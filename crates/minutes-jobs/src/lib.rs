//! # minutes-jobs
//!
//! Meeting job processing for the minutes meeting processor.
//!
//! This crate provides:
//! - [`RedisJobQueue`]: the Redis list transport jobs arrive on
//! - [`MeetingPipeline`]: one job from `processing` to `completed` or `failed`
//! - [`Consumer`]: the sequential loop feeding queue payloads to the pipeline,
//!   with cooperative shutdown and a broadcast event stream
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use minutes_jobs::{Consumer, ConsumerConfig, MeetingPipeline, QueueConfig, RedisJobQueue};
//!
//! let queue = RedisJobQueue::connect(&QueueConfig::from_env()).await?;
//! let pipeline = MeetingPipeline::new(store, transcriber, summarizer);
//!
//! let handle = Consumer::new(Arc::new(queue), Arc::new(pipeline), ConsumerConfig::from_env()).start();
//!
//! // Listen for events
//! let mut events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//!
//! // Graceful shutdown
//! handle.shutdown();
//! handle.join().await?;
//! ```

pub mod pipeline;
pub mod queue;
pub mod worker;

// Re-export core types
pub use minutes_core::*;

pub use pipeline::{JobOutcome, MeetingPipeline};
pub use queue::{enqueue, QueueConfig, RedisJobQueue};
pub use worker::{Consumer, ConsumerConfig, ConsumerEvent, ConsumerHandle};
