//! # minutes-inference
//!
//! HTTP clients for the AI services a meeting job calls.
//!
//! This crate provides:
//! - [`WhisperAsrBackend`]: uploads a recording to a Whisper ASR webservice
//! - [`OllamaSummarizer`]: asks an Ollama model for a JSON summary and action items
//! - [`json_recovery`]: best-effort extraction of JSON from free-form model replies
//!
//! # Example
//!
//! ```rust,no_run
//! use minutes_inference::{OllamaSummarizer, SummarizationBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let summarizer = OllamaSummarizer::from_env();
//!     let result = summarizer.summarize("alice: ship it on friday").await;
//!     println!("{}", result.summary().summary);
//! }
//! ```

pub mod json_recovery;
pub mod ollama;
pub mod transcription;

// Re-export core types
pub use minutes_core::*;

pub use json_recovery::{parse_summary, recover_json, strip_code_fences};
pub use ollama::OllamaSummarizer;
pub use transcription::{mime_for_path, WhisperAsrBackend};
