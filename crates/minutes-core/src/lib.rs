//! # minutes-core
//!
//! Core types, traits, and abstractions for the minutes meeting processor.
//!
//! This crate provides the meeting and job data model, the error taxonomy,
//! default configuration values, and the traits the job pipeline is written
//! against. Other minutes crates depend on it.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
