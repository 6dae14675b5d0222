//! Error types for the minutes meeting processor.

use thiserror::Error;

use crate::models::{MeetingId, MeetingStatus};

/// Result type alias using the processor's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for job processing operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No meeting record matched the given id
    #[error("Meeting not found: {0}")]
    MeetingNotFound(MeetingId),

    /// The recording referenced by a job does not exist under the uploads root
    #[error("Recording not found: {0}")]
    RecordingNotFound(String),

    /// A status write would move a meeting backwards
    #[error("Meeting {id} is already {current}")]
    StatusConflict {
        id: MeetingId,
        current: MeetingStatus,
    },

    /// Speech-to-text service failed
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Text-generation service failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Job queue transport failed
    #[error("Queue error: {0}")]
    Queue(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors that mean the addressed record or file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::MeetingNotFound(_) | Error::RecordingNotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_meeting_not_found() {
        let err = Error::MeetingNotFound(42);
        assert_eq!(err.to_string(), "Meeting not found: 42");
    }

    #[test]
    fn test_error_display_recording_not_found() {
        let err = Error::RecordingNotFound("/srv/uploads/missing.mp3".to_string());
        assert_eq!(
            err.to_string(),
            "Recording not found: /srv/uploads/missing.mp3"
        );
    }

    #[test]
    fn test_error_display_status_conflict() {
        let err = Error::StatusConflict {
            id: 7,
            current: MeetingStatus::Completed,
        };
        assert_eq!(err.to_string(), "Meeting 7 is already completed");
    }

    #[test]
    fn test_error_display_transcription() {
        let err = Error::Transcription("ASR returned 502".to_string());
        assert_eq!(err.to_string(), "Transcription error: ASR returned 502");
    }

    #[test]
    fn test_error_display_queue() {
        let err = Error::Queue("connection refused".to_string());
        assert_eq!(err.to_string(), "Queue error: connection refused");
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::MeetingNotFound(1).is_not_found());
        assert!(Error::RecordingNotFound("a.mp3".into()).is_not_found());
        assert!(!Error::Internal("x".into()).is_not_found());
        assert!(!Error::StatusConflict {
            id: 1,
            current: MeetingStatus::Completed
        }
        .is_not_found());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
