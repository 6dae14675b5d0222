//! Integration tests for the Whisper ASR client against a mock server.
//!
//! Cases:
//! - Recording uploaded as multipart field `audio_file`, body returned verbatim
//! - Missing recording fails before any request is made
//! - Non-success status surfaces as a transcription error
//! - Health check reports reachability

use minutes_inference::{Error, TranscriptionBackend, WhisperAsrBackend};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_recording(dir: &tempfile::TempDir, name: &str) {
    let full = dir.path().join(name);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(full, b"ID3fake-mp3-bytes").unwrap();
}

#[tokio::test]
async fn test_transcribe_uploads_recording() {
    let server = MockServer::start().await;
    let uploads = tempfile::tempdir().unwrap();
    write_recording(&uploads, "2024/standup.mp3");

    Mock::given(method("POST"))
        .and(path("/asr"))
        .and(body_string_contains("name=\"audio_file\""))
        .and(body_string_contains("filename=\"standup.mp3\""))
        .and(body_string_contains("audio/mpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_string("alice: ship it on friday"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = WhisperAsrBackend::new(server.uri(), uploads.path());
    let transcript = backend.transcribe("2024/standup.mp3").await.unwrap();

    assert_eq!(transcript, "alice: ship it on friday");
}

#[tokio::test]
async fn test_missing_recording_makes_no_request() {
    let server = MockServer::start().await;
    let uploads = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/asr"))
        .respond_with(ResponseTemplate::new(200).set_body_string("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let backend = WhisperAsrBackend::new(server.uri(), uploads.path());
    let err = backend.transcribe("missing.mp3").await.unwrap_err();

    assert!(matches!(err, Error::RecordingNotFound(_)));
}

#[tokio::test]
async fn test_traversal_path_rejected_without_request() {
    let server = MockServer::start().await;
    let uploads = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let backend = WhisperAsrBackend::new(server.uri(), uploads.path());
    let err = backend.transcribe("../secrets.mp3").await.unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_server_error_is_transcription_error() {
    let server = MockServer::start().await;
    let uploads = tempfile::tempdir().unwrap();
    write_recording(&uploads, "call.wav");

    Mock::given(method("POST"))
        .and(path("/asr"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = WhisperAsrBackend::new(server.uri(), uploads.path());
    let err = backend.transcribe("call.wav").await.unwrap_err();

    match err {
        Error::Transcription(msg) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("model not loaded"));
        }
        other => panic!("expected transcription error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let backend = WhisperAsrBackend::new(server.uri(), "./uploads");
    assert!(backend.health_check().await.unwrap());

    let unreachable = WhisperAsrBackend::new("http://127.0.0.1:1", "./uploads");
    assert!(!unreachable.health_check().await.unwrap());
}
