//! Whisper ASR webservice client.
//!
//! Recordings are addressed by a path relative to the uploads root. The file
//! is checked locally before any network call, then uploaded as a multipart
//! form to `POST /asr`; the plain-text response body is the transcript.

use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use minutes_core::defaults::{
    self, ENV_UPLOADS_DIR, ENV_WHISPER_API_URL, ENV_WHISPER_TIMEOUT_SECS,
    HEALTH_CHECK_TIMEOUT_SECS, UPLOADS_DIR, WHISPER_API_URL, WHISPER_AUDIO_FIELD,
    WHISPER_TIMEOUT_SECS,
};
use minutes_core::{Error, Result, TranscriptionBackend};

/// Client for a Whisper ASR webservice (`onerahmet/openai-whisper-asr-webservice` API).
pub struct WhisperAsrBackend {
    client: Client,
    base_url: String,
    uploads_root: PathBuf,
    timeout_secs: u64,
}

impl WhisperAsrBackend {
    pub fn new(base_url: impl Into<String>, uploads_root: impl Into<PathBuf>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            uploads_root: uploads_root.into(),
            timeout_secs: WHISPER_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables (with defaults).
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `WHISPER_API_URL` | `http://localhost:9000` |
    /// | `UPLOADS_DIR` | `./uploads` |
    /// | `WHISPER_TIMEOUT_SECS` | `300` |
    pub fn from_env() -> Self {
        let base_url = defaults::env_string(ENV_WHISPER_API_URL)
            .unwrap_or_else(|| WHISPER_API_URL.to_string());
        let uploads_root =
            defaults::env_string(ENV_UPLOADS_DIR).unwrap_or_else(|| UPLOADS_DIR.to_string());
        let timeout_secs = defaults::env_or(ENV_WHISPER_TIMEOUT_SECS, WHISPER_TIMEOUT_SECS);

        info!(
            subsystem = "inference",
            component = "whisper",
            base_url = %base_url,
            uploads_root = %uploads_root,
            timeout_secs,
            "Initializing Whisper backend"
        );

        Self::new(base_url, uploads_root).with_timeout(timeout_secs)
    }

    /// Override the upload timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }

    /// Join `file_path` onto the uploads root.
    ///
    /// Absolute paths and `..` components are rejected so a job can never
    /// address a file outside the root.
    pub fn resolve_recording_path(&self, file_path: &str) -> Result<PathBuf> {
        if file_path.trim().is_empty() {
            return Err(Error::InvalidInput("recording path is empty".to_string()));
        }

        let relative = Path::new(file_path);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir => {
                    return Err(Error::InvalidInput(format!(
                        "recording path escapes uploads root: {}",
                        file_path
                    )))
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::InvalidInput(format!(
                        "recording path must be relative: {}",
                        file_path
                    )))
                }
            }
        }

        Ok(self.uploads_root.join(relative))
    }

    /// Resolve and confirm the recording exists as a regular file.
    async fn locate_recording(&self, file_path: &str) -> Result<PathBuf> {
        let path = self.resolve_recording_path(file_path)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(Error::RecordingNotFound(path.display().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::RecordingNotFound(path.display().to_string()))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// MIME type sent with the upload, from the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl TranscriptionBackend for WhisperAsrBackend {
    #[instrument(skip(self), fields(subsystem = "inference", component = "whisper", op = "transcribe"))]
    async fn transcribe(&self, file_path: &str) -> Result<String> {
        let path = self.locate_recording(file_path).await?;
        let start = Instant::now();

        let audio = tokio::fs::read(&path).await?;
        let mime = mime_for_path(&path);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "recording".to_string());

        debug!(
            path = %path.display(),
            bytes = audio.len(),
            mime,
            "Uploading recording"
        );

        let part = Part::bytes(audio)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| Error::Internal(format!("Failed to create multipart: {}", e)))?;
        let form = Form::new().part(WHISPER_AUDIO_FIELD, part);

        let response = self
            .client
            .post(format!("{}/asr", self.base_url))
            .multipart(form)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Transcription(format!("Transcription request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transcription(format!(
                "Whisper API returned {}: {}",
                status, body
            )));
        }

        let transcript = response.text().await.map_err(|e| {
            Error::Transcription(format!("Failed to read whisper response: {}", e))
        })?;

        debug!(
            transcript_len = transcript.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Transcription complete"
        );
        Ok(transcript)
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(&self.base_url)
            .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS))
            .send()
            .await;

        match response {
            Ok(resp) if !resp.status().is_server_error() => Ok(true),
            Ok(resp) => {
                warn!("Whisper health check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Whisper health check error: {}", e);
                Ok(false)
            }
        }
    }
}
