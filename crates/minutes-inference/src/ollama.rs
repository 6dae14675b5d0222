//! Ollama summarization backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use minutes_core::defaults::{
    self, ENV_OLLAMA_BASE, ENV_OLLAMA_HOST, ENV_OLLAMA_MODEL, ENV_OLLAMA_PORT,
    ENV_OLLAMA_TIMEOUT_SECS, ENV_SUMMARY_MAX_TRANSCRIPT_CHARS, HEALTH_CHECK_TIMEOUT_SECS,
    NO_TRANSCRIPT_SUMMARY, OLLAMA_HOST, OLLAMA_MODEL, OLLAMA_PORT, OLLAMA_TIMEOUT_SECS,
    SUMMARY_MAX_TRANSCRIPT_CHARS, SUMMARY_UNAVAILABLE,
};
use minutes_core::{
    raw_reply_fallback, truncate_chars, Error, MeetingSummary, Result, SummarizationBackend,
    Summarized,
};

use crate::json_recovery::parse_summary;

/// Summarizes transcripts with a local Ollama model via `/api/generate`.
pub struct OllamaSummarizer {
    client: Client,
    base_url: String,
    model: String,
    timeout_secs: u64,
    max_transcript_chars: usize,
}

impl OllamaSummarizer {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout_secs: OLLAMA_TIMEOUT_SECS,
            max_transcript_chars: SUMMARY_MAX_TRANSCRIPT_CHARS,
        }
    }

    /// Create from environment variables.
    ///
    /// `OLLAMA_BASE` wins when set; otherwise the URL is assembled from
    /// `OLLAMA_HOST` and `OLLAMA_PORT`.
    pub fn from_env() -> Self {
        let base_url = defaults::env_string(ENV_OLLAMA_BASE).unwrap_or_else(|| {
            let host =
                defaults::env_string(ENV_OLLAMA_HOST).unwrap_or_else(|| OLLAMA_HOST.to_string());
            let port = defaults::env_or(ENV_OLLAMA_PORT, OLLAMA_PORT);
            format!("http://{}:{}", host, port)
        });
        let model =
            defaults::env_string(ENV_OLLAMA_MODEL).unwrap_or_else(|| OLLAMA_MODEL.to_string());

        info!(
            subsystem = "inference",
            component = "ollama",
            base_url = %base_url,
            model = %model,
            "Initializing Ollama summarizer"
        );

        Self::new(base_url, model)
            .with_timeout(defaults::env_or(ENV_OLLAMA_TIMEOUT_SECS, OLLAMA_TIMEOUT_SECS))
            .with_max_transcript_chars(defaults::env_or(
                ENV_SUMMARY_MAX_TRANSCRIPT_CHARS,
                SUMMARY_MAX_TRANSCRIPT_CHARS,
            ))
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Cap on transcript characters placed in the prompt.
    pub fn with_max_transcript_chars(mut self, max: usize) -> Self {
        self.max_transcript_chars = max.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Prompt asking for a strictly-JSON summary of `transcript`.
    pub fn build_prompt(transcript: &str) -> String {
        format!(
            "You are a professional meeting assistant.\n\
             Summarize the following meeting transcript and extract the action items.\n\
             Respond with JSON only, no commentary, shaped exactly as:\n\
             {{\"summary\": \"...\", \"action_items\": [\"...\", \"...\"]}}\n\n\
             Transcript:\n{}\n",
            transcript
        )
    }

    /// Send one non-streaming JSON-mode generation and return the raw reply text.
    async fn generate(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            format: "json",
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        debug!(
            response_len = result.response.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation complete"
        );
        Ok(result.response)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    format: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[async_trait]
impl SummarizationBackend for OllamaSummarizer {
    #[instrument(skip(self, transcript), fields(subsystem = "inference", component = "ollama", op = "summarize", model = %self.model, transcript_len = transcript.len()))]
    async fn summarize(&self, transcript: &str) -> Summarized {
        if transcript.trim().is_empty() {
            debug!("Empty transcript, skipping model call");
            return Summarized::Degraded {
                summary: MeetingSummary::fallback(NO_TRANSCRIPT_SUMMARY),
                reason: "empty transcript".to_string(),
            };
        }

        let excerpt = truncate_chars(transcript, self.max_transcript_chars);
        if excerpt.len() < transcript.len() {
            debug!(
                kept_chars = self.max_transcript_chars,
                "Transcript truncated for prompt"
            );
        }

        let raw = match self.generate(&Self::build_prompt(excerpt)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Summarization request failed, using fallback");
                return Summarized::Degraded {
                    summary: MeetingSummary::fallback(SUMMARY_UNAVAILABLE),
                    reason: e.to_string(),
                };
            }
        };

        match parse_summary(&raw) {
            Ok(summary) => Summarized::Parsed(summary),
            Err(e) => {
                warn!(
                    error = %e,
                    response_len = raw.len(),
                    "Model reply was not usable JSON, keeping raw text"
                );
                Summarized::Degraded {
                    summary: MeetingSummary::fallback(raw_reply_fallback(&raw)),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS))
            .send()
            .await;

        match response {
            Ok(resp) => {
                if resp.status().is_success() {
                    info!("Ollama health check passed");
                    Ok(true)
                } else {
                    warn!("Ollama health check failed: {}", resp.status());
                    Ok(false)
                }
            }
            Err(e) => {
                warn!("Ollama health check error: {}", e);
                Ok(false)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
