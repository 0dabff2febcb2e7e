//! Ollama-backed arbitrator and query generator.
//!
//! Sends prompts to `/api/generate` and returns the model's raw `response`
//! text. Judgments force JSON output; search queries are plain text. One
//! request per call, no retries.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arbitration::{build_judge_prompt, Arbitrator};
use crate::query::{build_query_prompt, QueryGenerator};
use crate::config::parse_env;
use crate::error::{ArbitrationError, ConfigError};
use crate::models::{Candidate, ReferenceTrack};

/// Default Ollama endpoint used when `TRACK_MATCH_OLLAMA_URL` is not set.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default model used when `TRACK_MATCH_OLLAMA_MODEL` is not set.
pub const DEFAULT_OLLAMA_MODEL: &str = "gemma3:12b";

/// Connection and generation settings for [`OllamaArbitrator`].
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    /// Server base URL. Default: `http://localhost:11434`.
    pub base_url: String,

    /// Model tag. Default: `gemma3:12b`.
    pub model: String,

    /// Sampling temperature. Default: `0.3`.
    pub temperature: f64,

    /// Context window (`num_ctx`). Default: `4096`.
    pub context_size: u32,

    /// Whole-request timeout. Default: `60s`.
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            temperature: 0.3,
            context_size: 4096,
            timeout: Duration::from_secs(60),
        }
    }
}

impl OllamaConfig {
    const ENV_URL: &'static str = "TRACK_MATCH_OLLAMA_URL";
    const ENV_MODEL: &'static str = "TRACK_MATCH_OLLAMA_MODEL";
    const ENV_TEMPERATURE: &'static str = "TRACK_MATCH_OLLAMA_TEMPERATURE";
    const ENV_CONTEXT_SIZE: &'static str = "TRACK_MATCH_OLLAMA_CONTEXT_SIZE";
    const ENV_TIMEOUT_SECS: &'static str = "TRACK_MATCH_OLLAMA_TIMEOUT_SECS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let timeout_secs = parse_env(Self::ENV_TIMEOUT_SECS, defaults.timeout.as_secs())?;

        Ok(Self {
            base_url: parse_env(Self::ENV_URL, defaults.base_url)?,
            model: parse_env(Self::ENV_MODEL, defaults.model)?,
            temperature: parse_env(Self::ENV_TEMPERATURE, defaults.temperature)?,
            context_size: parse_env(Self::ENV_CONTEXT_SIZE, defaults.context_size)?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_ctx: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

// ============================================================================
// Arbitrator
// ============================================================================

/// Asks a local Ollama model to pick a candidate or write a search query.
pub struct OllamaArbitrator {
    client: Client,
    config: OllamaConfig,
}

impl OllamaArbitrator {
    pub fn new(config: OllamaConfig) -> Result<Self, ArbitrationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ArbitrationError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn request_body<'a>(
        &'a self,
        prompt: &'a str,
        format: Option<&'a str>,
    ) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            format,
            options: GenerateOptions {
                temperature: self.config.temperature,
                num_ctx: self.config.context_size,
            },
        }
    }

    fn generate(&self, prompt: &str, format: Option<&str>) -> Result<String, ArbitrationError> {
        let body: GenerateResponse = self
            .client
            .post(self.config.generate_url())
            .json(&self.request_body(prompt, format))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(transport_error)?;

        if body.response.trim().is_empty() {
            return Err(ArbitrationError::EmptyResponse);
        }
        Ok(body.response)
    }
}

fn transport_error(e: reqwest::Error) -> ArbitrationError {
    if e.is_timeout() {
        ArbitrationError::Timeout
    } else {
        ArbitrationError::Transport(e.to_string())
    }
}

impl Arbitrator for OllamaArbitrator {
    fn judge(
        &self,
        reference: &ReferenceTrack,
        candidates: &[Candidate],
    ) -> Result<String, ArbitrationError> {
        let prompt = build_judge_prompt(reference, candidates);
        debug!(model = %self.config.model, "Judging candidates with Ollama");
        self.generate(&prompt, Some("json"))
    }
}

impl QueryGenerator for OllamaArbitrator {
    fn generate_query(&self, reference: &ReferenceTrack) -> Result<String, ArbitrationError> {
        let prompt = build_query_prompt(reference);
        debug!(model = %self.config.model, "Generating search query with Ollama");
        self.generate(&prompt, None)
    }
}
