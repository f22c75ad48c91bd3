//! HTTP client for the generative-text backend (Ollama-compatible API)

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_LLM_URL: &str = "http://localhost:11434";
const DEFAULT_LLM_MODEL: &str = "mistral-openorca:latest";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const HEALTH_TIMEOUT_SECS: u64 = 5;

fn env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn timeout_secs() -> u64 {
    std::env::var("GRAPHLOOM_LLM_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
}

/// Client for an Ollama-compatible text generation service.
///
/// Two usage modes: JSON-constrained (triple extraction) and free text
/// (query translation, fallback answering). Every request carries a timeout
/// so a hung backend cannot stall a batch.
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl LlmClient {
    /// Create a client for an explicit endpoint and model
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Client configured from the environment
    pub fn default_local() -> Self {
        Self::new(
            env_or_default("GRAPHLOOM_LLM_URL", DEFAULT_LLM_URL),
            env_or_default("GRAPHLOOM_LLM_MODEL", DEFAULT_LLM_MODEL),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Free-text completion
    #[instrument(skip(self, prompt))]
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_inner(prompt, None, None).await
    }

    /// JSON-constrained completion at zero temperature
    #[instrument(skip(self, prompt))]
    pub async fn generate_json(&self, prompt: &str) -> Result<String> {
        self.generate_inner(prompt, Some("json"), Some(json!({ "temperature": 0 })))
            .await
    }

    /// Free-text completion at zero temperature, for query translation.
    ///
    /// Low randomness makes repeated translations of the same question
    /// likely, though not guaranteed, to match.
    #[instrument(skip(self, prompt))]
    pub async fn generate_deterministic(&self, prompt: &str) -> Result<String> {
        self.generate_inner(prompt, None, Some(json!({ "temperature": 0 })))
            .await
    }

    async fn generate_inner(
        &self,
        prompt: &str,
        format: Option<&str>,
        options: Option<Value>,
    ) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: format.map(str::to_string),
            options,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(Duration::from_secs(timeout_secs()))
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        debug!("Backend returned {} chars", response.response.len());

        Ok(response.response)
    }

    /// Health check against the model listing endpoint
    pub async fn health(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

/// Strip a leading/trailing markdown code fence from a backend response
pub(crate) fn strip_code_fences(payload: &str) -> String {
    let trimmed = payload.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let mut lines = trimmed.lines();
    let _ = lines.next(); // drop ``` or ```json / ```sql
    let mut content = lines.collect::<Vec<_>>().join("\n");
    if content.trim_end().ends_with("```") {
        let end = content.rfind("```").unwrap_or(content.len());
        content.truncate(end);
    }
    content.trim().to_string()
}

// ==========================================
// REQUEST/RESPONSE TYPES
// ==========================================

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Value>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}
