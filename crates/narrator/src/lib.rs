use std::env;
use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error)]
pub enum NarratorError {
    #[error("text generation is not configured")]
    NotConfigured,
    #[error("text generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("text generation returned status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("text generation returned no text")]
    EmptyResponse,
}

// Produces prose for a prompt. One stateless round trip, no retries.
pub trait TextGenerator: Send + Sync {
    fn is_enabled(&self) -> bool {
        true
    }

    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, NarratorError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

impl GeminiConfig {
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let api_key = lookup("CRESTA_GEMINI_API_KEY")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())?;
        let model = lookup("CRESTA_GEMINI_MODEL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let endpoint = lookup("CRESTA_GEMINI_ENDPOINT")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string());

        Some(Self {
            api_key,
            model,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn generate_url(&self) -> String {
        format!("{}/v1/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    http_client: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, NarratorError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(6))
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, NarratorError> {
        let payload = serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let response = self
            .http_client
            .post(self.config.generate_url())
            .header("x-goog-api-key", self.config.api_key.as_str())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NarratorError::Status { status, body });
        }

        let body: serde_json::Value = response.json().await?;
        let text = extract_gemini_text(&body).ok_or(NarratorError::EmptyResponse)?;
        debug!(model = %self.config.model, chars = text.len(), "narrative generated");
        Ok(text)
    }
}

#[derive(Clone)]
pub enum Narrator {
    Gemini(GeminiClient),
    Disabled,
}

impl Narrator {
    pub fn from_env() -> Result<Self, NarratorError> {
        match GeminiConfig::from_env() {
            Some(config) => Ok(Self::Gemini(GeminiClient::new(config)?)),
            None => Ok(Self::Disabled),
        }
    }
}

impl TextGenerator for Narrator {
    fn is_enabled(&self) -> bool {
        matches!(self, Narrator::Gemini(_))
    }

    async fn generate(&self, prompt: &str) -> Result<String, NarratorError> {
        match self {
            Narrator::Gemini(client) => client.generate(prompt).await,
            Narrator::Disabled => Err(NarratorError::NotConfigured),
        }
    }
}

pub fn extract_gemini_text(payload: &serde_json::Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|value| value.as_str()))
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
