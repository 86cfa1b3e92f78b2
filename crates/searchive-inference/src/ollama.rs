//! Ollama embedding backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use searchive_core::{defaults, EmbeddingBackend, Error, Result};

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = defaults::OLLAMA_URL;

/// Default embedding model.
pub const DEFAULT_EMBED_MODEL: &str = defaults::EMBED_MODEL;

/// Texts sent per `/api/embed` request.
pub const EMBED_BATCH_SIZE: usize = 64;

/// Ollama embedding backend.
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    /// Create a backend against `base_url` using `model`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_timeout(
            base_url,
            model,
            Duration::from_secs(defaults::EMBED_TIMEOUT_SECS),
        )
    }

    /// Create a backend with an explicit per-request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
        })
    }

    /// Create from `OLLAMA_BASE`, `OLLAMA_EMBED_MODEL` and `OLLAMA_EMBED_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let base = std::env::var("OLLAMA_BASE").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string());
        let model =
            std::env::var("OLLAMA_EMBED_MODEL").unwrap_or_else(|_| DEFAULT_EMBED_MODEL.to_string());
        let timeout = std::env::var("OLLAMA_EMBED_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::EMBED_TIMEOUT_SECS);
        Self::with_timeout(base, model, Duration::from_secs(timeout))
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .timeout(self.timeout)
            .json(&EmbedRequest {
                model: &self.model,
                input: batch,
            })
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!("Ollama returned {status}: {body}")));
        }

        let result: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {e}")))?;

        if result.embeddings.len() != batch.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                batch.len(),
                result.embeddings.len()
            )));
        }
        Ok(result.embeddings)
    }
}

#[async_trait]
impl EmbeddingBackend for OllamaEmbedder {
    #[instrument(skip(self, texts), fields(subsystem = "inference", component = "ollama", op = "embed_texts", model = %self.model, input_count = texts.len()))]
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let start = Instant::now();
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            vectors.extend(self.embed_batch(batch).await?);
        }

        let elapsed = start.elapsed().as_millis();
        debug!(
            result_count = vectors.len(),
            duration_ms = elapsed as u64,
            "Embedding complete"
        );
        if elapsed > defaults::EMBED_SLOW_MS {
            warn!(
                duration_ms = elapsed as u64,
                input_count = texts.len(),
                "Slow embedding operation"
            );
        }
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
