//! Embedding-based keyphrase ranker.
//!
//! Embeds the document and every candidate phrase with one model, ranks
//! candidates by cosine similarity to the document, then applies a
//! diversity selection so the returned phrases are not near-duplicates.
//!
//! The first call warms the model up behind a single-flight cell: concurrent
//! first callers wait on the same warm-up instead of each triggering a load.
//! The composition root may call [`EmbeddingRanker::warm_up`] eagerly.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use searchive_core::{defaults, EmbeddingBackend, Error, KeyphraseRanker, Result};

use crate::candidates::{candidate_phrases, NgramRange, MAX_CANDIDATES};
use crate::diversity::{cosine_similarity, select, Diversity};

/// Ranker tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankerConfig {
    pub ngram_range: NgramRange,
    pub diversity: Diversity,
    /// Characters of input text considered.
    pub max_input_chars: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            ngram_range: NgramRange::default(),
            diversity: Diversity::MaxSum {
                candidates: defaults::RANKER_CANDIDATES,
            },
            max_input_chars: defaults::RANKER_MAX_INPUT_CHARS,
        }
    }
}

/// [`KeyphraseRanker`] over any [`EmbeddingBackend`].
pub struct EmbeddingRanker {
    backend: Arc<dyn EmbeddingBackend>,
    config: RankerConfig,
    warmed: OnceCell<()>,
    name: String,
}

impl EmbeddingRanker {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self::with_config(backend, RankerConfig::default())
    }

    pub fn with_config(backend: Arc<dyn EmbeddingBackend>, config: RankerConfig) -> Self {
        let name = format!("embedding:{}", backend.model_name());
        Self {
            backend,
            config,
            warmed: OnceCell::new(),
            name,
        }
    }

    /// Load the model once. Safe to call concurrently; a failed warm-up is retried next call.
    pub async fn warm_up(&self) -> Result<()> {
        self.warmed
            .get_or_try_init(|| async {
                let start = Instant::now();
                self.backend.embed_texts(&["warm up".to_string()]).await?;
                info!(
                    subsystem = "inference",
                    component = "ranker",
                    op = "warm_up",
                    model = self.backend.model_name(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Embedding model ready"
                );
                Ok::<(), Error>(())
            })
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl KeyphraseRanker for EmbeddingRanker {
    #[instrument(skip(self, text), fields(subsystem = "inference", component = "ranker", op = "rank", text_len = text.len()))]
    async fn rank(&self, text: &str, top_n: usize) -> Result<Vec<String>> {
        if top_n == 0 {
            return Ok(Vec::new());
        }
        let text: String = text.chars().take(self.config.max_input_chars).collect();
        let candidates = candidate_phrases(&text, self.config.ngram_range, MAX_CANDIDATES);
        if candidates.is_empty() {
            debug!("No candidate phrases");
            return Ok(Vec::new());
        }

        self.warm_up().await?;

        let mut inputs = Vec::with_capacity(candidates.len() + 1);
        inputs.push(text);
        inputs.extend(candidates.iter().cloned());
        let mut vectors = self.backend.embed_texts(&inputs).await?;
        if vectors.len() != inputs.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                inputs.len(),
                vectors.len()
            )));
        }
        let doc_vector = vectors.remove(0);

        let doc_sims: Vec<f32> = vectors
            .iter()
            .map(|v| cosine_similarity(&doc_vector, v))
            .collect();
        let picked = select(&doc_sims, &vectors, top_n, self.config.diversity);

        let phrases: Vec<String> = picked.into_iter().map(|i| candidates[i].clone()).collect();
        debug!(
            candidate_count = candidates.len(),
            result_count = phrases.len(),
            "Ranked key phrases"
        );
        Ok(phrases)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEmbeddingBackend;

    #[tokio::test]
    async fn test_rank_returns_at_most_top_n() {
        let backend = Arc::new(MockEmbeddingBackend::new());
        let ranker = EmbeddingRanker::new(backend);
        let phrases = ranker
            .rank(
                "Elasticsearch stores inverted indexes. Rust services query Elasticsearch quickly.",
                3,
            )
            .await
            .unwrap();
        assert!(!phrases.is_empty());
        assert!(phrases.len() <= 3);
    }

    #[tokio::test]
    async fn test_rank_empty_text_skips_backend() {
        let backend = Arc::new(MockEmbeddingBackend::new());
        let ranker = EmbeddingRanker::new(backend.clone());
        assert!(ranker.rank("   ", 5).await.unwrap().is_empty());
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_warm_up_runs_once_under_concurrency() {
        let backend = Arc::new(MockEmbeddingBackend::new());
        let ranker = Arc::new(EmbeddingRanker::new(backend.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let r = ranker.clone();
                tokio::spawn(async move { r.warm_up().await })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let backend = Arc::new(MockEmbeddingBackend::new().failing());
        let ranker = EmbeddingRanker::new(backend);
        assert!(ranker.rank("some meaningful words here", 5).await.is_err());
    }

    #[tokio::test]
    async fn test_name_includes_model() {
        let ranker = EmbeddingRanker::new(Arc::new(MockEmbeddingBackend::new()));
        assert_eq!(ranker.name(), "embedding:mock-embed");
    }
}
