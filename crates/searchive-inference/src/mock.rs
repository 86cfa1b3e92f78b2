//! Deterministic embedding backend for tests.
//!
//! Each text maps to a normalized character-bucket histogram, so texts
//! sharing characters are similar and identical texts embed identically.
//!
//! ```rust,ignore
//! let backend = MockEmbeddingBackend::new().with_dimension(32);
//! let v = backend.embed_texts(&["hello".into()]).await?;
//! assert_eq!(v[0].len(), 32);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use searchive_core::{EmbeddingBackend, Error, Result};

/// Mock embedding backend.
#[derive(Clone)]
pub struct MockEmbeddingBackend {
    dimension: usize,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl Default for MockEmbeddingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbeddingBackend {
    pub fn new() -> Self {
        Self {
            dimension: 64,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension.max(1);
        self
    }

    /// Make every call fail with `Error::Embedding`.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Number of `embed_texts` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        for c in text.chars().filter(|c| !c.is_whitespace()) {
            v[c as usize % self.dimension] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Embedding("mock backend unavailable".to_string()));
        }
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}
