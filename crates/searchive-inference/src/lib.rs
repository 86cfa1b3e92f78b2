//! # searchive-inference
//!
//! Embedding backend and corpus-independent keyphrase ranking for searchive.
//!
//! - [`OllamaEmbedder`]: [`searchive_core::EmbeddingBackend`] over Ollama's `/api/embed`
//! - [`EmbeddingRanker`]: [`searchive_core::KeyphraseRanker`] that ranks candidate
//!   n-grams by similarity to the document with a diversity constraint

pub mod candidates;
pub mod diversity;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod ollama;
pub mod ranker;

pub use diversity::Diversity;
pub use ollama::OllamaEmbedder;
pub use ranker::{EmbeddingRanker, RankerConfig};
