//! # searchive-search
//!
//! Search index adapter for searchive.
//!
//! - [`ElasticsearchIndex`]: [`searchive_core::SearchIndex`] over the Elasticsearch REST API
//! - [`analyzer`]: index settings and the language-aware analyzer probe
//! - [`scoring`]: local TF-IDF ranking of per-document term statistics

pub mod analyzer;
pub mod elasticsearch;
pub mod scoring;

pub use elasticsearch::{ElasticsearchConfig, ElasticsearchIndex};
pub use scoring::{score_terms, tf_idf, top_terms, ScoredTerm, TermLengthBounds};
