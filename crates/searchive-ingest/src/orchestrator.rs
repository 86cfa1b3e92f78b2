//! Hybrid keyword extraction.
//!
//! Every call reads the indexed-document count `N` and picks one strategy:
//!
//! - `N < T`: cold start. The keyphrase ranker embeds the document and
//!   candidate phrases and returns a diverse top `K`.
//! - `N >= T`: index significance. The document's term distribution is
//!   compared against the corpus, either by scoring term vectors locally
//!   (TF-IDF) or through the engine's significance aggregation.
//!
//! Output is normalized (trimmed, lower-cased, deduplicated). The
//! orchestrator never fails: any collaborator error yields an empty keyword
//! list tagged with the strategy that was attempted.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use searchive_core::{
    defaults, normalize_keywords, ExtractionMethod, ExtractionResult, ExtractionStrategy,
    KeyphraseRanker, Result, SearchIndex, SignificanceMode,
};
use searchive_search::{top_terms, TermLengthBounds};

/// Index field holding analyzed document text.
pub const CONTENT_FIELD: &str = "content";

/// Orchestrator tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Corpus size at which index significance takes over (`T`).
    pub threshold: u64,
    /// Keywords requested per document (`K`).
    pub keyword_count: usize,
    pub significance_mode: SignificanceMode,
    pub term_bounds: TermLengthBounds,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            threshold: defaults::KEYWORD_THRESHOLD,
            keyword_count: defaults::KEYWORD_COUNT,
            significance_mode: SignificanceMode::default(),
            term_bounds: TermLengthBounds::default(),
        }
    }
}

/// Snapshot reported by the keyword status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct KeywordStatus {
    /// `None` when the index could not be reached.
    pub indexed_documents: Option<u64>,
    pub threshold: u64,
    pub keyword_count: usize,
    /// Strategy the next extraction would use, if the count is known.
    pub active_method: Option<ExtractionMethod>,
    pub significance_mode: SignificanceMode,
    pub ranker: Option<String>,
}

pub struct KeywordExtractionOrchestrator {
    index: Arc<dyn SearchIndex>,
    ranker: Option<Arc<dyn KeyphraseRanker>>,
    config: OrchestratorConfig,
}

impl KeywordExtractionOrchestrator {
    /// `ranker` is `None` when no embedding backend is configured; cold-start
    /// extraction then yields no keywords.
    pub fn new(
        index: Arc<dyn SearchIndex>,
        ranker: Option<Arc<dyn KeyphraseRanker>>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            index,
            ranker,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Extract keywords for an already-indexed document.
    ///
    /// `text` feeds the embedding strategy; `document_id` addresses the
    /// index for the significance strategy.
    pub async fn extract(&self, document_id: i64, text: &str) -> ExtractionResult {
        let start = Instant::now();

        let corpus_size = match self.index.count().await {
            Ok(n) => n,
            Err(e) => {
                // Without N there is no basis for either strategy; report the
                // one the empty corpus would have picked.
                warn!(
                    subsystem = "ingest",
                    component = "orchestrator",
                    op = "count",
                    document_id,
                    error = %e,
                    "Index count failed, skipping keyword extraction"
                );
                return ExtractionResult::empty(
                    ExtractionStrategy::select(0, self.config.threshold).method(),
                );
            }
        };

        let strategy = ExtractionStrategy::select(corpus_size, self.config.threshold);
        debug!(
            subsystem = "ingest",
            component = "orchestrator",
            document_id,
            corpus_size,
            threshold = self.config.threshold,
            method = strategy.method().as_str(),
            "Selected extraction strategy"
        );

        let raw = match strategy {
            ExtractionStrategy::Embedding => self.embedding_keywords(text).await,
            ExtractionStrategy::IndexSignificance => self.significant_keywords(document_id).await,
        };

        let method = strategy.method();
        let keywords = match raw {
            Ok(raw) => {
                let mut keywords = normalize_keywords(raw);
                keywords.truncate(self.config.keyword_count);
                keywords
            }
            Err(e) => {
                warn!(
                    subsystem = "ingest",
                    component = "orchestrator",
                    document_id,
                    method = method.as_str(),
                    error = %e,
                    "Keyword extraction failed"
                );
                Vec::new()
            }
        };

        info!(
            subsystem = "ingest",
            component = "orchestrator",
            op = "extract",
            document_id,
            method = method.as_str(),
            result_count = keywords.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Keyword extraction finished"
        );
        ExtractionResult::new(keywords, method)
    }

    async fn embedding_keywords(&self, text: &str) -> Result<Vec<String>> {
        match &self.ranker {
            Some(ranker) => ranker.rank(text, self.config.keyword_count).await,
            None => {
                warn!(
                    subsystem = "ingest",
                    component = "orchestrator",
                    "No keyphrase ranker configured; cold-start extraction yields no keywords"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn significant_keywords(&self, document_id: i64) -> Result<Vec<String>> {
        let k = self.config.keyword_count;
        match self.config.significance_mode {
            SignificanceMode::TermVectors => {
                let vector = self.index.term_statistics(document_id, CONTENT_FIELD).await?;
                Ok(top_terms(&vector, k, self.config.term_bounds))
            }
            SignificanceMode::Aggregation => {
                let mut terms = self
                    .index
                    .significant_terms(document_id, k * defaults::SIGNIFICANCE_OVERFETCH)
                    .await?;
                terms.truncate(k);
                Ok(terms)
            }
        }
    }

    /// Current strategy inputs, for operators.
    pub async fn status(&self) -> KeywordStatus {
        let indexed_documents = match self.index.count().await {
            Ok(n) => Some(n),
            Err(e) => {
                warn!(subsystem = "ingest", component = "orchestrator", error = %e, "Index count failed");
                None
            }
        };
        KeywordStatus {
            indexed_documents,
            threshold: self.config.threshold,
            keyword_count: self.config.keyword_count,
            active_method: indexed_documents
                .map(|n| ExtractionStrategy::select(n, self.config.threshold).method()),
            significance_mode: self.config.significance_mode,
            ranker: self.ranker.as_ref().map(|r| r.name().to_string()),
        }
    }
}
