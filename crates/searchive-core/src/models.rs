//! Core data models for searchive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// DOCUMENTS
// =============================================================================

/// An uploaded document's metadata row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub document_id: i64,
    pub user_id: i64,
    pub original_filename: String,
    /// Blob key, globally unique (`{user_id}/{uuid}{ext}`).
    pub storage_path: String,
    /// Declared MIME type.
    pub file_type: String,
    pub file_size_kb: i32,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values needed to insert a document row.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub user_id: i64,
    pub original_filename: String,
    pub storage_path: String,
    pub file_type: String,
    pub file_size_kb: i32,
}

/// A document together with its tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentWithTags {
    #[serde(flatten)]
    pub document: Document,
    pub tags: Vec<Tag>,
}

/// Raw bytes of a stored document, ready to hand back to its owner.
#[derive(Debug, Clone)]
pub struct DocumentContent {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

/// Size in whole kilobytes, rounded down.
pub fn size_in_kb(len: usize) -> i32 {
    i32::try_from(len / 1024).unwrap_or(i32::MAX)
}

// =============================================================================
// TAGS
// =============================================================================

/// A normalized keyword tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tag {
    pub tag_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Link between a document and a tag. At most one per pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentTagLink {
    pub document_id: i64,
    pub tag_id: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SEARCH INDEX
// =============================================================================

/// Search-index projection of a document. Derived, never authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedDocument {
    pub document_id: i64,
    pub user_id: i64,
    pub content: String,
    pub filename: String,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
}

impl IndexedDocument {
    /// Build the index projection of `document` carrying `content`.
    pub fn from_document(document: &Document, content: impl Into<String>) -> Self {
        Self {
            document_id: document.document_id,
            user_id: document.user_id,
            content: content.into(),
            filename: document.original_filename.clone(),
            file_type: document.file_type.clone(),
            uploaded_at: document.uploaded_at,
        }
    }
}

/// Per-term statistics for one document field.
#[derive(Debug, Clone, PartialEq)]
pub struct TermStatistic {
    pub term: String,
    /// Occurrences of the term in this document.
    pub term_freq: u64,
    /// Documents in the corpus containing the term.
    pub doc_freq: u64,
}

/// Term statistics for one document, in the order the index returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermVector {
    /// Documents in the corpus with this field.
    pub doc_count: u64,
    pub terms: Vec<TermStatistic>,
}

/// Analyzer pipeline chosen at index-creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalyzerProfile {
    /// Morphological analyzer plugin present; grammatical particles are stripped.
    LanguageAware,
    /// Plugin absent; whitespace/punctuation tokenizer only.
    Generic,
}

impl AnalyzerProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzerProfile::LanguageAware => "language-aware",
            AnalyzerProfile::Generic => "generic",
        }
    }
}

/// Which index-side computation backs the index-significance strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignificanceMode {
    /// Fetch term statistics and score TF-IDF locally.
    #[default]
    TermVectors,
    /// Delegate to the engine's significance aggregation.
    Aggregation,
}

impl std::str::FromStr for SignificanceMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "term-vectors" | "termvectors" => Ok(SignificanceMode::TermVectors),
            "aggregation" | "significant-text" => Ok(SignificanceMode::Aggregation),
            other => Err(crate::Error::Config(format!(
                "unknown significance mode '{other}'"
            ))),
        }
    }
}

// =============================================================================
// KEYWORD EXTRACTION
// =============================================================================

/// The two extraction strategies the orchestrator chooses between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Cold start: rank candidate phrases by embedding similarity.
    Embedding,
    /// Compare this document's term distribution against the corpus.
    IndexSignificance,
}

impl ExtractionStrategy {
    /// Pick a strategy from corpus size `n` and threshold `t`.
    pub fn select(n: u64, t: u64) -> Self {
        if n < t {
            ExtractionStrategy::Embedding
        } else {
            ExtractionStrategy::IndexSignificance
        }
    }

    /// The method tag reported for this strategy.
    pub fn method(&self) -> ExtractionMethod {
        match self {
            ExtractionStrategy::Embedding => ExtractionMethod::Embedding,
            ExtractionStrategy::IndexSignificance => ExtractionMethod::IndexSignificance,
        }
    }
}

/// Method tag attached to an extraction outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    Embedding,
    IndexSignificance,
    /// Extraction input was unusable; assigned by the ingestion pipeline only.
    None,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Embedding => "embedding",
            ExtractionMethod::IndexSignificance => "index-significance",
            ExtractionMethod::None => "none",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized keywords plus the method that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub keywords: Vec<String>,
    pub method: ExtractionMethod,
}

impl ExtractionResult {
    pub fn new(keywords: Vec<String>, method: ExtractionMethod) -> Self {
        Self { keywords, method }
    }

    pub fn empty(method: ExtractionMethod) -> Self {
        Self {
            keywords: Vec::new(),
            method,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

// =============================================================================
// TEXT EXTRACTION
// =============================================================================

/// Why text extraction produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// Declared MIME type has no extractor.
    UnsupportedFormat(String),
    /// The extractor ran and failed.
    Failed { reason: String },
    /// Extraction succeeded but the stripped text is below the minimum.
    TooShort { chars: usize },
}

impl std::fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionFailure::UnsupportedFormat(mime) => write!(f, "unsupported format: {mime}"),
            ExtractionFailure::Failed { reason } => write!(f, "extraction failed: {reason}"),
            ExtractionFailure::TooShort { chars } => {
                write!(f, "extracted text too short ({chars} chars)")
            }
        }
    }
}

// =============================================================================
// INGESTION
// =============================================================================

/// Ingestion pipeline states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionState {
    Validating,
    Stored,
    PersistedMetadata,
    TextExtracted,
    Indexed,
    Tagged,
    Complete,
    Degraded,
    Failed,
}

impl IngestionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IngestionState::Complete | IngestionState::Degraded | IngestionState::Failed
        )
    }

    /// States from which a transition to `Degraded` is allowed.
    pub fn can_degrade(&self) -> bool {
        matches!(
            self,
            IngestionState::PersistedMetadata
                | IngestionState::TextExtracted
                | IngestionState::Indexed
                | IngestionState::Tagged
        )
    }
}

/// Why an ingestion ended in `Degraded`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum DegradedReason {
    /// Text could not be extracted or was too short.
    NoUsableText(String),
    /// The search index rejected the upsert.
    IndexUnavailable(String),
    /// Keyword extraction returned nothing.
    NoKeywords,
    /// Tag persistence failed after keywords were found.
    TaggingFailed(String),
}

/// Caller-visible result of a successful ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionOutcome {
    pub document: Document,
    pub tags: Vec<Tag>,
    pub extraction_method: ExtractionMethod,
    /// `Complete` or `Degraded`.
    pub state: IngestionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<DegradedReason>,
}

/// Result of deleting a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    pub document_id: i64,
    pub blob_deleted: bool,
    pub index_cleaned: bool,
}

/// Totals from a full reindex run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexReport {
    pub indexed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_selection_boundaries() {
        assert_eq!(ExtractionStrategy::select(0, 5), ExtractionStrategy::Embedding);
        assert_eq!(ExtractionStrategy::select(4, 5), ExtractionStrategy::Embedding);
        assert_eq!(
            ExtractionStrategy::select(5, 5),
            ExtractionStrategy::IndexSignificance
        );
        assert_eq!(
            ExtractionStrategy::select(10, 5),
            ExtractionStrategy::IndexSignificance
        );
    }

    #[test]
    fn test_strategy_zero_threshold_always_significance() {
        for n in [0, 1, 1000] {
            assert_eq!(
                ExtractionStrategy::select(n, 0),
                ExtractionStrategy::IndexSignificance
            );
        }
    }

    #[test]
    fn test_method_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ExtractionMethod::IndexSignificance).unwrap(),
            "\"index-significance\""
        );
        assert_eq!(
            serde_json::to_string(&ExtractionMethod::None).unwrap(),
            "\"none\""
        );
        assert_eq!(ExtractionStrategy::Embedding.method().as_str(), "embedding");
    }

    #[test]
    fn test_size_in_kb_rounds_down() {
        assert_eq!(size_in_kb(0), 0);
        assert_eq!(size_in_kb(1023), 0);
        assert_eq!(size_in_kb(1024), 1);
        assert_eq!(size_in_kb(5 * 1024 + 900), 5);
    }

    #[test]
    fn test_degrade_only_after_metadata() {
        assert!(!IngestionState::Validating.can_degrade());
        assert!(!IngestionState::Stored.can_degrade());
        assert!(IngestionState::PersistedMetadata.can_degrade());
        assert!(IngestionState::Indexed.can_degrade());
        assert!(IngestionState::Failed.is_terminal());
        assert!(!IngestionState::Tagged.is_terminal());
    }

    #[test]
    fn test_significance_mode_parse() {
        assert_eq!(
            "aggregation".parse::<SignificanceMode>().unwrap(),
            SignificanceMode::Aggregation
        );
        assert_eq!(
            "Term-Vectors".parse::<SignificanceMode>().unwrap(),
            SignificanceMode::TermVectors
        );
        assert!("bogus".parse::<SignificanceMode>().is_err());
    }
}
