//! Core traits for searchive.
//!
//! These are the seams between the ingestion core and its collaborators.
//! Production implementations live in `searchive-db`, `searchive-search`,
//! `searchive-inference` and `searchive-ingest`.

use async_trait::async_trait;

use crate::{
    AnalyzerProfile, Document, DocumentFormat, ExtractionFailure, IndexedDocument, NewDocument,
    Result, Tag, TermVector,
};

// =============================================================================
// STORAGE
// =============================================================================

/// Object storage addressed by key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, overwriting any existing object.
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    /// Fetch the object stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Remove the object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

/// Repository for document metadata rows.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a document row and return it with its assigned id.
    async fn insert(&self, doc: NewDocument) -> Result<Document>;

    /// Fetch a document owned by `user_id`.
    async fn find_for_owner(&self, document_id: i64, user_id: i64) -> Result<Option<Document>>;

    /// List a user's documents, newest first.
    async fn list_for_owner(&self, user_id: i64) -> Result<Vec<Document>>;

    /// List every document, oldest first.
    async fn list_all(&self) -> Result<Vec<Document>>;

    /// Delete a document row. Tag links cascade. Returns false if no row matched.
    async fn delete(&self, document_id: i64) -> Result<bool>;
}

/// Tag get-or-create and document linking.
#[async_trait]
pub trait TagCatalog: Send + Sync {
    /// Resolve existing tags for `names` in one query and create only the
    /// missing ones. Names are normalized first; empty names are skipped.
    async fn bulk_get_or_create(&self, names: &[String]) -> Result<Vec<Tag>>;

    /// Get-or-create `names` and link each to `document_id`.
    async fn attach_tags_to_document(&self, document_id: i64, names: &[String])
        -> Result<Vec<Tag>>;

    /// Tags linked to a document, ordered by name.
    async fn get_tags_by_document_id(&self, document_id: i64) -> Result<Vec<Tag>>;

    /// Look up one tag by (normalized) name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>>;
}

// =============================================================================
// SEARCH INDEX
// =============================================================================

/// Full-text inverted index over documents.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Analyzer the index was (or will be) created with.
    fn analyzer(&self) -> AnalyzerProfile;

    /// Create the index if it does not exist.
    async fn ensure_index(&self) -> Result<()>;

    /// Drop and recreate the index, discarding all documents.
    async fn recreate_index(&self) -> Result<()>;

    /// Insert or overwrite the document keyed by its id.
    async fn upsert(&self, doc: &IndexedDocument) -> Result<()>;

    /// Remove a document. Returns false if it was not indexed.
    async fn delete(&self, document_id: i64) -> Result<bool>;

    /// Total number of indexed documents.
    async fn count(&self) -> Result<u64>;

    /// Per-term statistics for `field` of one document.
    async fn term_statistics(&self, document_id: i64, field: &str) -> Result<TermVector>;

    /// Terms of one document ranked by significance against the corpus.
    async fn significant_terms(&self, document_id: i64, size: usize) -> Result<Vec<String>>;
}

// =============================================================================
// KEYPHRASE RANKING
// =============================================================================

/// Text embedding model.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed each text; output order matches input order.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Model identifier for logs.
    fn model_name(&self) -> &str;
}

/// Text to ranked key phrases, with no corpus context.
#[async_trait]
pub trait KeyphraseRanker: Send + Sync {
    /// Return up to `top_n` diverse key phrases for `text`, best first.
    async fn rank(&self, text: &str, top_n: usize) -> Result<Vec<String>>;

    /// Ranker name for logs.
    fn name(&self) -> &str;
}

// =============================================================================
// TEXT EXTRACTION
// =============================================================================

/// Adapter that turns one family of formats into plain text.
#[async_trait]
pub trait ExtractionAdapter: Send + Sync {
    /// Format family handled.
    fn format(&self) -> DocumentFormat;

    /// Extract text. Errors are converted to `ExtractionFailure` by the gateway.
    async fn extract(&self, data: &[u8], mime_type: &str, filename: &str) -> Result<String>;

    /// Check that external tools this adapter needs are available.
    async fn health_check(&self) -> Result<bool>;

    /// Adapter name for logs.
    fn name(&self) -> &str;
}

/// Bytes plus declared MIME type to usable plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text, or say why nothing usable came out. Never errors.
    async fn extract(
        &self,
        data: &[u8],
        mime_type: &str,
        filename: &str,
    ) -> std::result::Result<String, ExtractionFailure>;
}
