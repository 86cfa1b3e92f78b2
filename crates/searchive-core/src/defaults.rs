//! Centralized default constants for searchive.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers; environment overrides are applied by the composition root.

// =============================================================================
// KEYWORD EXTRACTION
// =============================================================================

/// Corpus size at or above which index-significance replaces the embedding strategy.
pub const KEYWORD_THRESHOLD: u64 = 5;

/// Target number of keywords per document.
pub const KEYWORD_COUNT: usize = 5;

/// Minimum stripped character count for extracted text to be usable.
pub const MIN_TEXT_CHARS: usize = 10;

/// Candidate phrases considered before diversity selection.
pub const RANKER_CANDIDATES: usize = 20;

/// Shortest candidate n-gram (in words).
pub const RANKER_NGRAM_MIN: usize = 1;

/// Longest candidate n-gram (in words).
pub const RANKER_NGRAM_MAX: usize = 2;

/// Characters of document text sent to the embedding model.
pub const RANKER_MAX_INPUT_CHARS: usize = 8_000;

/// Shortest term (in characters) kept by index-significance scoring.
pub const TERM_MIN_CHARS: usize = 2;

/// Longest term (in characters) kept by index-significance scoring.
pub const TERM_MAX_CHARS: usize = 30;

/// Significance aggregation over-fetch factor (`K * factor` candidates).
pub const SIGNIFICANCE_OVERFETCH: usize = 2;

// =============================================================================
// SEARCH INDEX
// =============================================================================

/// Default Elasticsearch index name.
pub const INDEX_NAME: &str = "documents";

/// Default Elasticsearch endpoint.
pub const ELASTICSEARCH_URL: &str = "http://localhost:9200";

/// Elasticsearch plugin providing the language-aware analyzer.
pub const LANGUAGE_ANALYZER_PLUGIN: &str = "analysis-nori";

/// Timeout for search index requests (seconds).
pub const SEARCH_TIMEOUT_SECS: u64 = 30;

/// Upper bound on one S3 operation, retries included (seconds).
pub const S3_OPERATION_TIMEOUT_SECS: u64 = 60;

/// Redis replies slower than this fail the command (seconds).
pub const REDIS_RESPONSE_TIMEOUT_SECS: u64 = 5;

/// Server-side `statement_timeout` for pooled connections (seconds).
pub const DB_STATEMENT_TIMEOUT_SECS: u64 = 30;

/// Interval between connection pool metric logs (seconds).
pub const POOL_METRICS_INTERVAL_SECS: u64 = 60;

// =============================================================================
// EMBEDDING
// =============================================================================

/// Default Ollama endpoint.
pub const OLLAMA_URL: &str = "http://localhost:11434";

/// Default multilingual embedding model.
pub const EMBED_MODEL: &str = "bge-m3";

/// Timeout for embedding requests (seconds).
pub const EMBED_TIMEOUT_SECS: u64 = 60;

/// Embedding calls slower than this are logged at WARN.
pub const EMBED_SLOW_MS: u128 = 5_000;

// =============================================================================
// TEXT EXTRACTION
// =============================================================================

/// Timeout for external converter processes (seconds).
pub const EXTRACT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// STORAGE
// =============================================================================

/// Default bucket for the S3-compatible blob store.
pub const S3_BUCKET: &str = "documents";

/// Default root for the filesystem blob store.
pub const FILE_STORAGE_PATH: &str = "/var/lib/searchive/blobs";

/// Maximum accepted upload body (bytes).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

// =============================================================================
// REDEMPTION GUARD
// =============================================================================

/// Lifetime of a redemption claim marker (milliseconds).
pub const REDEMPTION_LOCK_TTL_MS: u64 = 10_000;

/// Lifetime of a published redemption result (seconds).
pub const REDEMPTION_RESULT_TTL_SECS: u64 = 60;

/// Times a concurrent arrival polls for the first arrival's result.
pub const REDEMPTION_RETRIES: u32 = 5;

/// Pause between polls (milliseconds).
pub const REDEMPTION_RETRY_DELAY_MS: u64 = 200;

// =============================================================================
// SERVER
// =============================================================================

/// Default bind port.
pub const SERVER_PORT: u16 = 8000;

/// Session cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session_id";
