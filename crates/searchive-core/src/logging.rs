//! Structured logging schema and field name constants for searchive.
//!
//! All crates use these names for structured `tracing` fields so log
//! aggregation can query the same field across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention (index upsert failed, blob delete failed) |
//! | WARN  | Recoverable issue, automatic fallback applied (generic analyzer, short extraction) |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, strategy selection |
//! | TRACE | Per-item iteration, high-volume data (terms, candidates) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the `x-request-id` header.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "search", "inference", "ingest"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pipeline", "orchestrator", "elasticsearch", "ollama", "tags"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "ingest", "extract_keywords", "upsert", "bulk_get_or_create"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Document id being operated on.
pub const DOCUMENT_ID: &str = "document_id";

/// Owning user id.
pub const USER_ID: &str = "user_id";

/// Blob storage key.
pub const STORAGE_KEY: &str = "storage_key";

/// Declared MIME type.
pub const MIME_TYPE: &str = "mime_type";

// ─── Keyword extraction fields ─────────────────────────────────────────────

/// Extraction method tag ("embedding", "index-significance", "none").
pub const METHOD: &str = "method";

/// Indexed corpus size observed at strategy selection.
pub const CORPUS_SIZE: &str = "corpus_size";

/// Configured strategy threshold.
pub const THRESHOLD: &str = "threshold";

/// Terminal pipeline state.
pub const STATE: &str = "state";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of items returned by an operation.
pub const RESULT_COUNT: &str = "result_count";

/// Character length of extracted text.
pub const TEXT_LEN: &str = "text_len";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Whether the operation succeeded.
pub const SUCCESS: &str = "success";

/// Error message on failure.
pub const ERROR_MSG: &str = "error";
