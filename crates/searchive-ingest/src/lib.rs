//! # searchive-ingest
//!
//! Document ingestion for searchive.
//!
//! This crate provides:
//! - [`ExtractionRegistry`]: bytes + MIME type to plain text via external tools
//! - [`KeywordExtractionOrchestrator`]: cold-start embedding ranking or
//!   index-significance scoring, chosen per call from the corpus size
//! - [`IngestionPipeline`]: upload, query and delete with degraded outcomes
//! - [`Reindexer`]: rebuild the search index from stored blobs
//!
//! ## Example
//!
//! ```ignore
//! let orchestrator = Arc::new(KeywordExtractionOrchestrator::new(
//!     index.clone(),
//!     ranker,
//!     OrchestratorConfig::default(),
//! ));
//! let pipeline = IngestionPipeline::new(blobs, documents, tags,
//!     Arc::new(ExtractionRegistry::with_default_adapters()), index, orchestrator);
//!
//! let outcome = pipeline.ingest(upload).await?;
//! println!("{:?} via {}", outcome.state, outcome.extraction_method);
//! ```

pub mod adapters;
pub mod extraction;
pub mod orchestrator;
pub mod pipeline;
pub mod reindex;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use adapters::{HwpAdapter, OfficeConvertAdapter, PdfTextAdapter, TextNativeAdapter};
pub use extraction::ExtractionRegistry;
pub use orchestrator::{KeywordExtractionOrchestrator, KeywordStatus, OrchestratorConfig};
pub use pipeline::{storage_key, IngestionPipeline, Upload};
pub use reindex::Reindexer;
