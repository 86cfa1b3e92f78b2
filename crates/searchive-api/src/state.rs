//! Shared application state.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;

use searchive_core::{AnalyzerProfile, DocumentFormat};
use searchive_ingest::IngestionPipeline;

use crate::config::BlobBackend;
use crate::session::SessionStore;

/// Dependency capabilities resolved once at startup and reported by `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub analyzer: &'static str,
    /// Ranker name, or `None` when cold-start ranking is disabled.
    pub ranker: Option<String>,
    pub blob_backend: &'static str,
    /// Extraction tool availability per format family.
    pub extraction: BTreeMap<String, bool>,
}

impl Capabilities {
    pub fn new(
        analyzer: AnalyzerProfile,
        ranker: Option<String>,
        blob_backend: BlobBackend,
        extraction: &HashMap<DocumentFormat, bool>,
    ) -> Self {
        Self {
            analyzer: analyzer.as_str(),
            ranker,
            blob_backend: match blob_backend {
                BlobBackend::S3 => "s3",
                BlobBackend::Filesystem => "filesystem",
            },
            extraction: extraction
                .iter()
                .map(|(format, ok)| (format.as_str().to_string(), *ok))
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestionPipeline>,
    pub sessions: Arc<dyn SessionStore>,
    pub capabilities: Arc<Capabilities>,
}
