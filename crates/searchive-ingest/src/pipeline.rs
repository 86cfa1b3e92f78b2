//! Document ingestion and deletion.
//!
//! Upload runs strictly in order:
//!
//! ```text
//! Validating -> Stored -> PersistedMetadata -> TextExtracted -> Indexed -> Tagged -> Complete
//! ```
//!
//! Failures before the metadata row exists are request errors. From
//! `PersistedMetadata` on, the document is usable and every later failure
//! (no text, index write rejected, no keywords, tag write failed) ends in
//! `Degraded` instead of an error.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use searchive_core::{
    file_extension, is_supported_mime, size_in_kb, BlobStore, DegradedReason, DeletionReport,
    Document, DocumentContent, DocumentRepository, DocumentWithTags, Error, ExtractionMethod,
    IndexedDocument, IngestionOutcome, IngestionState, NewDocument, Result, SearchIndex, Tag,
    TagCatalog, TextExtractor,
};

use crate::orchestrator::KeywordExtractionOrchestrator;

/// Longest filename stored, matching the `documents.original_filename` column.
pub const MAX_FILENAME_CHARS: usize = 255;

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub user_id: i64,
    pub filename: String,
    /// Declared MIME type.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Storage key for a new upload: `{user_id}/{uuid}{ext}`.
pub fn storage_key(user_id: i64, filename: &str) -> String {
    format!("{}/{}{}", user_id, Uuid::new_v4(), file_extension(filename))
}

/// Tracks the pipeline state for one upload and logs every transition.
struct Progress {
    state: IngestionState,
    user_id: i64,
    document_id: Option<i64>,
}

impl Progress {
    fn new(user_id: i64) -> Self {
        Self {
            state: IngestionState::Validating,
            user_id,
            document_id: None,
        }
    }

    fn advance(&mut self, next: IngestionState) {
        debug!(
            subsystem = "ingest",
            component = "pipeline",
            user_id = self.user_id,
            document_id = self.document_id,
            from = ?self.state,
            to = ?next,
            "State transition"
        );
        self.state = next;
    }

    fn degrade(
        &mut self,
        document: Document,
        method: ExtractionMethod,
        reason: DegradedReason,
    ) -> IngestionOutcome {
        debug_assert!(self.state.can_degrade(), "cannot degrade from {:?}", self.state);
        warn!(
            subsystem = "ingest",
            component = "pipeline",
            document_id = document.document_id,
            from = ?self.state,
            ?reason,
            "Ingestion degraded"
        );
        self.state = IngestionState::Degraded;
        IngestionOutcome {
            document,
            tags: Vec::new(),
            extraction_method: method,
            state: IngestionState::Degraded,
            degraded: Some(reason),
        }
    }

    fn fail(&mut self, err: Error) -> Error {
        error!(
            subsystem = "ingest",
            component = "pipeline",
            user_id = self.user_id,
            from = ?self.state,
            error = %err,
            "Ingestion failed"
        );
        self.state = IngestionState::Failed;
        err
    }
}

/// Sequences storage, metadata, extraction, indexing and tagging.
pub struct IngestionPipeline {
    blobs: Arc<dyn BlobStore>,
    documents: Arc<dyn DocumentRepository>,
    tags: Arc<dyn TagCatalog>,
    extractor: Arc<dyn TextExtractor>,
    index: Arc<dyn SearchIndex>,
    orchestrator: Arc<KeywordExtractionOrchestrator>,
}

impl IngestionPipeline {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        documents: Arc<dyn DocumentRepository>,
        tags: Arc<dyn TagCatalog>,
        extractor: Arc<dyn TextExtractor>,
        index: Arc<dyn SearchIndex>,
        orchestrator: Arc<KeywordExtractionOrchestrator>,
    ) -> Self {
        Self {
            blobs,
            documents,
            tags,
            extractor,
            index,
            orchestrator,
        }
    }

    pub fn orchestrator(&self) -> &KeywordExtractionOrchestrator {
        &self.orchestrator
    }

    /// Run [`ingest`](Self::ingest) on its own task so it reaches a terminal
    /// state even if the caller stops waiting.
    pub async fn ingest_detached(self: &Arc<Self>, upload: Upload) -> Result<IngestionOutcome> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move { pipeline.ingest(upload).await })
            .await
            .map_err(|e| Error::Internal(format!("ingestion task failed: {}", e)))?
    }

    /// Ingest one upload.
    ///
    /// Errors only for an unsupported MIME type, a blob write failure or a
    /// metadata write failure; everything after that degrades.
    #[instrument(skip(self, upload), fields(subsystem = "ingest", component = "pipeline", op = "ingest", user_id = upload.user_id, mime_type = %upload.content_type))]
    pub async fn ingest(&self, upload: Upload) -> Result<IngestionOutcome> {
        let start = Instant::now();
        let mut progress = Progress::new(upload.user_id);

        // Validating
        if !is_supported_mime(&upload.content_type) {
            return Err(progress.fail(Error::UnsupportedFormat(upload.content_type)));
        }
        let filename: String = upload.filename.trim().chars().take(MAX_FILENAME_CHARS).collect();
        if filename.is_empty() {
            return Err(progress.fail(Error::InvalidInput("filename is required".to_string())));
        }

        // Stored
        let key = storage_key(upload.user_id, &filename);
        if let Err(e) = self
            .blobs
            .put(&key, &upload.bytes, &upload.content_type)
            .await
        {
            return Err(progress.fail(e));
        }
        progress.advance(IngestionState::Stored);

        // PersistedMetadata
        let new_doc = NewDocument {
            user_id: upload.user_id,
            original_filename: filename.clone(),
            storage_path: key.clone(),
            file_type: upload.content_type.clone(),
            file_size_kb: size_in_kb(upload.bytes.len()),
        };
        let document = match self.documents.insert(new_doc).await {
            Ok(doc) => doc,
            Err(e) => {
                // The blob is left for out-of-band reconciliation.
                warn!(storage_key = %key, "Metadata write failed, blob orphaned");
                return Err(progress.fail(e));
            }
        };
        progress.document_id = Some(document.document_id);
        progress.advance(IngestionState::PersistedMetadata);

        // TextExtracted
        let text = match self
            .extractor
            .extract(&upload.bytes, &upload.content_type, &filename)
            .await
        {
            Ok(text) => text,
            Err(failure) => {
                return Ok(progress.degrade(
                    document,
                    ExtractionMethod::None,
                    DegradedReason::NoUsableText(failure.to_string()),
                ))
            }
        };
        progress.advance(IngestionState::TextExtracted);

        // Indexed
        let indexed = IndexedDocument::from_document(&document, text.as_str());
        if let Err(e) = self.index.upsert(&indexed).await {
            error!(document_id = document.document_id, error = %e, "Index upsert failed");
            return Ok(progress.degrade(
                document,
                ExtractionMethod::None,
                DegradedReason::IndexUnavailable(e.to_string()),
            ));
        }
        progress.advance(IngestionState::Indexed);

        // Tagged
        let extraction = self.orchestrator.extract(document.document_id, &text).await;
        if extraction.is_empty() {
            return Ok(progress.degrade(
                document,
                extraction.method,
                DegradedReason::NoKeywords,
            ));
        }
        let tags = match self
            .tags
            .attach_tags_to_document(document.document_id, &extraction.keywords)
            .await
        {
            Ok(tags) => tags,
            Err(e) => {
                error!(document_id = document.document_id, error = %e, "Tag attachment failed");
                return Ok(progress.degrade(
                    document,
                    extraction.method,
                    DegradedReason::TaggingFailed(e.to_string()),
                ));
            }
        };
        progress.advance(IngestionState::Tagged);

        progress.advance(IngestionState::Complete);
        info!(
            document_id = document.document_id,
            storage_key = %document.storage_path,
            method = extraction.method.as_str(),
            result_count = tags.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Document ingested"
        );
        Ok(IngestionOutcome {
            document,
            tags,
            extraction_method: extraction.method,
            state: IngestionState::Complete,
            degraded: None,
        })
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    async fn owned(&self, document_id: i64, user_id: i64) -> Result<Document> {
        self.documents
            .find_for_owner(document_id, user_id)
            .await?
            .ok_or(Error::DocumentNotFound(document_id))
    }

    /// A user's documents with their tags, newest first.
    pub async fn list_documents(&self, user_id: i64) -> Result<Vec<DocumentWithTags>> {
        let documents = self.documents.list_for_owner(user_id).await?;
        let mut out = Vec::with_capacity(documents.len());
        for document in documents {
            let tags = self.tags.get_tags_by_document_id(document.document_id).await?;
            out.push(DocumentWithTags { document, tags });
        }
        Ok(out)
    }

    /// One document with its tags. Another owner's document is not found.
    pub async fn get_document(&self, document_id: i64, user_id: i64) -> Result<DocumentWithTags> {
        let document = self.owned(document_id, user_id).await?;
        let tags = self.tags.get_tags_by_document_id(document_id).await?;
        Ok(DocumentWithTags { document, tags })
    }

    /// Tags of a document the user owns.
    pub async fn get_tags_by_document_id(&self, document_id: i64, user_id: i64) -> Result<Vec<Tag>> {
        self.owned(document_id, user_id).await?;
        self.tags.get_tags_by_document_id(document_id).await
    }

    /// Stored bytes of a document the user owns.
    pub async fn download_document(
        &self,
        document_id: i64,
        user_id: i64,
    ) -> Result<DocumentContent> {
        let document = self.owned(document_id, user_id).await?;
        let bytes = self.blobs.get(&document.storage_path).await?;
        Ok(DocumentContent {
            bytes,
            content_type: document.file_type,
            filename: document.original_filename,
        })
    }

    // =========================================================================
    // DELETION
    // =========================================================================

    /// Delete a document: blob first, then the metadata row (tag links
    /// cascade), then the index entry.
    ///
    /// The row delete is attempted even if the blob delete failed; the call
    /// then reports the blob failure. Index cleanup is best-effort and a
    /// document that was never indexed is not an error.
    #[instrument(skip(self), fields(subsystem = "ingest", component = "pipeline", op = "delete"))]
    pub async fn delete_document(&self, document_id: i64, user_id: i64) -> Result<DeletionReport> {
        let document = self.owned(document_id, user_id).await?;

        let blob_result = self.blobs.delete(&document.storage_path).await;
        if let Err(e) = &blob_result {
            error!(
                document_id,
                storage_key = %document.storage_path,
                error = %e,
                "Blob delete failed; removing metadata anyway"
            );
        }

        let removed = self.documents.delete(document_id).await?;
        if !removed {
            debug!(document_id, "Metadata row already gone");
        }

        let index_cleaned = match self.index.delete(document_id).await {
            Ok(found) => {
                if !found {
                    debug!(document_id, "Document was not indexed");
                }
                true
            }
            Err(e) => {
                warn!(document_id, error = %e, "Index cleanup failed; entry may be stale");
                false
            }
        };

        if let Err(e) = blob_result {
            return Err(Error::Storage(format!(
                "document {} metadata removed but blob delete failed: {}",
                document_id, e
            )));
        }

        info!(document_id, user_id, index_cleaned, "Document deleted");
        Ok(DeletionReport {
            document_id,
            blob_deleted: true,
            index_cleaned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ExtractionRegistry;
    use crate::orchestrator::OrchestratorConfig;
    use crate::testing::*;
    use crate::adapters::TextNativeAdapter;
    use searchive_core::{ErrorKind, ExtractionFailure, TermStatistic, TermVector};

    const HELLO_KO: &str = "안녕하세요. 이것은 테스트 문서입니다.";

    struct Harness {
        blobs: Arc<FakeBlobStore>,
        documents: Arc<FakeDocumentRepository>,
        tags: Arc<FakeTagCatalog>,
        index: Arc<FakeSearchIndex>,
        ranker: Arc<FakeRanker>,
        pipeline: Arc<IngestionPipeline>,
    }

    fn harness_with(
        corpus: u64,
        extractor: Arc<dyn TextExtractor>,
        ranker: FakeRanker,
    ) -> Harness {
        let blobs = Arc::new(FakeBlobStore::new());
        let documents = Arc::new(FakeDocumentRepository::new());
        let tags = Arc::new(FakeTagCatalog::new());
        let index = Arc::new(FakeSearchIndex::with_count(corpus));
        let ranker = Arc::new(ranker);
        let orchestrator = Arc::new(KeywordExtractionOrchestrator::new(
            index.clone(),
            Some(ranker.clone()),
            OrchestratorConfig {
                threshold: 5,
                ..OrchestratorConfig::default()
            },
        ));
        let pipeline = Arc::new(IngestionPipeline::new(
            blobs.clone(),
            documents.clone(),
            tags.clone(),
            extractor,
            index.clone(),
            orchestrator,
        ));
        Harness {
            blobs,
            documents,
            tags,
            index,
            ranker,
            pipeline,
        }
    }

    fn text_extractor() -> Arc<dyn TextExtractor> {
        let mut registry = ExtractionRegistry::new();
        registry.register(Arc::new(TextNativeAdapter));
        Arc::new(registry)
    }

    fn harness(corpus: u64) -> Harness {
        harness_with(
            corpus,
            text_extractor(),
            FakeRanker::returning(&["안녕하세요", "테스트 문서", "Test 문서"]),
        )
    }

    fn upload(user_id: i64, filename: &str, content_type: &str, bytes: &[u8]) -> Upload {
        Upload {
            user_id,
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    fn hello(user_id: i64) -> Upload {
        upload(user_id, "hello.txt", "text/plain", HELLO_KO.as_bytes())
    }

    #[tokio::test]
    async fn test_cold_start_upload_completes_with_embedding() {
        let h = harness(0);
        let outcome = h.pipeline.ingest(hello(1)).await.unwrap();

        assert_eq!(outcome.state, IngestionState::Complete);
        assert_eq!(outcome.extraction_method, ExtractionMethod::Embedding);
        assert!(outcome.tags.len() <= 5);
        for tag in &outcome.tags {
            assert_eq!(tag.name, tag.name.trim().to_lowercase());
        }
        assert_eq!(h.ranker.calls(), 1);
        assert!(h.index.indexed(outcome.document.document_id).is_some());
        assert!(h.blobs.contains(&outcome.document.storage_path));
    }

    #[tokio::test]
    async fn test_empty_extraction_degrades_with_method_none() {
        let h = harness_with(
            0,
            Arc::new(FakeTextExtractor::failing(ExtractionFailure::TooShort {
                chars: 0,
            })),
            FakeRanker::returning(&["unused"]),
        );
        let outcome = h
            .pipeline
            .ingest(upload(1, "scan.pdf", "application/pdf", b"%PDF-1.4 image only"))
            .await
            .unwrap();

        assert_eq!(outcome.state, IngestionState::Degraded);
        assert_eq!(outcome.extraction_method, ExtractionMethod::None);
        assert!(outcome.tags.is_empty());
        assert!(matches!(
            outcome.degraded,
            Some(DegradedReason::NoUsableText(_))
        ));
        // Document still stored and retrievable.
        let fetched = h
            .pipeline
            .get_document(outcome.document.document_id, 1)
            .await
            .unwrap();
        assert!(fetched.tags.is_empty());
        assert_eq!(h.ranker.calls(), 0);
    }

    #[tokio::test]
    async fn test_large_corpus_selects_index_significance() {
        let h = harness(10);
        // Fake document ids start at 1.
        h.index.set_term_vector(
            1,
            TermVector {
                doc_count: 10,
                terms: vec![
                    TermStatistic {
                        term: "테스트".to_string(),
                        term_freq: 2,
                        doc_freq: 1,
                    },
                    TermStatistic {
                        term: "문서".to_string(),
                        term_freq: 1,
                        doc_freq: 9,
                    },
                ],
            },
        );
        let outcome = h.pipeline.ingest(hello(1)).await.unwrap();

        assert_eq!(outcome.extraction_method, ExtractionMethod::IndexSignificance);
        assert_eq!(outcome.state, IngestionState::Complete);
        let names: Vec<_> = outcome.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["테스트", "문서"]);
        assert_eq!(h.ranker.calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_never_indexed_document_succeeds() {
        let h = harness(0);
        h.index.set_fail_upsert(true);
        let outcome = h.pipeline.ingest(hello(1)).await.unwrap();
        assert_eq!(outcome.state, IngestionState::Degraded);
        assert!(matches!(
            outcome.degraded,
            Some(DegradedReason::IndexUnavailable(_))
        ));

        let id = outcome.document.document_id;
        let report = h.pipeline.delete_document(id, 1).await.unwrap();
        assert!(report.blob_deleted);
        assert!(report.index_cleaned);
        assert!(h.blobs.is_empty());
        assert!(h.documents.get(id).is_none());
    }

    #[tokio::test]
    async fn test_tag_round_trip_matches_normalized_keyword() {
        let h = harness_with(
            0,
            text_extractor(),
            FakeRanker::returning(&["  Elasticsearch  "]),
        );
        let outcome = h.pipeline.ingest(hello(1)).await.unwrap();
        let tags = h
            .pipeline
            .get_tags_by_document_id(outcome.document.document_id, 1)
            .await
            .unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "elasticsearch");
    }

    #[tokio::test]
    async fn test_unsupported_mime_rejected_without_side_effects() {
        let h = harness(0);
        let err = h
            .pipeline
            .ingest(upload(1, "photo.png", "image/png", b"\x89PNG"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(h.blobs.is_empty());
        assert!(h.documents.is_empty());
    }

    #[tokio::test]
    async fn test_blob_failure_fails_without_metadata() {
        let h = harness(0);
        h.blobs.set_fail_put(true);
        let err = h.pipeline.ingest(hello(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyUnavailable);
        assert!(h.documents.is_empty());
    }

    #[tokio::test]
    async fn test_metadata_failure_fails_and_orphans_blob() {
        let h = harness(0);
        h.documents.set_fail_insert(true);
        assert!(h.pipeline.ingest(hello(1)).await.is_err());
        assert_eq!(h.blobs.len(), 1);
        assert!(h.index.indexed(1).is_none());
    }

    #[tokio::test]
    async fn test_no_keywords_degrades_with_accurate_method() {
        let h = harness_with(0, text_extractor(), FakeRanker::returning(&[]));
        let outcome = h.pipeline.ingest(hello(1)).await.unwrap();
        assert_eq!(outcome.state, IngestionState::Degraded);
        assert_eq!(outcome.degraded, Some(DegradedReason::NoKeywords));
        assert_eq!(outcome.extraction_method, ExtractionMethod::Embedding);
    }

    #[tokio::test]
    async fn test_ranker_failure_degrades_not_errors() {
        let h = harness_with(0, text_extractor(), FakeRanker::failing());
        let outcome = h.pipeline.ingest(hello(1)).await.unwrap();
        assert_eq!(outcome.state, IngestionState::Degraded);
        assert_eq!(outcome.extraction_method, ExtractionMethod::Embedding);
    }

    #[tokio::test]
    async fn test_tagging_failure_degrades() {
        let h = harness(0);
        h.tags.set_fail(true);
        let outcome = h.pipeline.ingest(hello(1)).await.unwrap();
        assert_eq!(outcome.state, IngestionState::Degraded);
        assert!(matches!(
            outcome.degraded,
            Some(DegradedReason::TaggingFailed(_))
        ));
        assert!(outcome.tags.is_empty());
    }

    #[tokio::test]
    async fn test_storage_key_layout() {
        let h = harness(0);
        let outcome = h
            .pipeline
            .ingest(upload(42, "Report.TXT", "text/plain", HELLO_KO.as_bytes()))
            .await
            .unwrap();
        let key = &outcome.document.storage_path;
        let (owner, rest) = key.split_once('/').unwrap();
        assert_eq!(owner, "42");
        assert!(rest.ends_with(".txt"));
        assert!(Uuid::parse_str(rest.trim_end_matches(".txt")).is_ok());
        assert_eq!(outcome.document.original_filename, "Report.TXT");
    }

    #[test]
    fn test_storage_keys_are_unique() {
        assert_ne!(storage_key(1, "a.pdf"), storage_key(1, "a.pdf"));
    }

    #[tokio::test]
    async fn test_size_kb_rounds_down() {
        let h = harness(0);
        let mut bytes = HELLO_KO.as_bytes().to_vec();
        bytes.resize(2047, b' ');
        let outcome = h
            .pipeline
            .ingest(upload(1, "big.txt", "text/plain", &bytes))
            .await
            .unwrap();
        assert_eq!(outcome.document.file_size_kb, 1);
    }

    #[tokio::test]
    async fn test_other_owner_cannot_read_or_delete() {
        let h = harness(0);
        let outcome = h.pipeline.ingest(hello(1)).await.unwrap();
        let id = outcome.document.document_id;

        let err = h.pipeline.get_document(id, 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = h.pipeline.download_document(id, 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = h.pipeline.delete_document(id, 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(h.documents.get(id).is_some());
    }

    #[tokio::test]
    async fn test_download_returns_original_bytes() {
        let h = harness(0);
        let outcome = h.pipeline.ingest(hello(1)).await.unwrap();
        let content = h
            .pipeline
            .download_document(outcome.document.document_id, 1)
            .await
            .unwrap();
        assert_eq!(content.bytes, HELLO_KO.as_bytes());
        assert_eq!(content.content_type, "text/plain");
        assert_eq!(content.filename, "hello.txt");
    }

    #[tokio::test]
    async fn test_list_documents_newest_first_with_tags() {
        let h = harness(0);
        let first = h.pipeline.ingest(hello(1)).await.unwrap();
        let second = h.pipeline.ingest(hello(1)).await.unwrap();
        h.pipeline.ingest(hello(2)).await.unwrap();

        let listed = h.pipeline.list_documents(1).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].document.document_id, second.document.document_id);
        assert_eq!(listed[1].document.document_id, first.document.document_id);
        assert!(!listed[0].tags.is_empty());
    }

    #[tokio::test]
    async fn test_blob_delete_failure_still_removes_row_and_reports() {
        let h = harness(0);
        let outcome = h.pipeline.ingest(hello(1)).await.unwrap();
        let id = outcome.document.document_id;
        h.blobs.set_fail_delete(true);

        let err = h.pipeline.delete_document(id, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyUnavailable);
        assert!(err.to_string().contains("blob delete failed"));
        assert!(h.documents.get(id).is_none());
        assert!(h.index.indexed(id).is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_index_entry() {
        let h = harness(0);
        let outcome = h.pipeline.ingest(hello(1)).await.unwrap();
        let id = outcome.document.document_id;
        assert!(h.index.indexed(id).is_some());

        h.pipeline.delete_document(id, 1).await.unwrap();
        assert!(h.index.indexed(id).is_none());
    }

    #[tokio::test]
    async fn test_index_outage_during_delete_is_best_effort() {
        let h = harness(0);
        let outcome = h.pipeline.ingest(hello(1)).await.unwrap();
        h.index.set_unavailable(true);

        let report = h
            .pipeline
            .delete_document(outcome.document.document_id, 1)
            .await
            .unwrap();
        assert!(!report.index_cleaned);
        assert!(h.documents.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_uploads_share_tags() {
        let h = harness(0);
        let (a, b) = futures::join!(
            h.pipeline.ingest_detached(hello(1)),
            h.pipeline.ingest_detached(hello(2))
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.state, IngestionState::Complete);
        assert_eq!(b.state, IngestionState::Complete);
        let ids_a: Vec<_> = a.tags.iter().map(|t| t.tag_id).collect();
        let ids_b: Vec<_> = b.tags.iter().map(|t| t.tag_id).collect();
        assert_eq!(ids_a, ids_b);
        // "테스트 문서" and "test 문서" are distinct; "안녕하세요" once.
        assert_eq!(h.tags.tag_count(), 3);
    }
}
