//! Full reindex: rebuild the search index from stored blobs.
//!
//! Texts are gathered before the index is dropped, so a run that cannot read
//! the document table fails without touching the index. Gathered texts are
//! spooled to an anonymous temp file; only their offsets stay in memory.

use std::io::SeekFrom;
use std::sync::Arc;
use std::time::Instant;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{info, warn};

use searchive_core::{
    AnalyzerProfile, BlobStore, Document, DocumentRepository, Error, IndexedDocument,
    ReindexReport, Result, SearchIndex, TextExtractor,
};

/// Position of one spooled text.
#[derive(Debug, Clone, Copy)]
struct SpoolEntry {
    offset: u64,
    len: usize,
}

/// Append-only text buffer on disk, removed when dropped.
struct TextSpool {
    file: File,
    end: u64,
}

impl TextSpool {
    fn new() -> Result<Self> {
        Ok(Self {
            file: File::from_std(tempfile::tempfile()?),
            end: 0,
        })
    }

    async fn push(&mut self, text: &str) -> Result<SpoolEntry> {
        let entry = SpoolEntry {
            offset: self.end,
            len: text.len(),
        };
        self.file.seek(SeekFrom::Start(self.end)).await?;
        self.file.write_all(text.as_bytes()).await?;
        self.end += text.len() as u64;
        Ok(entry)
    }

    async fn read(&mut self, entry: SpoolEntry) -> Result<String> {
        self.file.flush().await?;
        self.file.seek(SeekFrom::Start(entry.offset)).await?;
        let mut buf = vec![0u8; entry.len];
        self.file.read_exact(&mut buf).await?;
        String::from_utf8(buf).map_err(|e| Error::Internal(format!("spooled text: {}", e)))
    }
}

pub struct Reindexer {
    documents: Arc<dyn DocumentRepository>,
    blobs: Arc<dyn BlobStore>,
    extractor: Arc<dyn TextExtractor>,
    index: Arc<dyn SearchIndex>,
}

impl Reindexer {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        blobs: Arc<dyn BlobStore>,
        extractor: Arc<dyn TextExtractor>,
        index: Arc<dyn SearchIndex>,
    ) -> Self {
        Self {
            documents,
            blobs,
            extractor,
            index,
        }
    }

    /// Drop the index, recreate it and upsert every document with usable text.
    ///
    /// Refuses to run on the generic analyzer: rebuilding would replace a
    /// language-aware index with a lower-quality one.
    pub async fn run(&self) -> Result<ReindexReport> {
        if self.index.analyzer() != AnalyzerProfile::LanguageAware {
            return Err(Error::Config(
                "reindex requires the language-aware analyzer plugin".to_string(),
            ));
        }

        let start = Instant::now();
        let mut report = ReindexReport::default();
        let documents = self.documents.list_all().await?;
        info!(
            subsystem = "ingest",
            component = "reindex",
            result_count = documents.len(),
            "Collecting document texts"
        );

        let mut spool = TextSpool::new()?;
        let mut ready = Vec::with_capacity(documents.len());
        for document in documents {
            match self.load_text(&document).await {
                Ok(Some(text)) => {
                    let entry = spool.push(&text).await?;
                    ready.push((document, entry));
                }
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    warn!(
                        subsystem = "ingest",
                        component = "reindex",
                        document_id = document.document_id,
                        storage_key = %document.storage_path,
                        error = %e,
                        "Could not read blob"
                    );
                    report.failed += 1;
                }
            }
        }

        self.index.recreate_index().await?;

        for (document, entry) in &ready {
            let text = spool.read(*entry).await?;
            let doc = IndexedDocument::from_document(document, text);
            match self.index.upsert(&doc).await {
                Ok(()) => report.indexed += 1,
                Err(e) => {
                    warn!(
                        subsystem = "ingest",
                        component = "reindex",
                        document_id = doc.document_id,
                        error = %e,
                        "Upsert failed"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            subsystem = "ingest",
            component = "reindex",
            indexed = report.indexed,
            skipped = report.skipped,
            failed = report.failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Reindex finished"
        );
        Ok(report)
    }

    /// `None` when the document has no usable text.
    async fn load_text(&self, document: &Document) -> Result<Option<String>> {
        let bytes = self.blobs.get(&document.storage_path).await?;
        match self
            .extractor
            .extract(&bytes, &document.file_type, &document.original_filename)
            .await
        {
            Ok(text) => Ok(Some(text)),
            Err(failure) => {
                info!(
                    subsystem = "ingest",
                    component = "reindex",
                    document_id = document.document_id,
                    reason = %failure,
                    "Skipping document"
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::TextNativeAdapter;
    use crate::extraction::ExtractionRegistry;
    use crate::testing::{FakeBlobStore, FakeDocumentRepository, FakeSearchIndex};
    use searchive_core::NewDocument;

    async fn seed(
        documents: &FakeDocumentRepository,
        blobs: &FakeBlobStore,
        key: &str,
        body: &[u8],
        store_blob: bool,
    ) {
        if store_blob {
            blobs.put(key, body, "text/plain").await.unwrap();
        }
        documents
            .insert(NewDocument {
                user_id: 1,
                original_filename: format!("{key}.txt"),
                storage_path: key.to_string(),
                file_type: "text/plain".to_string(),
                file_size_kb: 0,
            })
            .await
            .unwrap();
    }

    fn extractor() -> Arc<dyn TextExtractor> {
        let mut registry = ExtractionRegistry::new();
        registry.register(Arc::new(TextNativeAdapter));
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_reindex_counts() {
        let documents = Arc::new(FakeDocumentRepository::new());
        let blobs = Arc::new(FakeBlobStore::new());
        let index = Arc::new(FakeSearchIndex::with_count(0));

        seed(&documents, &blobs, "1/a", b"a perfectly usable document body", true).await;
        seed(&documents, &blobs, "1/b", b"tiny", true).await;
        seed(&documents, &blobs, "1/c", b"", false).await;

        let reindexer = Reindexer::new(documents, blobs, extractor(), index.clone());
        let report = reindexer.run().await.unwrap();

        assert_eq!(
            report,
            ReindexReport {
                indexed: 1,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(index.recreate_count(), 1);
        assert!(index.indexed(1).is_some());
    }

    #[tokio::test]
    async fn test_reindex_refuses_generic_analyzer() {
        let index =
            Arc::new(FakeSearchIndex::with_count(0).with_analyzer(AnalyzerProfile::Generic));
        let reindexer = Reindexer::new(
            Arc::new(FakeDocumentRepository::new()),
            Arc::new(FakeBlobStore::new()),
            extractor(),
            index.clone(),
        );
        let err = reindexer.run().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(index.recreate_count(), 0);
    }

    #[tokio::test]
    async fn test_text_spool_reads_entries_in_any_order() {
        let mut spool = TextSpool::new().unwrap();
        let first = spool.push("첫 번째 문서 본문").await.unwrap();
        let second = spool.push("second body").await.unwrap();
        let empty = spool.push("").await.unwrap();

        assert_eq!(spool.read(second).await.unwrap(), "second body");
        assert_eq!(spool.read(first).await.unwrap(), "첫 번째 문서 본문");
        assert_eq!(spool.read(empty).await.unwrap(), "");

        // Appends after a read land past the existing entries.
        let third = spool.push("third").await.unwrap();
        assert_eq!(spool.read(third).await.unwrap(), "third");
        assert_eq!(spool.read(first).await.unwrap(), "첫 번째 문서 본문");
    }

    #[tokio::test]
    async fn test_reindex_upserts_full_text_of_every_document() {
        let documents = Arc::new(FakeDocumentRepository::new());
        let blobs = Arc::new(FakeBlobStore::new());
        let index = Arc::new(FakeSearchIndex::with_count(0));
        let bodies = [
            "the first document has enough text to index",
            "두 번째 문서도 색인할 만큼 충분한 본문을 가지고 있습니다",
            "a third document body that is also long enough",
        ];
        for (i, body) in bodies.iter().enumerate() {
            seed(&documents, &blobs, &format!("1/{i}"), body.as_bytes(), true).await;
        }

        let reindexer = Reindexer::new(documents, blobs, extractor(), index.clone());
        let report = reindexer.run().await.unwrap();

        assert_eq!(report.indexed, 3);
        for (i, body) in bodies.iter().enumerate() {
            let doc = index.indexed(i as i64 + 1).expect("document indexed");
            assert_eq!(doc.content, *body);
        }
    }
}
