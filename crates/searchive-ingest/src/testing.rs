//! In-memory fakes of every trait seam the pipeline depends on.
//!
//! Each fake records enough state to assert on, and exposes switches to make
//! individual operations fail.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use searchive_core::{
    normalize_keyword, AnalyzerProfile, BlobStore, Document, DocumentRepository, Error,
    ExtractionFailure, IndexedDocument, KeyphraseRanker, NewDocument, Result, SearchIndex, Tag,
    TagCatalog, TermVector, TextExtractor,
};

// =============================================================================
// BLOB STORE
// =============================================================================

#[derive(Default)]
pub struct FakeBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_put: AtomicBool,
    fail_delete: AtomicBool,
}

impl FakeBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<()> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(Error::Storage("blob store unreachable".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("blob {key}")))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Error::Storage("blob store unreachable".to_string()));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.contains(key))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

// =============================================================================
// DOCUMENT REPOSITORY
// =============================================================================

#[derive(Default)]
pub struct FakeDocumentRepository {
    rows: Mutex<Vec<Document>>,
    next_id: AtomicI64,
    fail_insert: AtomicBool,
    fail_delete: AtomicBool,
}

impl FakeDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_insert(&self, fail: bool) {
        self.fail_insert.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, document_id: i64) -> Option<Document> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.document_id == document_id)
            .cloned()
    }
}

#[async_trait]
impl DocumentRepository for FakeDocumentRepository {
    async fn insert(&self, doc: NewDocument) -> Result<Document> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(Error::Internal("database unavailable".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|d| d.storage_path == doc.storage_path) {
            return Err(Error::Conflict(format!(
                "storage path {} already used",
                doc.storage_path
            )));
        }
        let now = Utc::now();
        let document = Document {
            document_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id: doc.user_id,
            original_filename: doc.original_filename,
            storage_path: doc.storage_path,
            file_type: doc.file_type,
            file_size_kb: doc.file_size_kb,
            uploaded_at: now,
            updated_at: now,
        };
        rows.push(document.clone());
        Ok(document)
    }

    async fn find_for_owner(&self, document_id: i64, user_id: i64) -> Result<Option<Document>> {
        Ok(self
            .get(document_id)
            .filter(|d| d.user_id == user_id))
    }

    async fn list_for_owner(&self, user_id: i64) -> Result<Vec<Document>> {
        let mut docs: Vec<Document> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.document_id.cmp(&a.document_id));
        Ok(docs)
    }

    async fn list_all(&self) -> Result<Vec<Document>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn delete(&self, document_id: i64) -> Result<bool> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Error::Internal("database unavailable".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|d| d.document_id != document_id);
        Ok(rows.len() != before)
    }
}

// =============================================================================
// TAG CATALOG
// =============================================================================

#[derive(Default)]
pub struct FakeTagCatalog {
    tags: Mutex<Vec<Tag>>,
    links: Mutex<Vec<(i64, i64)>>,
    fail: AtomicBool,
}

impl FakeTagCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn tag_count(&self) -> usize {
        self.tags.lock().unwrap().len()
    }

    /// Drop links of a deleted document, as the relational cascade would.
    pub fn cascade_document(&self, document_id: i64) {
        self.links
            .lock()
            .unwrap()
            .retain(|(doc, _)| *doc != document_id);
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Internal("tag store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TagCatalog for FakeTagCatalog {
    async fn bulk_get_or_create(&self, names: &[String]) -> Result<Vec<Tag>> {
        self.check()?;
        let mut tags = self.tags.lock().unwrap();
        let mut out: Vec<Tag> = Vec::new();
        for name in names.iter().filter_map(|n| normalize_keyword(n)) {
            if out.iter().any(|t| t.name == name) {
                continue;
            }
            let tag = match tags.iter().find(|t| t.name == name) {
                Some(t) => t.clone(),
                None => {
                    let tag = Tag {
                        tag_id: tags.len() as i64 + 1,
                        name,
                        created_at: Utc::now(),
                    };
                    tags.push(tag.clone());
                    tag
                }
            };
            out.push(tag);
        }
        Ok(out)
    }

    async fn attach_tags_to_document(
        &self,
        document_id: i64,
        names: &[String],
    ) -> Result<Vec<Tag>> {
        let tags = self.bulk_get_or_create(names).await?;
        let mut links = self.links.lock().unwrap();
        for tag in &tags {
            if !links.contains(&(document_id, tag.tag_id)) {
                links.push((document_id, tag.tag_id));
            }
        }
        Ok(tags)
    }

    async fn get_tags_by_document_id(&self, document_id: i64) -> Result<Vec<Tag>> {
        self.check()?;
        let links = self.links.lock().unwrap();
        let tags = self.tags.lock().unwrap();
        let mut out: Vec<Tag> = tags
            .iter()
            .filter(|t| links.contains(&(document_id, t.tag_id)))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        self.check()?;
        let Some(name) = normalize_keyword(name) else {
            return Ok(None);
        };
        Ok(self
            .tags
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.name == name)
            .cloned())
    }
}

// =============================================================================
// SEARCH INDEX
// =============================================================================

/// Index fake. `count()` returns the configured count, not the number of
/// upserted documents, so tests can place the corpus on either side of the
/// threshold independently of what they upload.
pub struct FakeSearchIndex {
    count: AtomicU64,
    analyzer: AnalyzerProfile,
    documents: Mutex<HashMap<i64, IndexedDocument>>,
    term_vectors: Mutex<HashMap<i64, TermVector>>,
    significant: Mutex<HashMap<i64, Vec<String>>>,
    last_significant_size: Mutex<Option<usize>>,
    unavailable: AtomicBool,
    fail_upsert: AtomicBool,
    recreated: AtomicUsize,
}

impl FakeSearchIndex {
    pub fn with_count(count: u64) -> Self {
        Self {
            count: AtomicU64::new(count),
            analyzer: AnalyzerProfile::LanguageAware,
            documents: Mutex::new(HashMap::new()),
            term_vectors: Mutex::new(HashMap::new()),
            significant: Mutex::new(HashMap::new()),
            last_significant_size: Mutex::new(None),
            unavailable: AtomicBool::new(false),
            fail_upsert: AtomicBool::new(false),
            recreated: AtomicUsize::new(0),
        }
    }

    pub fn with_analyzer(mut self, analyzer: AnalyzerProfile) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn set_count(&self, count: u64) {
        self.count.store(count, Ordering::SeqCst);
    }

    /// Make every operation fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_fail_upsert(&self, fail: bool) {
        self.fail_upsert.store(fail, Ordering::SeqCst);
    }

    pub fn set_term_vector(&self, document_id: i64, vector: TermVector) {
        self.term_vectors
            .lock()
            .unwrap()
            .insert(document_id, vector);
    }

    pub fn set_significant_terms(&self, document_id: i64, terms: Vec<String>) {
        self.significant.lock().unwrap().insert(document_id, terms);
    }

    pub fn last_significant_size(&self) -> Option<usize> {
        *self.last_significant_size.lock().unwrap()
    }

    pub fn indexed(&self, document_id: i64) -> Option<IndexedDocument> {
        self.documents.lock().unwrap().get(&document_id).cloned()
    }

    pub fn recreate_count(&self) -> usize {
        self.recreated.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::Search("index unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for FakeSearchIndex {
    fn analyzer(&self) -> AnalyzerProfile {
        self.analyzer
    }

    async fn ensure_index(&self) -> Result<()> {
        self.check()
    }

    async fn recreate_index(&self) -> Result<()> {
        self.check()?;
        self.documents.lock().unwrap().clear();
        self.recreated.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert(&self, doc: &IndexedDocument) -> Result<()> {
        self.check()?;
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(Error::Search("index rejected document".to_string()));
        }
        self.documents
            .lock()
            .unwrap()
            .insert(doc.document_id, doc.clone());
        Ok(())
    }

    async fn delete(&self, document_id: i64) -> Result<bool> {
        self.check()?;
        Ok(self.documents.lock().unwrap().remove(&document_id).is_some())
    }

    async fn count(&self) -> Result<u64> {
        self.check()?;
        Ok(self.count.load(Ordering::SeqCst))
    }

    async fn term_statistics(&self, document_id: i64, _field: &str) -> Result<TermVector> {
        self.check()?;
        self.term_vectors
            .lock()
            .unwrap()
            .get(&document_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("indexed document {document_id}")))
    }

    async fn significant_terms(&self, document_id: i64, size: usize) -> Result<Vec<String>> {
        self.check()?;
        *self.last_significant_size.lock().unwrap() = Some(size);
        let terms = self
            .significant
            .lock()
            .unwrap()
            .get(&document_id)
            .cloned()
            .unwrap_or_default();
        Ok(terms.into_iter().take(size).collect())
    }
}

// =============================================================================
// RANKER AND EXTRACTOR
// =============================================================================

pub struct FakeRanker {
    phrases: Vec<String>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeRanker {
    pub fn returning(phrases: &[&str]) -> Self {
        Self {
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            phrases: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyphraseRanker for FakeRanker {
    async fn rank(&self, _text: &str, _top_n: usize) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Embedding("model not loaded".to_string()));
        }
        Ok(self.phrases.clone())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Extractor returning a fixed outcome for every input.
pub struct FakeTextExtractor {
    outcome: std::result::Result<String, ExtractionFailure>,
}

impl FakeTextExtractor {
    pub fn returning(text: &str) -> Self {
        Self {
            outcome: Ok(text.to_string()),
        }
    }

    pub fn failing(failure: ExtractionFailure) -> Self {
        Self {
            outcome: Err(failure),
        }
    }
}

#[async_trait]
impl TextExtractor for FakeTextExtractor {
    async fn extract(
        &self,
        _data: &[u8],
        _mime_type: &str,
        _filename: &str,
    ) -> std::result::Result<String, ExtractionFailure> {
        self.outcome.clone()
    }
}
