//! Elasticsearch implementation of [`SearchIndex`] over its REST API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

use searchive_core::{
    defaults, AnalyzerProfile, Error, IndexedDocument, Result, SearchIndex, TermStatistic,
    TermVector,
};

use crate::analyzer::{index_body, NodesInfo};

/// Connection settings for the Elasticsearch adapter.
#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    pub url: String,
    pub index: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: defaults::ELASTICSEARCH_URL.to_string(),
            index: defaults::INDEX_NAME.to_string(),
            username: None,
            password: None,
            timeout: Duration::from_secs(defaults::SEARCH_TIMEOUT_SECS),
        }
    }
}

impl ElasticsearchConfig {
    /// Read `ELASTICSEARCH_URL`, `ELASTICSEARCH_INDEX`, `ELASTICSEARCH_USER`,
    /// `ELASTICSEARCH_PASSWORD` and `ELASTICSEARCH_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        let defaults = Self::default();
        Self {
            url: non_empty("ELASTICSEARCH_URL").unwrap_or(defaults.url),
            index: non_empty("ELASTICSEARCH_INDEX").unwrap_or(defaults.index),
            username: non_empty("ELASTICSEARCH_USER"),
            password: non_empty("ELASTICSEARCH_PASSWORD"),
            timeout: non_empty("ELASTICSEARCH_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

/// Elasticsearch-backed search index.
///
/// The analyzer profile is fixed at construction; use [`ElasticsearchIndex::connect`]
/// to probe the cluster once at startup.
pub struct ElasticsearchIndex {
    client: Client,
    config: ElasticsearchConfig,
    analyzer: AnalyzerProfile,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct TermVectorsResponse {
    #[serde(default)]
    found: bool,
    #[serde(default)]
    term_vectors: BTreeMap<String, FieldTermVector>,
}

#[derive(Debug, Deserialize)]
struct FieldTermVector {
    #[serde(default)]
    field_statistics: Option<FieldStatistics>,
    #[serde(default)]
    terms: BTreeMap<String, TermInfo>,
}

#[derive(Debug, Deserialize)]
struct FieldStatistics {
    doc_count: u64,
}

#[derive(Debug, Deserialize)]
struct TermInfo {
    #[serde(default = "one")]
    term_freq: u64,
    #[serde(default = "one")]
    doc_freq: u64,
}

fn one() -> u64 {
    1
}

#[derive(Debug, Deserialize)]
struct SignificantTextResponse {
    aggregations: SignificantAggs,
}

#[derive(Debug, Deserialize)]
struct SignificantAggs {
    keywords: SignificantBuckets,
}

#[derive(Debug, Deserialize)]
struct SignificantBuckets {
    #[serde(default)]
    buckets: Vec<SignificantBucket>,
}

#[derive(Debug, Deserialize)]
struct SignificantBucket {
    key: String,
}

impl ElasticsearchIndex {
    /// Create an adapter with an already-decided analyzer profile.
    pub fn new(config: ElasticsearchConfig, analyzer: AnalyzerProfile) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            analyzer,
        })
    }

    /// Create an adapter, probing the cluster for the language-aware analyzer.
    pub async fn connect(config: ElasticsearchConfig) -> Result<Self> {
        let mut index = Self::new(config, AnalyzerProfile::Generic)?;
        index.analyzer = index.probe_analyzer().await;
        Ok(index)
    }

    /// Index name this adapter writes to.
    pub fn index_name(&self) -> &str {
        &self.config.index
    }

    /// Ask the cluster which analyzer profile it supports.
    ///
    /// A failed probe is treated as "plugin absent".
    pub async fn probe_analyzer(&self) -> AnalyzerProfile {
        let result = async {
            let resp = self.send(self.request(reqwest::Method::GET, "_nodes/plugins")).await?;
            let resp = Self::check(resp, "probe").await?;
            resp.json::<NodesInfo>()
                .await
                .map_err(|e| Error::Search(format!("probe: invalid response: {e}")))
        }
        .await;

        match result {
            Ok(info) => {
                let profile = info.analyzer_profile();
                match profile {
                    AnalyzerProfile::LanguageAware => info!(
                        subsystem = "search",
                        component = "elasticsearch",
                        op = "probe",
                        plugin = defaults::LANGUAGE_ANALYZER_PLUGIN,
                        "Language-aware analyzer available"
                    ),
                    AnalyzerProfile::Generic => warn!(
                        subsystem = "search",
                        component = "elasticsearch",
                        op = "probe",
                        plugin = defaults::LANGUAGE_ANALYZER_PLUGIN,
                        "Analyzer plugin not installed; using generic tokenizer. \
                         Keywords will keep grammatical particles"
                    ),
                }
                profile
            }
            Err(e) => {
                warn!(
                    subsystem = "search",
                    component = "elasticsearch",
                    op = "probe",
                    error = %e,
                    "Analyzer probe failed; using generic tokenizer"
                );
                AnalyzerProfile::Generic
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.config.username {
            Some(user) => builder.basic_auth(user, self.config.password.as_deref()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        builder
            .send()
            .await
            .map_err(|e| Error::Search(format!("Request failed: {e}")))
    }

    /// Turn a non-success status into `Error::Search` carrying the body.
    async fn check(resp: Response, op: &str) -> Result<Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(Error::Search(format!("{op}: Elasticsearch returned {status}: {body}")))
    }

    async fn index_exists(&self) -> Result<bool> {
        let resp = self
            .send(self.request(reqwest::Method::HEAD, &self.config.index))
            .await?;
        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(Error::Search(format!("index exists check returned {s}"))),
        }
    }

    async fn create_index(&self) -> Result<()> {
        let resp = self
            .send(
                self.request(reqwest::Method::PUT, &self.config.index)
                    .json(&index_body(self.analyzer)),
            )
            .await?;

        if resp.status() == StatusCode::BAD_REQUEST {
            let body = resp.text().await.unwrap_or_default();
            if body.contains("resource_already_exists_exception") {
                return Ok(());
            }
            return Err(Error::Search(format!("create index: {body}")));
        }
        Self::check(resp, "create index").await?;

        info!(
            subsystem = "search",
            component = "elasticsearch",
            op = "create_index",
            index = %self.config.index,
            analyzer = self.analyzer.as_str(),
            "Created search index"
        );
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    fn analyzer(&self) -> AnalyzerProfile {
        self.analyzer
    }

    async fn ensure_index(&self) -> Result<()> {
        if self.index_exists().await? {
            debug!(
                subsystem = "search",
                component = "elasticsearch",
                index = %self.config.index,
                "Search index already exists"
            );
            return Ok(());
        }
        self.create_index().await
    }

    async fn recreate_index(&self) -> Result<()> {
        let resp = self
            .send(self.request(reqwest::Method::DELETE, &self.config.index))
            .await?;
        if resp.status() != StatusCode::NOT_FOUND {
            Self::check(resp, "delete index").await?;
        }
        warn!(
            subsystem = "search",
            component = "elasticsearch",
            op = "recreate_index",
            index = %self.config.index,
            "Dropped search index"
        );
        self.create_index().await
    }

    #[instrument(skip(self, doc), fields(subsystem = "search", component = "elasticsearch", op = "upsert", document_id = doc.document_id))]
    async fn upsert(&self, doc: &IndexedDocument) -> Result<()> {
        let start = Instant::now();
        let path = format!(
            "{}/_doc/{}?refresh=wait_for",
            self.config.index, doc.document_id
        );
        let resp = self
            .send(self.request(reqwest::Method::PUT, &path).json(doc))
            .await?;
        Self::check(resp, "upsert").await?;

        debug!(
            content_len = doc.content.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Document indexed"
        );
        Ok(())
    }

    async fn delete(&self, document_id: i64) -> Result<bool> {
        let path = format!("{}/_doc/{}?refresh=wait_for", self.config.index, document_id);
        let resp = self
            .send(self.request(reqwest::Method::DELETE, &path))
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        let body: DeleteResponse = Self::check(resp, "delete")
            .await?
            .json()
            .await
            .map_err(|e| Error::Search(format!("delete: invalid response: {e}")))?;
        Ok(body.result == "deleted")
    }

    async fn count(&self) -> Result<u64> {
        let path = format!("{}/_count", self.config.index);
        let resp = self.send(self.request(reqwest::Method::GET, &path)).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(0);
        }
        let body: CountResponse = Self::check(resp, "count")
            .await?
            .json()
            .await
            .map_err(|e| Error::Search(format!("count: invalid response: {e}")))?;
        Ok(body.count)
    }

    #[instrument(skip(self), fields(subsystem = "search", component = "elasticsearch", op = "term_statistics"))]
    async fn term_statistics(&self, document_id: i64, field: &str) -> Result<TermVector> {
        let path = format!("{}/_termvectors/{}", self.config.index, document_id);
        let request = json!({
            "fields": [field],
            "term_statistics": true,
            "field_statistics": true,
            "positions": false,
            "offsets": false
        });
        let resp = self
            .send(self.request(reqwest::Method::POST, &path).json(&request))
            .await?;
        let mut body: TermVectorsResponse = Self::check(resp, "term_statistics")
            .await?
            .json()
            .await
            .map_err(|e| Error::Search(format!("term_statistics: invalid response: {e}")))?;

        if !body.found {
            return Err(Error::NotFound(format!("indexed document {document_id}")));
        }
        let Some(field_vector) = body.term_vectors.remove(field) else {
            warn!(document_id, field, "No term vector for field");
            return Ok(TermVector::default());
        };

        let doc_count = field_vector
            .field_statistics
            .map(|s| s.doc_count)
            .unwrap_or(1);
        let terms: Vec<TermStatistic> = field_vector
            .terms
            .into_iter()
            .map(|(term, info)| TermStatistic {
                term,
                term_freq: info.term_freq,
                doc_freq: info.doc_freq,
            })
            .collect();

        debug!(result_count = terms.len(), doc_count, "Term statistics fetched");
        Ok(TermVector { doc_count, terms })
    }

    #[instrument(skip(self), fields(subsystem = "search", component = "elasticsearch", op = "significant_terms"))]
    async fn significant_terms(&self, document_id: i64, size: usize) -> Result<Vec<String>> {
        let path = format!("{}/_search", self.config.index);
        let request = json!({
            "size": 0,
            "query": { "ids": { "values": [document_id.to_string()] } },
            "aggs": {
                "keywords": {
                    "significant_text": {
                        "field": "content",
                        "size": size,
                        "min_doc_count": 1,
                        "filter_duplicate_text": true
                    }
                }
            }
        });
        let resp = self
            .send(self.request(reqwest::Method::POST, &path).json(&request))
            .await?;
        let body: SignificantTextResponse = Self::check(resp, "significant_terms")
            .await?
            .json()
            .await
            .map_err(|e| Error::Search(format!("significant_terms: invalid response: {e}")))?;

        let terms: Vec<String> = body
            .aggregations
            .keywords
            .buckets
            .into_iter()
            .map(|b| b.key)
            .collect();
        debug!(result_count = terms.len(), "Significant terms fetched");
        Ok(terms)
    }
}
