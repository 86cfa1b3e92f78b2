//! Index settings and the analyzer capability probe.
//!
//! The language-aware profile uses the `analysis-nori` plugin: morphological
//! tokenization followed by a part-of-speech filter that drops particles,
//! endings, affixes, symbols and other function words. Without the plugin
//! the index falls back to the standard tokenizer, which leaves particles
//! attached to nouns.

use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use searchive_core::{defaults, AnalyzerProfile};

/// Name of the analyzer applied to the `content` field.
pub const CONTENT_ANALYZER: &str = "content_analyzer";

/// Part-of-speech tags removed by the language-aware analyzer.
pub const STOP_TAGS: &[&str] = &[
    // particles
    "J", "JKS", "JKC", "JKG", "JKO", "JKB", "JKV", "JKQ", "JX", "JC",
    // endings
    "E", "EP", "EF", "EC", "ETN", "ETM",
    // affixes and roots
    "XPN", "XSA", "XSN", "XSV", "XR",
    // punctuation and symbols
    "SF", "SP", "SSC", "SSO", "SC", "SE", "SO", "SW",
    // interjections, adverbs, determiners, copulas, auxiliaries, unknown
    "IC", "MAJ", "MAG", "MM", "VCP", "VCN", "VX", "UNA", "NA", "VSV",
];

/// Full index creation body (settings + mappings) for `profile`.
pub fn index_body(profile: AnalyzerProfile) -> Value {
    let analysis = match profile {
        AnalyzerProfile::LanguageAware => json!({
            "analyzer": {
                CONTENT_ANALYZER: {
                    "type": "custom",
                    "tokenizer": "nori_tokenizer",
                    "filter": ["pos_stop_filter", "lowercase"]
                }
            },
            "filter": {
                "pos_stop_filter": {
                    "type": "nori_part_of_speech",
                    "stoptags": STOP_TAGS
                }
            }
        }),
        AnalyzerProfile::Generic => json!({
            "analyzer": {
                CONTENT_ANALYZER: {
                    "type": "custom",
                    "tokenizer": "standard",
                    "filter": ["lowercase"]
                }
            }
        }),
    };

    json!({
        "settings": {
            "analysis": analysis,
            "number_of_shards": 1,
            "number_of_replicas": 0
        },
        "mappings": {
            "properties": {
                "document_id": { "type": "long" },
                "user_id": { "type": "long" },
                "content": {
                    "type": "text",
                    "analyzer": CONTENT_ANALYZER,
                    "fielddata": true
                },
                "filename": { "type": "keyword" },
                "file_type": { "type": "keyword" },
                "uploaded_at": { "type": "date" }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodesInfo {
    #[serde(default)]
    nodes: HashMap<String, NodeInfo>,
}

#[derive(Debug, Deserialize)]
struct NodeInfo {
    #[serde(default)]
    plugins: Vec<PluginInfo>,
}

#[derive(Debug, Deserialize)]
struct PluginInfo {
    name: String,
}

impl NodesInfo {
    /// Profile supported by the cluster described by this `_nodes/plugins` response.
    pub(crate) fn analyzer_profile(&self) -> AnalyzerProfile {
        let has_plugin = self.nodes.values().any(|node| {
            node.plugins
                .iter()
                .any(|p| p.name == defaults::LANGUAGE_ANALYZER_PLUGIN)
        });
        if has_plugin {
            AnalyzerProfile::LanguageAware
        } else {
            AnalyzerProfile::Generic
        }
    }
}
