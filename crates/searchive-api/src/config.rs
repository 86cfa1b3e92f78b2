//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `postgres://localhost/searchive` |
//! | `DB_MAX_CONNECTIONS`, `DB_ACQUIRE_TIMEOUT_SECS`, `DB_STATEMENT_TIMEOUT_SECS` | see `searchive-db` |
//! | `HOST` / `PORT` | `0.0.0.0` / `8000` |
//! | `ELASTICSEARCH_URL`, `ELASTICSEARCH_USER`, `ELASTICSEARCH_PASSWORD`, `ELASTICSEARCH_INDEX` | see `searchive-search` |
//! | `KEYWORD_EXTRACTION_THRESHOLD` | `5` |
//! | `KEYWORD_EXTRACTION_COUNT` | `5` |
//! | `KEYWORD_SIGNIFICANCE_MODE` | `term-vectors` |
//! | `OLLAMA_BASE`, `OLLAMA_EMBED_MODEL` | see `searchive-inference` |
//! | `RANKER_ENABLED` | `true` |
//! | `BLOB_BACKEND` | `s3` |
//! | `S3_BUCKET`, `S3_ENDPOINT`, `S3_REGION`, `S3_OPERATION_TIMEOUT_SECS` | see `searchive-db` |
//! | `FILE_STORAGE_PATH` | `/var/lib/searchive/blobs` |
//! | `REDIS_URL` | `redis://localhost:6379` |
//! | `ALLOWED_ORIGINS` | `http://localhost:3000` |
//! | `MAX_UPLOAD_BYTES` | 50 MiB |

use std::str::FromStr;

use axum::http::HeaderValue;
use tracing::warn;

use searchive_core::{defaults, Error, Result, SignificanceMode};
use searchive_ingest::OrchestratorConfig;
use searchive_search::TermLengthBounds;

/// Which blob store backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobBackend {
    S3,
    Filesystem,
}

impl FromStr for BlobBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "s3" | "minio" => Ok(BlobBackend::S3),
            "filesystem" | "fs" => Ok(BlobBackend::Filesystem),
            other => Err(Error::Config(format!("unknown BLOB_BACKEND '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub keyword_threshold: u64,
    pub keyword_count: usize,
    pub significance_mode: SignificanceMode,
    pub ranker_enabled: bool,
    pub blob_backend: BlobBackend,
    pub file_storage_path: String,
    pub redis_url: String,
    pub allowed_origins: Vec<HeaderValue>,
    pub max_upload_bytes: usize,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Parse `name`, falling back to `default` with a warning on bad input.
fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(variable = name, value = %raw, "Invalid value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

/// Comma-separated origins; invalid entries are skipped with a warning.
pub fn parse_allowed_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

impl AppConfig {
    /// Read configuration. Only malformed enumerations are errors; numeric
    /// values fall back to defaults.
    pub fn from_env() -> Result<Self> {
        let significance_mode = match std::env::var("KEYWORD_SIGNIFICANCE_MODE") {
            Ok(raw) => raw.parse()?,
            Err(_) => SignificanceMode::default(),
        };
        let blob_backend = env_or("BLOB_BACKEND", "s3").parse()?;

        Ok(Self {
            database_url: env_or("DATABASE_URL", "postgres://localhost/searchive"),
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse("PORT", defaults::SERVER_PORT),
            keyword_threshold: env_parse("KEYWORD_EXTRACTION_THRESHOLD", defaults::KEYWORD_THRESHOLD),
            keyword_count: env_parse("KEYWORD_EXTRACTION_COUNT", defaults::KEYWORD_COUNT),
            significance_mode,
            ranker_enabled: env_flag("RANKER_ENABLED", true),
            blob_backend,
            file_storage_path: env_or("FILE_STORAGE_PATH", defaults::FILE_STORAGE_PATH),
            redis_url: env_or("REDIS_URL", "redis://localhost:6379"),
            allowed_origins: parse_allowed_origins(&env_or(
                "ALLOWED_ORIGINS",
                "http://localhost:3000",
            )),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", defaults::MAX_UPLOAD_BYTES),
        })
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            threshold: self.keyword_threshold,
            keyword_count: self.keyword_count,
            significance_mode: self.significance_mode,
            term_bounds: TermLengthBounds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_backend_parse() {
        assert_eq!("S3".parse::<BlobBackend>().unwrap(), BlobBackend::S3);
        assert_eq!(
            "filesystem".parse::<BlobBackend>().unwrap(),
            BlobBackend::Filesystem
        );
        assert!("ftp".parse::<BlobBackend>().is_err());
    }

    #[test]
    fn test_parse_allowed_origins_skips_blanks() {
        let origins = parse_allowed_origins("http://a.test, ,http://b.test,");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "http://a.test");
    }

    #[test]
    fn test_orchestrator_config_carries_values() {
        let config = AppConfig {
            database_url: String::new(),
            host: "127.0.0.1".into(),
            port: 8000,
            keyword_threshold: 9,
            keyword_count: 3,
            significance_mode: SignificanceMode::Aggregation,
            ranker_enabled: false,
            blob_backend: BlobBackend::Filesystem,
            file_storage_path: "/tmp".into(),
            redis_url: String::new(),
            allowed_origins: Vec::new(),
            max_upload_bytes: 1024,
        };
        let orch = config.orchestrator();
        assert_eq!(orch.threshold, 9);
        assert_eq!(orch.keyword_count, 3);
        assert_eq!(orch.significance_mode, SignificanceMode::Aggregation);
    }
}
