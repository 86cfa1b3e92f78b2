//! Process setup shared by the server and the admin binaries.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use searchive_core::{defaults, BlobStore, Error, Result};
use searchive_db::{FilesystemBlobStore, S3BlobStore, S3Config};

use crate::config::{AppConfig, BlobBackend};

/// Install the global subscriber.
///
/// `LOG_FORMAT` (`text` | `json`), `LOG_FILE` (daily-rotated file instead of
/// stdout), `LOG_ANSI` (override color detection) and `RUST_LOG`. The
/// returned guard must live until exit or buffered file output is lost.
pub fn init_tracing(default_filter: &str) -> Option<WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = match log_file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path.parent().unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .and_then(|f| f.to_str())
                .unwrap_or("searchive.log");
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name));

            if log_format == "json" {
                registry
                    .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                    .init();
            } else {
                registry
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(writer)
                            .with_ansi(log_ansi.unwrap_or(false)),
                    )
                    .init();
            }
            Some(guard)
        }
        None => {
            if log_format == "json" {
                registry.with(tracing_subscriber::fmt::layer().json()).init();
            } else {
                let mut layer = tracing_subscriber::fmt::layer();
                if let Some(ansi) = log_ansi {
                    layer = layer.with_ansi(ansi);
                }
                registry.with(layer).init();
            }
            None
        }
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    guard
}

/// Construct and verify the configured blob store.
pub async fn blob_store(config: &AppConfig) -> Result<Arc<dyn BlobStore>> {
    match config.blob_backend {
        BlobBackend::Filesystem => {
            let store = FilesystemBlobStore::new(&config.file_storage_path);
            store.validate().await?;
            info!(path = %config.file_storage_path, "Using filesystem blob store");
            Ok(Arc::new(store))
        }
        BlobBackend::S3 => {
            let s3 = S3Config::from_env();
            let store = S3BlobStore::connect(&s3).await?;
            store.ensure_bucket().await?;
            Ok(Arc::new(store))
        }
    }
}

/// Open a Redis connection manager whose connects and replies are bounded.
pub async fn redis_connection(url: &str) -> Result<ConnectionManager> {
    let timeout = Duration::from_secs(defaults::REDIS_RESPONSE_TIMEOUT_SECS);
    let client = redis::Client::open(url).map_err(|e| Error::Config(format!("REDIS_URL: {}", e)))?;
    let config = ConnectionManagerConfig::new()
        .set_connection_timeout(timeout)
        .set_response_timeout(timeout);
    ConnectionManager::new_with_config(client, config)
        .await
        .map_err(|e| Error::Request(format!("redis: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_redis_connection_rejects_bad_url() {
        let err = redis_connection("not-a-redis-url").await.err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_redis_connection_fails_instead_of_hanging() {
        let result = tokio::time::timeout(
            Duration::from_secs(60),
            redis_connection("redis://127.0.0.1:1"),
        )
        .await
        .expect("connection attempts must give up");
        assert!(matches!(result, Err(Error::Request(_))));
    }
}
