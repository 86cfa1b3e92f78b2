//! S3-compatible blob store (AWS S3 or MinIO).

use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_s3::{config::Region, error::DisplayErrorContext, primitives::ByteStream, Client};
use tracing::{debug, info, instrument};

use searchive_core::{defaults, BlobStore, Error, Result};

/// Connection settings for the S3 store.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    /// Custom endpoint, e.g. `http://minio:9000`. Enables path-style addressing.
    pub endpoint: Option<String>,
    pub region: String,
    /// Bound on each operation, retries included.
    pub operation_timeout: Duration,
}

impl S3Config {
    /// Read `S3_BUCKET`, `S3_ENDPOINT`, `S3_REGION` and `S3_OPERATION_TIMEOUT_SECS`.
    ///
    /// Credentials come from the standard AWS environment chain.
    pub fn from_env() -> Self {
        Self {
            bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| defaults::S3_BUCKET.to_string()),
            endpoint: std::env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            operation_timeout: Duration::from_secs(
                std::env::var("S3_OPERATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(defaults::S3_OPERATION_TIMEOUT_SECS),
            ),
        }
    }

    fn timeout_config(&self) -> TimeoutConfig {
        TimeoutConfig::builder()
            .operation_timeout(self.operation_timeout)
            .build()
    }
}

/// Blob store backed by one S3 bucket.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the environment and `config`.
    pub async fn connect(config: &S3Config) -> Result<Self> {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .timeout_config(config.timeout_config())
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let store = Self::new(Client::from_conf(builder.build()), config.bucket.clone());

        info!(
            subsystem = "db",
            component = "blob_s3",
            bucket = %store.bucket,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            operation_timeout_secs = config.operation_timeout.as_secs(),
            "S3 blob store configured"
        );
        Ok(store)
    }

    /// Create the bucket if it does not exist.
    pub async fn ensure_bucket(&self) -> Result<()> {
        if self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
        {
            return Ok(());
        }
        self.client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("create bucket: {}", DisplayErrorContext(&e))))?;
        info!(subsystem = "db", component = "blob_s3", bucket = %self.bucket, "Created bucket");
        Ok(())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    #[instrument(skip(self, bytes), fields(subsystem = "db", component = "blob_s3", op = "put"))]
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(bytes.len() as i64)
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await
            .map_err(|e| Error::Storage(format!("put {key}: {}", DisplayErrorContext(&e))))?;
        debug!(storage_key = key, size = bytes.len(), "Blob uploaded");
        Ok(())
    }

    #[instrument(skip(self), fields(subsystem = "db", component = "blob_s3", op = "get"))]
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    Error::NotFound(format!("blob '{key}'"))
                } else {
                    Error::Storage(format!("get {key}: {}", DisplayErrorContext(&e)))
                }
            })?;
        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| Error::Storage(format!("read body {key}: {e}")))?;
        Ok(body.into_bytes().to_vec())
    }

    #[instrument(skip(self), fields(subsystem = "db", component = "blob_s3", op = "delete"))]
    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("delete {key}: {}", DisplayErrorContext(&e))))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(Error::Storage(format!(
                "head {key}: {}",
                DisplayErrorContext(&e)
            ))),
        }
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_config_bounds_operations() {
        let config = S3Config {
            bucket: "documents".to_string(),
            endpoint: None,
            region: "us-east-1".to_string(),
            operation_timeout: Duration::from_secs(7),
        };
        assert_eq!(
            config.timeout_config().operation_timeout(),
            Some(Duration::from_secs(7))
        );
    }

    #[test]
    fn test_from_env_has_operation_timeout() {
        let config = S3Config::from_env();
        assert!(config.operation_timeout > Duration::ZERO);
    }
}
