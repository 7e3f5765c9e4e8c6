use std::sync::Arc;

use carelog_blob::{BlobStore, MemoryBlobStore, S3BlobConfig, S3BlobStore};

use crate::config::BlobConfig;
use crate::error::ServerError;

/// Construct a [`BlobStore`] from configuration.
pub async fn create_blob_store(config: &BlobConfig) -> Result<Arc<dyn BlobStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryBlobStore::new())),
        "s3" => create_s3(config).await,
        other => Err(ServerError::Config(format!(
            "unsupported blob backend: {other}"
        ))),
    }
}

async fn create_s3(config: &BlobConfig) -> Result<Arc<dyn BlobStore>, ServerError> {
    let bucket = config
        .bucket
        .as_deref()
        .ok_or_else(|| ServerError::Config("blob.bucket is required for the s3 backend".to_owned()))?;
    let region = config.region.as_deref().unwrap_or("us-east-1");

    let mut s3_config = S3BlobConfig::new(region, bucket);
    if let Some(endpoint) = &config.endpoint_url {
        s3_config = s3_config.with_endpoint_url(endpoint);
    }
    if let Some(public_url) = &config.public_url {
        s3_config = s3_config.with_public_url(public_url);
    }

    Ok(Arc::new(S3BlobStore::new(&s3_config).await))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_builds() {
        let config = BlobConfig::default();
        create_blob_store(&config).await.unwrap();
    }

    #[tokio::test]
    async fn s3_backend_requires_a_bucket() {
        let config = BlobConfig {
            backend: "s3".to_owned(),
            ..BlobConfig::default()
        };
        let err = create_blob_store(&config).await.unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[tokio::test]
    async fn unknown_backend_is_a_config_error() {
        let config = BlobConfig {
            backend: "gcs".to_owned(),
            ..BlobConfig::default()
        };
        let err = create_blob_store(&config).await.unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }
}
