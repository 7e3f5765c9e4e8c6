use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{debug, error};

use crate::error::BlobError;
use crate::store::{BlobStore, StoredBlob};

/// Configuration for the S3 blob store backend.
#[derive(Debug, Clone)]
pub struct S3BlobConfig {
    /// AWS region (e.g. `"us-east-1"`).
    pub region: String,

    /// Bucket holding the uploaded payloads.
    pub bucket: String,

    /// Optional endpoint URL override for local development
    /// (e.g. `LocalStack`/`MinIO`).
    pub endpoint_url: Option<String>,

    /// Optional base URL for returned locators, e.g. a CDN in front of the
    /// bucket. Defaults to the virtual-hosted-style bucket URL.
    pub public_url: Option<String>,
}

impl S3BlobConfig {
    /// Create a new `S3BlobConfig` for the given region and bucket.
    pub fn new(region: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            bucket: bucket.into(),
            endpoint_url: None,
            public_url: None,
        }
    }

    /// Set the endpoint URL override for local development.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Set the base URL used when composing object locators.
    #[must_use]
    pub fn with_public_url(mut self, public_url: impl Into<String>) -> Self {
        self.public_url = Some(public_url.into());
        self
    }
}

/// S3-backed implementation of [`BlobStore`].
///
/// `PutObject` returns no locator, so object URLs are composed from the
/// configured public base (falling back to the virtual-hosted-style bucket
/// URL).
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    public_base: String,
}

impl S3BlobStore {
    /// Create a new `S3BlobStore` from the provided configuration.
    ///
    /// Loads AWS credentials and configuration from the environment and
    /// optionally overrides the endpoint URL for local development.
    pub async fn new(config: &S3BlobConfig) -> Self {
        let mut aws_config =
            aws_config::from_env().region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            aws_config = aws_config.endpoint_url(endpoint);
        }

        let sdk_config = aws_config.load().await;
        Self::with_client(Client::new(&sdk_config), config)
    }

    /// Create a new `S3BlobStore` from an existing S3 client.
    pub fn with_client(client: Client, config: &S3BlobConfig) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            public_base: public_base_for(config),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base)
    }
}

/// Base URL objects are served from: the configured public URL when set,
/// otherwise the virtual-hosted-style bucket URL.
fn public_base_for(config: &S3BlobConfig) -> String {
    config
        .public_url
        .clone()
        .unwrap_or_else(|| {
            format!(
                "https://{}.s3.{}.amazonaws.com",
                config.bucket, config.region
            )
        })
        .trim_end_matches('/')
        .to_owned()
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<String, BlobError> {
        debug!(bucket = %self.bucket, key = %key, size = data.len(), "uploading object");

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request.send().await.map_err(|e| {
            let err_str = e.to_string();
            error!(bucket = %self.bucket, key = %key, error = %err_str, "put_object failed");
            BlobError::Storage(err_str)
        })?;

        Ok(self.object_url(key))
    }

    async fn get(&self, key: &str) -> Result<StoredBlob, BlobError> {
        debug!(bucket = %self.bucket, key = %key, "downloading object");

        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    return Err(BlobError::NotFound(key.to_owned()));
                }
                error!(bucket = %self.bucket, key = %key, error = %service_err, "get_object failed");
                return Err(BlobError::Storage(service_err.to_string()));
            }
        };

        let content_type = output
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_owned();

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| BlobError::Storage(format!("failed to read object body: {e}")))?
            .into_bytes();

        Ok(StoredBlob { data, content_type })
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        debug!(bucket = %self.bucket, key = %key, "deleting object");

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                error!(bucket = %self.bucket, key = %key, error = %err_str, "delete_object failed");
                BlobError::Storage(err_str)
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_new_sets_region_and_bucket() {
        let config = S3BlobConfig::new("eu-west-2", "patient-uploads");
        assert_eq!(config.region, "eu-west-2");
        assert_eq!(config.bucket, "patient-uploads");
        assert!(config.endpoint_url.is_none());
        assert!(config.public_url.is_none());
    }

    #[test]
    fn config_builder_chain() {
        let config = S3BlobConfig::new("us-east-1", "uploads")
            .with_endpoint_url("http://localhost:4566")
            .with_public_url("https://media.example.com/");
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(
            config.public_url.as_deref(),
            Some("https://media.example.com/")
        );
    }

    #[test]
    fn default_public_base_is_virtual_hosted() {
        let config = S3BlobConfig::new("eu-west-2", "patient-uploads");
        assert_eq!(
            public_base_for(&config),
            "https://patient-uploads.s3.eu-west-2.amazonaws.com"
        );
    }

    #[test]
    fn public_url_override_is_trimmed() {
        let config =
            S3BlobConfig::new("eu-west-2", "uploads").with_public_url("https://media.example.com/");
        assert_eq!(public_base_for(&config), "https://media.example.com");
    }
}
