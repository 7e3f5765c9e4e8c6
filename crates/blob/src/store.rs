use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BlobError;

/// A retrieved blob: the exact bytes plus the content type recorded at put
/// time (or the generic fallback when none was).
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// The raw binary content.
    pub data: Bytes,
    /// MIME type, `application/octet-stream` when none was recorded.
    pub content_type: String,
}

/// Pluggable blob storage backend for uploaded payloads.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
#[async_trait]
pub trait BlobStore: std::fmt::Debug + Send + Sync {
    /// Store bytes under `key`, overwriting any existing object there, and
    /// tag them with `content_type` when one is given. Returns a
    /// dereferenceable locator for the stored object.
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<String, BlobError>;

    /// Retrieve the object stored under `key`.
    ///
    /// Returns [`BlobError::NotFound`] when the key is absent.
    async fn get(&self, key: &str) -> Result<StoredBlob, BlobError>;

    /// Remove the object at `key`. Deleting a key that does not exist is
    /// not an error; completion is best-effort.
    async fn delete(&self, key: &str) -> Result<(), BlobError>;
}
