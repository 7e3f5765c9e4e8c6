use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::error::BlobError;
use crate::store::{BlobStore, StoredBlob};

/// Fallback MIME type for objects stored without one.
const OCTET_STREAM: &str = "application/octet-stream";

/// In-memory [`BlobStore`] backed by a [`DashMap`].
///
/// The test double for the managed object store. Locators use the
/// `memory://` scheme and are not dereferenceable outside the process.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: DashMap<String, (Bytes, Option<String>)>,
}

impl MemoryBlobStore {
    /// Create a new, empty in-memory blob store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects. Handy in tests asserting on orphans.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` when no objects are stored.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<String, BlobError> {
        self.objects
            .insert(key.to_owned(), (data, content_type.map(ToOwned::to_owned)));
        Ok(format!("memory://{key}"))
    }

    async fn get(&self, key: &str) -> Result<StoredBlob, BlobError> {
        let Some(entry) = self.objects.get(key) else {
            return Err(BlobError::NotFound(key.to_owned()));
        };
        let (data, content_type) = entry.value();
        Ok(StoredBlob {
            data: data.clone(),
            content_type: content_type
                .clone()
                .unwrap_or_else(|| OCTET_STREAM.to_owned()),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        self.objects.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_roundtrip() {
        let store = MemoryBlobStore::new();
        let url = store
            .put("P1/a.jpg", Bytes::from_static(b"jpeg-bytes"), Some("image/jpeg"))
            .await
            .unwrap();
        assert_eq!(url, "memory://P1/a.jpg");

        let blob = store.get("P1/a.jpg").await.unwrap();
        assert_eq!(blob.data.as_ref(), b"jpeg-bytes");
        assert_eq!(blob.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn missing_content_type_falls_back() {
        let store = MemoryBlobStore::new();
        store
            .put("P1/raw", Bytes::from_static(b"data"), None)
            .await
            .unwrap();

        let blob = store.get("P1/raw").await.unwrap();
        assert_eq!(blob.content_type, OCTET_STREAM);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = MemoryBlobStore::new();
        let err = store.get("nope").await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound(_)));
    }

    #[tokio::test]
    async fn put_overwrites_existing_object() {
        let store = MemoryBlobStore::new();
        store
            .put("P1/a.jpg", Bytes::from_static(b"v1"), Some("image/jpeg"))
            .await
            .unwrap();
        store
            .put("P1/a.jpg", Bytes::from_static(b"v2"), Some("image/png"))
            .await
            .unwrap();

        let blob = store.get("P1/a.jpg").await.unwrap();
        assert_eq!(blob.data.as_ref(), b"v2");
        assert_eq!(blob.content_type, "image/png");
    }

    #[tokio::test]
    async fn delete_is_best_effort() {
        let store = MemoryBlobStore::new();
        store
            .put("P1/a.jpg", Bytes::from_static(b"v1"), None)
            .await
            .unwrap();

        store.delete("P1/a.jpg").await.unwrap();
        assert!(matches!(
            store.get("P1/a.jpg").await.unwrap_err(),
            BlobError::NotFound(_)
        ));

        // Deleting again (or a key that never existed) is fine.
        store.delete("P1/a.jpg").await.unwrap();
        store.delete("never-there").await.unwrap();
    }
}
