use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{error, info, warn};

use carelog_blob::{BlobError, BlobStore, StoredBlob, derive_blob_key};
use carelog_core::{Record, RecordPatch, STATUS_REVIEWED};
use carelog_notify::WorkflowNotifier;
use carelog_store::RecordStore;

use crate::error::ServiceError;

/// Most records returned by a patient listing.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Most patient ids returned by a search.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// The file part of an upload request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename as sent by the client, if any.
    pub name: Option<String>,
    /// MIME type as sent by the client, if any.
    pub content_type: Option<String>,
    /// The raw payload.
    pub data: Bytes,
}

/// An upload: the owning patient plus the file payload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub patient_id: String,
    /// `None` when the multipart body carried no file part; rejected during
    /// validation.
    pub file: Option<UploadedFile>,
}

/// A partial record update. Unrecognized fields never reach this type; at
/// least one of the three must be present.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    pub status: Option<String>,
    pub gp_notes: Option<String>,
    pub ai_tags: Option<Vec<String>>,
}

/// Orchestrates the blob store, record store, and workflow notifier into
/// the portal's record operations.
///
/// Stateless between calls: every dependency is an injected shared client,
/// so tests swap in the in-memory backends.
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    notifier: Arc<WorkflowNotifier>,
}

impl RecordService {
    /// Create a new `RecordService` over the given backends.
    pub fn new(
        store: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<WorkflowNotifier>,
    ) -> Self {
        Self {
            store,
            blobs,
            notifier,
        }
    }

    /// Store an uploaded file and create its metadata record.
    ///
    /// The sequence is linear with no rollback: a blob upload failure aborts
    /// before any record exists, while a record create failure after a
    /// successful upload leaves the blob orphaned. That orphan is logged and
    /// accepted; nothing cleans it up.
    pub async fn upload(&self, request: UploadRequest) -> Result<Record, ServiceError> {
        let patient_id = request.patient_id.trim();
        if patient_id.is_empty() {
            return Err(ServiceError::Validation("patientId required".to_owned()));
        }
        let Some(file) = request.file else {
            return Err(ServiceError::Validation("file missing".to_owned()));
        };

        let blob_key = derive_blob_key(patient_id, file.name.as_deref());
        let blob_url = self
            .blobs
            .put(&blob_key, file.data, file.content_type.as_deref())
            .await
            .map_err(|e| {
                error!(patient_id = %patient_id, blob_key = %blob_key, error = %e, "blob upload failed");
                ServiceError::Storage(e.to_string())
            })?;

        let record = Record::new(patient_id, blob_key, blob_url, file.name, file.content_type);

        if let Err(e) = self.store.create(&record).await {
            error!(
                record_id = %record.id,
                blob_key = %record.blob_key,
                error = %e,
                "record create failed; uploaded blob is now orphaned"
            );
            return Err(ServiceError::Persistence(e.to_string()));
        }

        info!(record_id = %record.id, patient_id = %record.patient_id, "file uploaded");
        self.notifier.record_uploaded(&record);

        Ok(record)
    }

    /// Fetch a single record by id.
    pub async fn get(&self, id: &str) -> Result<Record, ServiceError> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::RecordNotFound)
    }

    /// List a patient's records, most recently modified first.
    pub async fn list_for_patient(&self, patient_id: &str) -> Result<Vec<Record>, ServiceError> {
        let patient_id = patient_id.trim();
        if patient_id.is_empty() {
            return Err(ServiceError::Validation(
                "patientId query param required".to_owned(),
            ));
        }

        Ok(self
            .store
            .list_by_patient(patient_id, DEFAULT_LIST_LIMIT)
            .await?)
    }

    /// Merge a partial update into a record.
    ///
    /// At least one recognized field must be present; string fields are
    /// trimmed, and `status` may not be blanked out. When the merged
    /// record's status is `reviewed`, the review notification fires.
    pub async fn update(&self, id: &str, request: UpdateRequest) -> Result<Record, ServiceError> {
        let status = match request.status {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(ServiceError::Validation(
                        "status must not be empty".to_owned(),
                    ));
                }
                Some(trimmed.to_owned())
            }
            None => None,
        };
        let gp_notes = request.gp_notes.map(|notes| notes.trim().to_owned());

        let patch = RecordPatch {
            status,
            gp_notes,
            ai_tags: request.ai_tags,
            updated_at: Utc::now().timestamp(),
        };
        if patch.is_empty() {
            return Err(ServiceError::Validation("no fields to update".to_owned()));
        }

        let merged = self
            .store
            .update(id, &patch)
            .await?
            .ok_or(ServiceError::RecordNotFound)?;

        if merged.status == STATUS_REVIEWED {
            self.notifier.record_reviewed(&merged);
        }

        info!(record_id = %id, "record updated");
        Ok(merged)
    }

    /// Delete a record and its blob.
    ///
    /// The blob delete is best-effort: a failure there is logged and the
    /// metadata delete still proceeds.
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let record = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::RecordNotFound)?;

        if let Err(e) = self.blobs.delete(&record.blob_key).await {
            warn!(
                record_id = %id,
                blob_key = %record.blob_key,
                error = %e,
                "blob delete failed; continuing with metadata delete"
            );
        }

        if !self.store.delete(id).await? {
            return Err(ServiceError::RecordNotFound);
        }

        info!(record_id = %id, patient_id = %record.patient_id, "record and blob deleted");
        self.notifier.record_deleted(&record, Utc::now().timestamp());

        Ok(())
    }

    /// Search known patient ids by case-insensitive substring.
    pub async fn search_patients(&self, query: &str) -> Result<Vec<String>, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::Validation(
                "query param required".to_owned(),
            ));
        }

        Ok(self
            .store
            .search_patient_ids(query, DEFAULT_SEARCH_LIMIT)
            .await?)
    }

    /// Fetch the raw payload stored under a blob key, for the media proxy.
    pub async fn fetch_media(&self, blob_key: &str) -> Result<StoredBlob, ServiceError> {
        self.blobs.get(blob_key).await.map_err(|e| match e {
            BlobError::NotFound(_) => ServiceError::BlobNotFound,
            BlobError::Storage(detail) => ServiceError::Storage(detail),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::Json;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use tokio::sync::mpsc;

    use carelog_blob::MemoryBlobStore;
    use carelog_core::RecordPatch;
    use carelog_notify::WebhookConfig;
    use carelog_store::StoreError;
    use carelog_store_memory::MemoryRecordStore;

    use super::*;

    fn quiet_notifier() -> Arc<WorkflowNotifier> {
        Arc::new(WorkflowNotifier::new(WebhookConfig::default()).unwrap())
    }

    fn service_with(
        store: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<WorkflowNotifier>,
    ) -> RecordService {
        RecordService::new(store, blobs, notifier)
    }

    fn memory_service() -> (RecordService, Arc<MemoryRecordStore>, Arc<MemoryBlobStore>) {
        let store = Arc::new(MemoryRecordStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let service = service_with(store.clone(), blobs.clone(), quiet_notifier());
        (service, store, blobs)
    }

    fn scan_upload(patient_id: &str) -> UploadRequest {
        UploadRequest {
            patient_id: patient_id.to_owned(),
            file: Some(UploadedFile {
                name: Some("scan.jpg".to_owned()),
                content_type: Some("image/jpeg".to_owned()),
                data: Bytes::from_static(b"jpeg-bytes"),
            }),
        }
    }

    // -- Upload orchestration ---------------------------------------------

    #[tokio::test]
    async fn upload_creates_pending_record_and_stores_blob() {
        let (service, _store, blobs) = memory_service();

        let record = service.upload(scan_upload("P004")).await.unwrap();

        assert_eq!(record.patient_id, "P004");
        assert_eq!(record.status, "pending");
        assert_eq!(record.gp_notes, "");
        assert!(record.ai_tags.is_none());
        assert!(record.updated_at.is_none());
        assert_eq!(record.original_name.as_deref(), Some("scan.jpg"));
        assert_eq!(record.content_type.as_deref(), Some("image/jpeg"));

        // Key shape: P004/<uuid>.jpg, and the url points at the stored key.
        assert!(record.blob_key.starts_with("P004/"));
        assert!(record.blob_key.ends_with(".jpg"));
        assert_eq!(record.blob_url, format!("memory://{}", record.blob_key));

        let blob = blobs.get(&record.blob_key).await.unwrap();
        assert_eq!(blob.data.as_ref(), b"jpeg-bytes");
        assert_eq!(blob.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn upload_trims_patient_id() {
        let (service, _store, _blobs) = memory_service();
        let record = service.upload(scan_upload("  P004  ")).await.unwrap();
        assert_eq!(record.patient_id, "P004");
        assert!(record.blob_key.starts_with("P004/"));
    }

    #[tokio::test]
    async fn upload_rejects_blank_patient_id() {
        let (service, _store, blobs) = memory_service();
        let err = service.upload(scan_upload("   ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(blobs.is_empty(), "nothing should be stored on validation failure");
    }

    #[tokio::test]
    async fn upload_rejects_missing_file() {
        let (service, _store, _blobs) = memory_service();
        let err = service
            .upload(UploadRequest {
                patient_id: "P004".to_owned(),
                file: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    /// Blob store whose writes always fail.
    struct BrokenBlobStore;

    #[async_trait]
    impl BlobStore for BrokenBlobStore {
        async fn put(
            &self,
            _key: &str,
            _data: Bytes,
            _content_type: Option<&str>,
        ) -> Result<String, BlobError> {
            Err(BlobError::Storage("bucket unavailable".to_owned()))
        }

        async fn get(&self, key: &str) -> Result<StoredBlob, BlobError> {
            Err(BlobError::NotFound(key.to_owned()))
        }

        async fn delete(&self, _key: &str) -> Result<(), BlobError> {
            Err(BlobError::Storage("bucket unavailable".to_owned()))
        }
    }

    #[tokio::test]
    async fn upload_aborts_on_blob_failure_without_creating_a_record() {
        let store = Arc::new(MemoryRecordStore::new());
        let service = service_with(store.clone(), Arc::new(BrokenBlobStore), quiet_notifier());

        let err = service.upload(scan_upload("P004")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));

        let listed = store.list_by_patient("P004", 50).await.unwrap();
        assert!(listed.is_empty(), "no record may exist after a failed upload");
    }

    /// Record store that refuses every operation.
    struct BrokenRecordStore;

    #[async_trait]
    impl RecordStore for BrokenRecordStore {
        async fn create(&self, _record: &Record) -> Result<(), StoreError> {
            Err(StoreError::Backend("table unavailable".to_owned()))
        }

        async fn list_by_patient(
            &self,
            _patient_id: &str,
            _limit: usize,
        ) -> Result<Vec<Record>, StoreError> {
            Err(StoreError::Backend("table unavailable".to_owned()))
        }

        async fn get_by_id(&self, _id: &str) -> Result<Option<Record>, StoreError> {
            Err(StoreError::Backend("table unavailable".to_owned()))
        }

        async fn update(
            &self,
            _id: &str,
            _patch: &RecordPatch,
        ) -> Result<Option<Record>, StoreError> {
            Err(StoreError::Backend("table unavailable".to_owned()))
        }

        async fn delete(&self, _id: &str) -> Result<bool, StoreError> {
            Err(StoreError::Backend("table unavailable".to_owned()))
        }

        async fn search_patient_ids(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Backend("table unavailable".to_owned()))
        }
    }

    #[tokio::test]
    async fn upload_persistence_failure_leaves_the_blob_orphaned() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let service = service_with(Arc::new(BrokenRecordStore), blobs.clone(), quiet_notifier());

        let err = service.upload(scan_upload("P004")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Persistence(_)));

        // The accepted inconsistency: the payload was written before the
        // record create failed, and nothing compensates.
        assert_eq!(blobs.len(), 1);
    }

    // -- Lifecycle --------------------------------------------------------

    #[tokio::test]
    async fn get_missing_record_is_not_found() {
        let (service, _store, _blobs) = memory_service();
        let err = service.get("nope").await.unwrap_err();
        assert!(matches!(err, ServiceError::RecordNotFound));
    }

    #[tokio::test]
    async fn update_merges_notes_and_stamps_updated_at() {
        let (service, _store, _blobs) = memory_service();
        let record = service.upload(scan_upload("P004")).await.unwrap();

        let merged = service
            .update(
                &record.id,
                UpdateRequest {
                    gp_notes: Some("nothing acute".to_owned()),
                    ..UpdateRequest::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(merged.gp_notes, "nothing acute");
        assert_eq!(merged.status, record.status);
        assert_eq!(merged.blob_key, record.blob_key);
        let first_stamp = merged.updated_at.expect("updatedAt should be stamped");
        assert!(first_stamp >= record.created_at);

        // A later update never moves updatedAt backwards.
        let merged = service
            .update(
                &record.id,
                UpdateRequest {
                    ai_tags: Some(vec!["xray".to_owned()]),
                    ..UpdateRequest::default()
                },
            )
            .await
            .unwrap();
        assert!(merged.updated_at.unwrap() >= first_stamp);
        assert_eq!(merged.gp_notes, "nothing acute", "earlier merge survives");

        let fetched = service.get(&record.id).await.unwrap();
        assert_eq!(fetched, merged);
    }

    #[tokio::test]
    async fn update_trims_string_fields() {
        let (service, _store, _blobs) = memory_service();
        let record = service.upload(scan_upload("P004")).await.unwrap();

        let merged = service
            .update(
                &record.id,
                UpdateRequest {
                    status: Some("  reviewed  ".to_owned()),
                    gp_notes: Some("  ok  ".to_owned()),
                    ..UpdateRequest::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(merged.status, "reviewed");
        assert_eq!(merged.gp_notes, "ok");
    }

    #[tokio::test]
    async fn update_without_recognized_fields_is_rejected_and_writes_nothing() {
        let (service, _store, _blobs) = memory_service();
        let record = service.upload(scan_upload("P004")).await.unwrap();

        let err = service
            .update(&record.id, UpdateRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let fetched = service.get(&record.id).await.unwrap();
        assert!(fetched.updated_at.is_none(), "no store mutation may occur");
    }

    #[tokio::test]
    async fn update_rejects_blank_status() {
        let (service, _store, _blobs) = memory_service();
        let record = service.upload(scan_upload("P004")).await.unwrap();

        let err = service
            .update(
                &record.id,
                UpdateRequest {
                    status: Some("   ".to_owned()),
                    ..UpdateRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let (service, _store, _blobs) = memory_service();
        let err = service
            .update(
                "nope",
                UpdateRequest {
                    gp_notes: Some("x".to_owned()),
                    ..UpdateRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::RecordNotFound));
    }

    #[tokio::test]
    async fn delete_removes_record_and_blob() {
        let (service, _store, blobs) = memory_service();
        let record = service.upload(scan_upload("P004")).await.unwrap();

        service.delete(&record.id).await.unwrap();

        assert!(matches!(
            service.get(&record.id).await.unwrap_err(),
            ServiceError::RecordNotFound
        ));
        assert!(matches!(
            service.fetch_media(&record.blob_key).await.unwrap_err(),
            ServiceError::BlobNotFound
        ));
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_record_is_not_found() {
        let (service, _store, _blobs) = memory_service();
        let err = service.delete("nope").await.unwrap_err();
        assert!(matches!(err, ServiceError::RecordNotFound));
    }

    /// Blob store that stores fine but cannot delete.
    struct StickyBlobStore {
        inner: MemoryBlobStore,
    }

    #[async_trait]
    impl BlobStore for StickyBlobStore {
        async fn put(
            &self,
            key: &str,
            data: Bytes,
            content_type: Option<&str>,
        ) -> Result<String, BlobError> {
            self.inner.put(key, data, content_type).await
        }

        async fn get(&self, key: &str) -> Result<StoredBlob, BlobError> {
            self.inner.get(key).await
        }

        async fn delete(&self, _key: &str) -> Result<(), BlobError> {
            Err(BlobError::Storage("delete refused".to_owned()))
        }
    }

    #[tokio::test]
    async fn delete_proceeds_when_blob_delete_fails() {
        let store = Arc::new(MemoryRecordStore::new());
        let blobs = Arc::new(StickyBlobStore {
            inner: MemoryBlobStore::new(),
        });
        let service = service_with(store.clone(), blobs, quiet_notifier());

        let record = service.upload(scan_upload("P004")).await.unwrap();
        service.delete(&record.id).await.unwrap();

        let found = store.get_by_id(&record.id).await.unwrap();
        assert!(found.is_none(), "metadata delete must not be blocked");
    }

    // -- Listing & search -------------------------------------------------

    #[tokio::test]
    async fn list_requires_patient_id() {
        let (service, _store, _blobs) = memory_service();
        let err = service.list_for_patient("  ").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn list_returns_only_the_patients_records_most_recent_first() {
        let (service, _store, _blobs) = memory_service();
        let first = service.upload(scan_upload("P001")).await.unwrap();
        let second = service.upload(scan_upload("P001")).await.unwrap();
        service.upload(scan_upload("P002")).await.unwrap();

        let listed = service.list_for_patient("P001").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|r| r.patient_id == "P001"));
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn search_requires_query() {
        let (service, _store, _blobs) = memory_service();
        let err = service.search_patients("").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn search_matches_case_insensitively_without_duplicates() {
        let (service, _store, _blobs) = memory_service();
        service.upload(scan_upload("P004")).await.unwrap();
        service.upload(scan_upload("P004")).await.unwrap();
        service.upload(scan_upload("P017")).await.unwrap();
        service.upload(scan_upload("Q900")).await.unwrap();

        let results = service.search_patients("p0").await.unwrap();
        assert_eq!(results, vec!["P004".to_owned(), "P017".to_owned()]);
    }

    // -- Media proxy ------------------------------------------------------

    #[tokio::test]
    async fn media_roundtrip_returns_stored_bytes_and_type() {
        let (service, _store, _blobs) = memory_service();
        let record = service.upload(scan_upload("P004")).await.unwrap();

        let blob = service.fetch_media(&record.blob_key).await.unwrap();
        assert_eq!(blob.data.as_ref(), b"jpeg-bytes");
        assert_eq!(blob.content_type, "image/jpeg");
    }

    // -- Review notification ----------------------------------------------

    async fn capture_endpoint() -> (String, mpsc::Receiver<serde_json::Value>) {
        let (tx, rx) = mpsc::channel::<serde_json::Value>(8);
        let app = Router::new().route(
            "/hook",
            post(move |Json(body): Json<serde_json::Value>| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(body).await;
                    StatusCode::OK
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/hook"), rx)
    }

    #[tokio::test]
    async fn review_event_fires_when_resulting_status_is_reviewed() {
        let (url, mut rx) = capture_endpoint().await;
        let notifier = Arc::new(
            WorkflowNotifier::new(WebhookConfig {
                review_url: Some(url),
                ..WebhookConfig::default()
            })
            .unwrap(),
        );
        let service = service_with(
            Arc::new(MemoryRecordStore::new()),
            Arc::new(MemoryBlobStore::new()),
            notifier,
        );

        let record = service.upload(scan_upload("P004")).await.unwrap();
        let merged = service
            .update(
                &record.id,
                UpdateRequest {
                    status: Some("reviewed".to_owned()),
                    ..UpdateRequest::default()
                },
            )
            .await
            .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("review notification should arrive")
            .unwrap();
        assert_eq!(event["recordId"], record.id.as_str());
        assert_eq!(event["patientId"], "P004");
        assert_eq!(event["status"], "reviewed");
        assert_eq!(event["updatedAt"], merged.updated_at.unwrap());
    }

    #[tokio::test]
    async fn non_review_updates_do_not_fire_the_review_event() {
        let (url, mut rx) = capture_endpoint().await;
        let notifier = Arc::new(
            WorkflowNotifier::new(WebhookConfig {
                review_url: Some(url),
                ..WebhookConfig::default()
            })
            .unwrap(),
        );
        let service = service_with(
            Arc::new(MemoryRecordStore::new()),
            Arc::new(MemoryBlobStore::new()),
            notifier,
        );

        let record = service.upload(scan_upload("P004")).await.unwrap();
        service
            .update(
                &record.id,
                UpdateRequest {
                    gp_notes: Some("still pending".to_owned()),
                    ..UpdateRequest::default()
                },
            )
            .await
            .unwrap();

        let outcome = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
        assert!(outcome.is_err(), "no review event may fire for a pending record");
    }
}
