use async_trait::async_trait;

use carelog_core::{Record, RecordPatch};

use crate::error::StoreError;

/// Trait for persisting patient records in a document store.
///
/// Documents are partitioned by `patientId` and keyed by the record `id`,
/// which is unique across the whole store (an invariant the caller upholds;
/// backends do not enforce it). Implementations must be `Send + Sync` and
/// safe for concurrent access.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record, fully replacing any document with the same id.
    /// Calling twice with an identical record is a no-op the second time.
    async fn create(&self, record: &Record) -> Result<(), StoreError>;

    /// Return up to `limit` records whose `patientId` matches exactly,
    /// most-recent-first by the store's modification timestamp (not
    /// `createdAt`). Truncation happens client-side after retrieval.
    async fn list_by_patient(
        &self,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError>;

    /// Find a record by id, scanning across all partitions. Returns the
    /// first match, or `None` if no document carries the id. Behavior with
    /// duplicate ids is undefined.
    async fn get_by_id(&self, id: &str) -> Result<Option<Record>, StoreError>;

    /// Read the current document, shallow-merge `patch` onto it, and write
    /// the full merged document back. Returns the merged record, or `None`
    /// if the id is unknown.
    ///
    /// Not transactionally isolated: two concurrent updates to the same id
    /// race, and the last full-document write wins.
    async fn update(&self, id: &str, patch: &RecordPatch) -> Result<Option<Record>, StoreError>;

    /// Remove the document with the given id (looking it up first to learn
    /// its partition key). Returns `true` if a document was removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Case-insensitive substring search over all known `patientId` values.
    /// The result is de-duplicated and truncated to `limit`.
    async fn search_patient_ids(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError>;
}
