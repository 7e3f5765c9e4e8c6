use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use carelog_core::{Record, RecordPatch};
use carelog_store::error::StoreError;
use carelog_store::store::RecordStore;

/// A stored document plus the sequence number of its last write.
#[derive(Debug, Clone)]
struct Entry {
    record: Record,
    modified_seq: u64,
}

/// In-memory [`RecordStore`] backed by a [`DashMap`] keyed by record id.
///
/// A monotonic sequence counter stands in for the document store's internal
/// modification timestamp, so most-recent-first ordering is exact even when
/// several writes land within the same second.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    documents: DashMap<String, Entry>,
    write_seq: AtomicU64,
}

impl MemoryRecordStore {
    /// Create a new, empty in-memory record store.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.write_seq.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, record: &Record) -> Result<(), StoreError> {
        let seq = self.next_seq();
        self.documents.insert(
            record.id.clone(),
            Entry {
                record: record.clone(),
                modified_seq: seq,
            },
        );
        Ok(())
    }

    async fn list_by_patient(
        &self,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        let mut matches: Vec<(u64, Record)> = self
            .documents
            .iter()
            .filter(|entry| entry.record.patient_id == patient_id)
            .map(|entry| (entry.modified_seq, entry.record.clone()))
            .collect();

        matches.sort_by(|a, b| b.0.cmp(&a.0));
        matches.truncate(limit);

        Ok(matches.into_iter().map(|(_, record)| record).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Record>, StoreError> {
        Ok(self.documents.get(id).map(|entry| entry.record.clone()))
    }

    async fn update(&self, id: &str, patch: &RecordPatch) -> Result<Option<Record>, StoreError> {
        // Read-modify-write, deliberately not atomic: mirrors the managed
        // backends, where a concurrent update to the same id is lost to the
        // last full-document write.
        let Some(mut current) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        current.apply_patch(patch);

        let seq = self.next_seq();
        self.documents.insert(
            id.to_owned(),
            Entry {
                record: current.clone(),
                modified_seq: seq,
            },
        );
        Ok(Some(current))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.documents.remove(id).is_some())
    }

    async fn search_patient_ids(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        let needle = query.to_lowercase();

        let mut ids: Vec<String> = self
            .documents
            .iter()
            .filter(|entry| entry.record.patient_id.to_lowercase().contains(&needle))
            .map(|entry| entry.record.patient_id.clone())
            .collect();

        ids.sort_unstable();
        ids.dedup();
        ids.truncate(limit);
        Ok(ids)
    }
}
