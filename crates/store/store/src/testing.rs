use uuid::Uuid;

use carelog_core::{Record, RecordPatch};

use crate::error::StoreError;
use crate::store::RecordStore;

/// Build a record for conformance testing. The patient id is randomized per
/// call site so suites can run repeatedly against shared backends.
fn test_record(patient_id: &str, original_name: &str) -> Record {
    let id = Uuid::new_v4();
    Record::new(
        patient_id,
        format!("{patient_id}/{id}.jpg"),
        format!("memory://{patient_id}/{id}.jpg"),
        Some(original_name.to_owned()),
        Some("image/jpeg".to_owned()),
    )
}

fn fresh_patient_id() -> String {
    format!("P-{}", Uuid::new_v4())
}

/// Run the full record store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(store: &dyn RecordStore) -> Result<(), StoreError> {
    test_get_missing(store).await?;
    test_create_and_get(store).await?;
    test_create_is_idempotent(store).await?;
    test_update_merges_partial_fields(store).await?;
    test_update_missing(store).await?;
    test_delete(store).await?;
    test_list_filters_orders_truncates(store).await?;
    test_search_patient_ids(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn RecordStore) -> Result<(), StoreError> {
    let found = store.get_by_id("no-such-record").await?;
    assert!(found.is_none(), "get on missing id should return None");
    Ok(())
}

async fn test_create_and_get(store: &dyn RecordStore) -> Result<(), StoreError> {
    let record = test_record(&fresh_patient_id(), "scan.jpg");
    store.create(&record).await?;

    let found = store.get_by_id(&record.id).await?;
    assert_eq!(found.as_ref(), Some(&record), "stored document should roundtrip");
    Ok(())
}

async fn test_create_is_idempotent(store: &dyn RecordStore) -> Result<(), StoreError> {
    let patient_id = fresh_patient_id();
    let record = test_record(&patient_id, "scan.jpg");
    store.create(&record).await?;
    store.create(&record).await?;

    let listed = store.list_by_patient(&patient_id, 50).await?;
    assert_eq!(listed.len(), 1, "double create should leave a single document");
    Ok(())
}

async fn test_update_merges_partial_fields(store: &dyn RecordStore) -> Result<(), StoreError> {
    let record = test_record(&fresh_patient_id(), "scan.jpg");
    store.create(&record).await?;

    let patch = RecordPatch {
        gp_notes: Some("nothing acute".to_owned()),
        updated_at: record.created_at + 30,
        ..RecordPatch::default()
    };
    let merged = store
        .update(&record.id, &patch)
        .await?
        .expect("update of existing record should return the merged document");

    assert_eq!(merged.gp_notes, "nothing acute");
    assert_eq!(merged.status, record.status, "untouched fields keep prior values");
    assert_eq!(merged.ai_tags, record.ai_tags);
    assert_eq!(merged.blob_key, record.blob_key);
    assert_eq!(merged.updated_at, Some(record.created_at + 30));

    let persisted = store.get_by_id(&record.id).await?.expect("record should persist");
    assert_eq!(persisted, merged, "merged document should be written back");
    Ok(())
}

async fn test_update_missing(store: &dyn RecordStore) -> Result<(), StoreError> {
    let patch = RecordPatch {
        status: Some("reviewed".to_owned()),
        updated_at: 1,
        ..RecordPatch::default()
    };
    let merged = store.update("no-such-record", &patch).await?;
    assert!(merged.is_none(), "update on missing id should return None");
    Ok(())
}

async fn test_delete(store: &dyn RecordStore) -> Result<(), StoreError> {
    let record = test_record(&fresh_patient_id(), "scan.jpg");
    store.create(&record).await?;

    let removed = store.delete(&record.id).await?;
    assert!(removed, "delete should report an existing document as removed");

    let found = store.get_by_id(&record.id).await?;
    assert!(found.is_none(), "get after delete should return None");

    let removed = store.delete(&record.id).await?;
    assert!(!removed, "delete on missing id should return false");
    Ok(())
}

async fn test_list_filters_orders_truncates(store: &dyn RecordStore) -> Result<(), StoreError> {
    let patient_a = fresh_patient_id();
    let patient_b = fresh_patient_id();

    let first = test_record(&patient_a, "one.jpg");
    let second = test_record(&patient_a, "two.jpg");
    let third = test_record(&patient_a, "three.jpg");
    let foreign = test_record(&patient_b, "other.jpg");

    store.create(&first).await?;
    store.create(&second).await?;
    store.create(&third).await?;
    store.create(&foreign).await?;

    let listed = store.list_by_patient(&patient_a, 50).await?;
    assert_eq!(listed.len(), 3);
    assert!(
        listed.iter().all(|r| r.patient_id == patient_a),
        "list must never return another patient's records"
    );
    let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![third.id.as_str(), second.id.as_str(), first.id.as_str()],
        "list should be most-recent-first"
    );

    // Updating the oldest record makes it the most recently modified.
    let patch = RecordPatch {
        gp_notes: Some("bumped".to_owned()),
        updated_at: first.created_at + 60,
        ..RecordPatch::default()
    };
    store.update(&first.id, &patch).await?;

    let listed = store.list_by_patient(&patient_a, 50).await?;
    assert_eq!(
        listed.first().map(|r| r.id.as_str()),
        Some(first.id.as_str()),
        "ordering follows modification time, not creation time"
    );

    let truncated = store.list_by_patient(&patient_a, 2).await?;
    assert_eq!(truncated.len(), 2, "list should truncate at the limit");
    Ok(())
}

async fn test_search_patient_ids(store: &dyn RecordStore) -> Result<(), StoreError> {
    let patient = fresh_patient_id();

    // Two records for the same patient: the search result must de-duplicate.
    store.create(&test_record(&patient, "a.jpg")).await?;
    store.create(&test_record(&patient, "b.jpg")).await?;

    // Query with flipped case on a unique fragment of the id.
    let fragment = patient[2..14].to_uppercase();
    let results = store.search_patient_ids(&fragment, 10).await?;
    assert_eq!(
        results,
        vec![patient.clone()],
        "search should match case-insensitively and de-duplicate"
    );

    let truncated = store.search_patient_ids("p-", 1).await?;
    assert_eq!(truncated.len(), 1, "search should truncate at the limit");

    let empty = store.search_patient_ids("zz-no-such-patient", 10).await?;
    assert!(empty.is_empty());
    Ok(())
}
