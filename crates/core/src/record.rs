use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status assigned to every newly created record.
pub const STATUS_PENDING: &str = "pending";

/// The one status value with a defined side effect: setting it triggers the
/// review notification.
pub const STATUS_REVIEWED: &str = "reviewed";

/// A patient record: the metadata document stored alongside an uploaded
/// file.
///
/// Serialized with camelCase keys, which is the exact shape persisted in the
/// document store and returned over the API. `patientId` is the partition
/// key and never changes after creation; `id` is globally unique across all
/// partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(example = json!({
    "id": "550e8400-e29b-41d4-a716-446655440000",
    "patientId": "P004",
    "blobKey": "P004/550e8400-e29b-41d4-a716-446655440000.jpg",
    "blobUrl": "https://uploads.example.com/P004/550e8400-e29b-41d4-a716-446655440000.jpg",
    "originalName": "scan.jpg",
    "contentType": "image/jpeg",
    "status": "pending",
    "gpNotes": "",
    "createdAt": 1_754_000_000
})))]
pub struct Record {
    /// Unique record identifier, generated at creation.
    pub id: String,

    /// Owning patient; used as the partition key in the document store.
    pub patient_id: String,

    /// Storage key of the binary payload: `{patientId}/{uuid}.{ext}`.
    pub blob_key: String,

    /// Dereferenceable locator for the payload, as returned by the blob
    /// store at upload time.
    pub blob_url: String,

    /// Filename the client uploaded, if any. Informational only.
    pub original_name: Option<String>,

    /// MIME type the client uploaded, if any. Informational only.
    pub content_type: Option<String>,

    /// Free-form status. Starts at [`STATUS_PENDING`]; any non-empty string
    /// is accepted on update.
    pub status: String,

    /// Free-text GP notes. Empty until a GP writes some.
    pub gp_notes: String,

    /// Tags produced by downstream analysis. Absent until explicitly set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_tags: Option<Vec<String>>,

    /// Creation time, epoch seconds. Set once.
    pub created_at: i64,

    /// Last update time, epoch seconds. Absent until the first update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Record {
    /// Build a fresh record for a newly uploaded file.
    ///
    /// Generates the unique id, stamps `createdAt` with the current time,
    /// and applies the initial lifecycle values (`status = "pending"`,
    /// empty GP notes, no tags).
    pub fn new(
        patient_id: impl Into<String>,
        blob_key: impl Into<String>,
        blob_url: impl Into<String>,
        original_name: Option<String>,
        content_type: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            patient_id: patient_id.into(),
            blob_key: blob_key.into(),
            blob_url: blob_url.into(),
            original_name,
            content_type,
            status: STATUS_PENDING.to_owned(),
            gp_notes: String::new(),
            ai_tags: None,
            created_at: Utc::now().timestamp(),
            updated_at: None,
        }
    }

    /// Shallow-merge a patch into this record.
    ///
    /// Only fields present in the patch are overwritten; everything else is
    /// preserved. `updatedAt` is re-stamped from the patch on every call.
    pub fn apply_patch(&mut self, patch: &RecordPatch) {
        if let Some(status) = &patch.status {
            status.clone_into(&mut self.status);
        }
        if let Some(notes) = &patch.gp_notes {
            notes.clone_into(&mut self.gp_notes);
        }
        if let Some(tags) = &patch.ai_tags {
            self.ai_tags = Some(tags.clone());
        }
        self.updated_at = Some(patch.updated_at);
    }
}

/// A partial update to a [`Record`].
///
/// `None` fields are left untouched by [`Record::apply_patch`]; `updated_at`
/// is always written through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    /// New status, if the caller set one.
    pub status: Option<String>,

    /// New GP notes, if the caller set them.
    pub gp_notes: Option<String>,

    /// New analysis tags, if the caller set them.
    pub ai_tags: Option<Vec<String>>,

    /// Update timestamp, epoch seconds. Stamped by the caller.
    pub updated_at: i64,
}

impl RecordPatch {
    /// Returns `true` when the patch carries no recognized field.
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.gp_notes.is_none() && self.ai_tags.is_none()
    }
}
