use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use carelog_core::Record;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Service name.
    #[schema(example = "carelog-api")]
    pub service: String,
}

/// Multipart form accepted by the upload endpoint.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// Owning patient id.
    #[schema(example = "P004")]
    pub patient_id: String,
    /// The file payload.
    #[schema(value_type = String, format = Binary)]
    pub files: Vec<u8>,
}

/// Response after a successful upload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Human-readable status string.
    #[schema(example = "uploaded")]
    pub message: String,
    /// The created record.
    pub record: Record,
}

/// A patient's records plus a count, most recently modified first.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordListResponse {
    /// The patient the listing is for.
    #[schema(example = "P004")]
    pub patient_id: String,
    /// Number of records returned.
    #[schema(example = 2)]
    pub count: usize,
    /// The records themselves.
    pub records: Vec<Record>,
}

/// Request body for partially updating a record.
///
/// Any subset of the three fields; unknown keys are ignored, but at least
/// one recognized field must be present.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordRequest {
    /// New status value.
    #[schema(example = "reviewed")]
    pub status: Option<String>,
    /// New GP notes.
    #[schema(example = "nothing acute, review in 6 months")]
    pub gp_notes: Option<String>,
    /// New analysis tags.
    pub ai_tags: Option<Vec<String>>,
}

/// Response after deleting a record.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    /// Human-readable status string.
    #[schema(example = "record and blob deleted")]
    pub message: String,
}

/// Distinct patient ids matching a search query.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    /// Matching patient ids.
    pub results: Vec<String>,
}

/// Generic error response returned on failures.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    #[schema(example = "record not found")]
    pub error: String,
}
