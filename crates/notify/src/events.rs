use serde::{Deserialize, Serialize};

/// Payload posted to the upload endpoint after a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadEvent {
    pub record_id: String,
    pub patient_id: String,
    pub blob_url: String,
    pub content_type: Option<String>,
}

/// Payload posted to the analysis endpoint after a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisEvent {
    pub record_id: String,
    pub patient_id: String,
    pub blob_url: String,
}

/// Payload posted to the review endpoint when a record becomes `reviewed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEvent {
    pub record_id: String,
    pub patient_id: String,
    pub status: String,
    pub updated_at: i64,
}

/// Payload posted to the audit endpoint when a record is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub record_id: String,
    pub patient_id: String,
    pub action: String,
    pub timestamp: i64,
}
