use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use carelog_core::Record;
use carelog_service::UpdateRequest;

use crate::error::ServerError;

use super::AppState;
use super::schemas::{DeleteResponse, ErrorResponse, RecordListResponse, UpdateRecordRequest};

/// Query string for the record listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsQuery {
    /// Patient to list records for.
    #[serde(default)]
    pub patient_id: Option<String>,
}

/// `GET /records?patientId=...` -- list a patient's records.
#[utoipa::path(
    get,
    path = "/records",
    tag = "Records",
    summary = "List patient records",
    description = "Returns up to 50 records for the patient, most recently modified first.",
    params(("patientId" = String, Query, description = "Patient to list records for")),
    responses(
        (status = 200, description = "Records for the patient", body = RecordListResponse),
        (status = 400, description = "Missing patientId", body = ErrorResponse),
        (status = 500, description = "Database failure", body = ErrorResponse)
    )
)]
pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let patient_id = query.patient_id.unwrap_or_default();
    let records = state.service.list_for_patient(&patient_id).await?;

    Ok(Json(RecordListResponse {
        patient_id: patient_id.trim().to_owned(),
        count: records.len(),
        records,
    }))
}

/// `GET /record/{id}` -- fetch a single record.
#[utoipa::path(
    get,
    path = "/record/{id}",
    tag = "Records",
    summary = "Get a record",
    params(("id" = String, Path, description = "Record id")),
    responses(
        (status = 200, description = "The record", body = Record),
        (status = 404, description = "No record with that id", body = ErrorResponse),
        (status = 500, description = "Database failure", body = ErrorResponse)
    )
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let record = state.service.get(&id).await?;
    Ok(Json(record))
}

/// `PUT /record/{id}` -- merge a partial update into a record.
///
/// Accepts any subset of `status`, `gpNotes`, and `aiTags`; at least one
/// must be present. Setting the status to `reviewed` fires the review
/// webhook best-effort.
#[utoipa::path(
    put,
    path = "/record/{id}",
    tag = "Records",
    summary = "Update a record",
    params(("id" = String, Path, description = "Record id")),
    request_body(content = UpdateRecordRequest, description = "Fields to merge"),
    responses(
        (status = 200, description = "The merged record", body = Record),
        (status = 400, description = "No recognized fields to update", body = ErrorResponse),
        (status = 404, description = "No record with that id", body = ErrorResponse),
        (status = 500, description = "Database failure", body = ErrorResponse)
    )
)]
pub async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateRecordRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let record = state
        .service
        .update(
            &id,
            UpdateRequest {
                status: body.status,
                gp_notes: body.gp_notes,
                ai_tags: body.ai_tags,
            },
        )
        .await?;

    Ok(Json(record))
}

/// `DELETE /record/{id}` -- remove a record and its blob.
#[utoipa::path(
    delete,
    path = "/record/{id}",
    tag = "Records",
    summary = "Delete a record",
    description = "Deletes the blob best-effort, removes the metadata document, and fires the audit webhook.",
    params(("id" = String, Path, description = "Record id")),
    responses(
        (status = 200, description = "Record and blob deleted", body = DeleteResponse),
        (status = 404, description = "No record with that id", body = ErrorResponse),
        (status = 500, description = "Database failure", body = ErrorResponse)
    )
)]
pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    state.service.delete(&id).await?;

    Ok(Json(DeleteResponse {
        message: "record and blob deleted".to_owned(),
    }))
}
