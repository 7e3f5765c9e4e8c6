use axum::Json;
use axum::extract::{Multipart, State};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use carelog_service::{ServiceError, UploadRequest, UploadedFile};

use crate::error::ServerError;

use super::AppState;
use super::schemas::{ErrorResponse, UploadForm, UploadResponse};

/// `POST /upload` -- store a patient file and create its metadata record.
///
/// Accepts multipart form data with a `patientId` field and the file under
/// `files` (`file` is accepted as an alias). Returns the created record.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "Upload",
    summary = "Upload a patient file",
    description = "Stores the payload in blob storage, creates the metadata record, and fires the upload/analysis webhooks best-effort.",
    request_body(content = UploadForm, content_type = "multipart/form-data", description = "patientId plus the file payload"),
    responses(
        (status = 201, description = "File stored and record created", body = UploadResponse),
        (status = 400, description = "Missing file or patientId", body = ErrorResponse),
        (status = 500, description = "Storage or database failure", body = ErrorResponse)
    )
)]
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ServerError> {
    let mut patient_id = String::new();
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        match field.name() {
            Some("patientId") => {
                patient_id = field.text().await.map_err(malformed)?;
            }
            Some("files" | "file") => {
                let name = field.file_name().map(ToOwned::to_owned);
                let content_type = field.content_type().map(ToOwned::to_owned);
                let data = field.bytes().await.map_err(malformed)?;
                file = Some(UploadedFile {
                    name,
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }

    let record = state
        .service
        .upload(UploadRequest { patient_id, file })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "uploaded".to_owned(),
            record,
        }),
    ))
}

fn malformed(err: MultipartError) -> ServerError {
    ServerError::Service(ServiceError::Validation(format!(
        "malformed multipart body: {err}"
    )))
}
