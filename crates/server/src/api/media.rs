use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::ServerError;

use super::AppState;
use super::schemas::ErrorResponse;

/// `GET /media/{key}` -- stream a stored payload back to the client.
///
/// The key is the full blob key, e.g. `P004/550e8400-....jpg`.
#[utoipa::path(
    get,
    path = "/media/{key}",
    tag = "Media",
    summary = "Download a stored payload",
    params(("key" = String, Path, description = "Blob key, e.g. P004/uuid.jpg")),
    responses(
        (status = 200, description = "The payload, served with its stored content type"),
        (status = 404, description = "No object under that key", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn media(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ServerError> {
    let blob = state.service.fetch_media(&key).await?;

    Ok(([(header::CONTENT_TYPE, blob.content_type)], blob.data).into_response())
}
