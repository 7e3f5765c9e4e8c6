use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::error::ServerError;

use super::AppState;
use super::schemas::{ErrorResponse, SearchResponse};

/// Query string for patient search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Substring to match against patient ids, case-insensitively.
    #[serde(default)]
    pub query: Option<String>,
}

/// `GET /search/patients?query=...` -- patient id autocomplete.
#[utoipa::path(
    get,
    path = "/search/patients",
    tag = "Search",
    summary = "Search patient ids",
    description = "Case-insensitive substring match over known patient ids; distinct results, truncated to 10.",
    params(("query" = String, Query, description = "Substring to search for")),
    responses(
        (status = 200, description = "Matching patient ids", body = SearchResponse),
        (status = 400, description = "Missing query", body = ErrorResponse),
        (status = 500, description = "Database failure", body = ErrorResponse)
    )
)]
pub async fn search_patients(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let needle = query.query.unwrap_or_default();
    let results = state.service.search_patients(&needle).await?;

    Ok(Json(SearchResponse { results }))
}
