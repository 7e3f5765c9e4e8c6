pub mod health;
pub mod media;
pub mod openapi;
pub mod records;
pub mod schemas;
pub mod search;
pub mod upload;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use carelog_service::RecordService;

use self::openapi::ApiDoc;

/// Largest accepted upload body. Keeps a runaway client from holding the
/// whole payload in memory.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The record service the HTTP layer fronts.
    pub service: Arc<RecordService>,
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health))
        // Upload (Patient Portal)
        .route("/upload", post(upload::upload))
        // Record lifecycle (Patient Portal + GP Dashboard)
        .route("/records", get(records::list_records))
        .route(
            "/record/{id}",
            get(records::get_record)
                .put(records::update_record)
                .delete(records::delete_record),
        )
        // Patient search (autocomplete)
        .route("/search/patients", get(search::search_patients))
        // Media proxy (image preview)
        .route("/media/{*key}", get(media::media))
        .with_state(state)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
