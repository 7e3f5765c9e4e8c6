use carelog_core::Record;

use super::schemas::{
    DeleteResponse, ErrorResponse, HealthResponse, RecordListResponse, SearchResponse,
    UpdateRecordRequest, UploadForm, UploadResponse,
};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Carelog Portal API",
        version = "0.1.0",
        description = "HTTP API for the Carelog GP multimedia portal. Upload patient files, manage their metadata records, and search patients.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Upload", description = "Patient file upload"),
        (name = "Records", description = "Record lifecycle: read, merge-update, delete"),
        (name = "Search", description = "Patient id search"),
        (name = "Media", description = "Stored payload download")
    ),
    paths(
        super::health::health,
        super::upload::upload,
        super::records::list_records,
        super::records::get_record,
        super::records::update_record,
        super::records::delete_record,
        super::search::search_patients,
        super::media::media,
    ),
    components(schemas(
        Record,
        HealthResponse,
        UploadForm, UploadResponse,
        RecordListResponse, UpdateRecordRequest, DeleteResponse,
        SearchResponse,
        ErrorResponse,
    ))
)]
pub struct ApiDoc;
