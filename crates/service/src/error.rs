use thiserror::Error;

use carelog_store::StoreError;

/// Errors surfaced by record operations.
///
/// The taxonomy maps one-to-one onto HTTP statuses at the API layer:
/// validation errors are user-correctable (400), the not-found variants are
/// 404, and storage/persistence failures are 500s whose detail is logged
/// but never sent to the caller.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or empty required input. The message is safe to surface.
    #[error("{0}")]
    Validation(String),

    /// The referenced record id does not exist.
    #[error("record not found")]
    RecordNotFound,

    /// No object is stored under the requested blob key.
    #[error("blob not found")]
    BlobNotFound,

    /// The blob store call failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The document store call failed.
    #[error("database error: {0}")]
    Persistence(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        Self::Persistence(err.to_string())
    }
}
