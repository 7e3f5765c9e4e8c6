//! Upload orchestration and record lifecycle.
//!
//! [`RecordService`] is what the HTTP layer calls into: it composes the
//! blob store, the record store, and the workflow notifier to realize
//! upload, read, update-merge, delete, and patient search as single logical
//! operations with the portal's partial-failure policy.

pub mod error;
pub mod service;

pub use error::ServiceError;
pub use service::{RecordService, UpdateRequest, UploadRequest, UploadedFile};
