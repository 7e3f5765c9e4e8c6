//! Core domain types for the Carelog portal.
//!
//! The single domain entity is the [`Record`]: the metadata document that
//! ties an uploaded file in blob storage to a patient. [`RecordPatch`]
//! carries the partial-merge update applied to a record in place.

pub mod record;

pub use record::{Record, RecordPatch, STATUS_PENDING, STATUS_REVIEWED};
