//! Blob addressing and storage.
//!
//! Uploaded payloads are stored externally under a derived key
//! (`{patientId}/{uuid}.{ext}`, see [`key::derive_blob_key`]) through the
//! [`BlobStore`] trait. Two backends ship here: an S3 implementation for the
//! managed object store and an in-memory one for tests and local
//! development.

pub mod error;
pub mod key;
pub mod memory;
pub mod s3;
pub mod store;

pub use error::BlobError;
pub use key::{derive_blob_key, file_extension};
pub use memory::MemoryBlobStore;
pub use s3::{S3BlobConfig, S3BlobStore};
pub use store::{BlobStore, StoredBlob};
