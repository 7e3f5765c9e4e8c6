//! In-memory record store backend.
//!
//! Backs the portal in tests and local development; also serves as the
//! reference implementation of the [`RecordStore`](carelog_store::RecordStore)
//! contract.

pub mod store;

pub use store::MemoryRecordStore;
