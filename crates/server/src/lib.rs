//! HTTP API server for the Carelog GP multimedia portal.
//!
//! Routes multipart uploads and record lifecycle calls to
//! [`RecordService`](carelog_service::RecordService), mapping the service's
//! error taxonomy onto HTTP statuses. Backends (document store, blob store,
//! webhook endpoints) are chosen from TOML configuration via the factory
//! modules.

pub mod api;
pub mod blob_factory;
pub mod config;
pub mod error;
pub mod store_factory;
