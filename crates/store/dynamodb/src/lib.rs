//! `DynamoDB` record store backend.
//!
//! Stores each record as a single item in one table with a composite
//! primary key: `patientId` (partition) and `id` (sort). The full document
//! is carried in a JSON attribute, so the item layout never constrains the
//! document shape.

mod config;
mod store;
mod table;

pub use config::DynamoConfig;
pub use store::{DynamoRecordStore, build_client};
pub use table::create_table;
