use std::sync::Arc;

use carelog_store::RecordStore;
#[cfg(feature = "dynamodb")]
use carelog_store_dynamodb::{DynamoConfig, DynamoRecordStore};
use carelog_store_memory::MemoryRecordStore;

use crate::config::StoreConfig;
use crate::error::ServerError;

/// Construct a [`RecordStore`] from configuration.
pub async fn create_record_store(
    config: &StoreConfig,
) -> Result<Arc<dyn RecordStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryRecordStore::new())),
        #[cfg(feature = "dynamodb")]
        "dynamodb" => create_dynamodb(config).await,
        other => Err(ServerError::Config(format!(
            "unsupported store backend: {other} (is the feature enabled?)"
        ))),
    }
}

#[cfg(feature = "dynamodb")]
async fn create_dynamodb(config: &StoreConfig) -> Result<Arc<dyn RecordStore>, ServerError> {
    let mut dynamo_config = DynamoConfig::default();
    if let Some(region) = &config.region {
        dynamo_config.region.clone_from(region);
    }
    if let Some(table_name) = &config.table_name {
        dynamo_config.table_name.clone_from(table_name);
    }
    dynamo_config.endpoint_url.clone_from(&config.endpoint_url);

    Ok(Arc::new(DynamoRecordStore::new(&dynamo_config).await))
}
