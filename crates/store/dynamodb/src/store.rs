use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use tracing::debug;

use carelog_core::{Record, RecordPatch};
use carelog_store::error::StoreError;
use carelog_store::store::RecordStore;

use crate::config::DynamoConfig;

/// `DynamoDB`-backed implementation of [`RecordStore`].
///
/// Uses a single table with composite primary key (`patientId`, `id`). The
/// full record is stored as JSON in the `doc` attribute; `patientIdLower`
/// supports case-insensitive patient search and `ts` carries the
/// modification time (epoch milliseconds), rewritten on every create and
/// update, which `list_by_patient` orders on. `DynamoDB` exposes no internal
/// modification timestamp of its own.
pub struct DynamoRecordStore {
    client: Client,
    table_name: String,
}

impl DynamoRecordStore {
    /// Create a new `DynamoRecordStore` from the provided configuration.
    ///
    /// Loads AWS credentials and configuration from the environment and
    /// optionally overrides the endpoint URL for local development.
    pub async fn new(config: &DynamoConfig) -> Self {
        let client = build_client(config).await;
        Self {
            client,
            table_name: config.table_name.clone(),
        }
    }

    /// Create a new `DynamoRecordStore` from an existing `DynamoDB` client.
    pub fn from_client(client: Client, config: &DynamoConfig) -> Self {
        Self {
            client,
            table_name: config.table_name.clone(),
        }
    }

    /// Current modification timestamp, epoch milliseconds.
    fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Write the full document back as a single item, stamping `ts`.
    async fn put_document(&self, record: &Record) -> Result<(), StoreError> {
        let doc = serde_json::to_string(record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .item("patientId", AttributeValue::S(record.patient_id.clone()))
            .item("id", AttributeValue::S(record.id.clone()))
            .item(
                "patientIdLower",
                AttributeValue::S(record.patient_id.to_lowercase()),
            )
            .item("doc", AttributeValue::S(doc))
            .item("ts", AttributeValue::N(Self::now_millis().to_string()))
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(())
    }
}

/// Parse the `doc` attribute of an item back into a [`Record`].
fn parse_document(item: &HashMap<String, AttributeValue>) -> Result<Record, StoreError> {
    let Some(AttributeValue::S(doc)) = item.get("doc") else {
        return Err(StoreError::Backend(
            "item is missing the doc attribute".to_owned(),
        ));
    };
    serde_json::from_str(doc).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Parse the `ts` attribute of an item, defaulting to 0 when absent.
fn parse_ts(item: &HashMap<String, AttributeValue>) -> i64 {
    match item.get("ts") {
        Some(AttributeValue::N(n)) => n.parse().unwrap_or(0),
        _ => 0,
    }
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn create(&self, record: &Record) -> Result<(), StoreError> {
        debug!(record_id = %record.id, patient_id = %record.patient_id, "creating record document");
        self.put_document(record).await
    }

    async fn list_by_patient(
        &self,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        let mut items: Vec<(i64, Record)> = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let mut query = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("patientId = :p")
                .expression_attribute_values(":p", AttributeValue::S(patient_id.to_owned()));

            if let Some(key) = exclusive_start_key {
                query = query.set_exclusive_start_key(Some(key));
            }

            let response = query
                .send()
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;

            for item in response.items() {
                items.push((parse_ts(item), parse_document(item)?));
            }

            exclusive_start_key = response.last_evaluated_key().cloned();
            if exclusive_start_key.is_none() {
                break;
            }
        }

        // Most-recent-first on the modification timestamp; truncated here
        // rather than in the query, matching the contract.
        items.sort_by(|a, b| b.0.cmp(&a.0));
        items.truncate(limit);

        Ok(items.into_iter().map(|(_, record)| record).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Record>, StoreError> {
        // The id alone carries no partition key, so this is a full
        // cross-partition scan. First match wins.
        let mut exclusive_start_key = None;

        loop {
            let mut scan = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression("#id = :id")
                .expression_attribute_names("#id", "id")
                .expression_attribute_values(":id", AttributeValue::S(id.to_owned()));

            if let Some(key) = exclusive_start_key {
                scan = scan.set_exclusive_start_key(Some(key));
            }

            let response = scan
                .send()
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;

            if let Some(item) = response.items().first() {
                return Ok(Some(parse_document(item)?));
            }

            exclusive_start_key = response.last_evaluated_key().cloned();
            if exclusive_start_key.is_none() {
                break;
            }
        }

        Ok(None)
    }

    async fn update(&self, id: &str, patch: &RecordPatch) -> Result<Option<Record>, StoreError> {
        // Read-modify-write without a condition expression: the last full
        // put wins when two updates to the same id race.
        let Some(mut current) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        current.apply_patch(patch);
        self.put_document(&current).await?;

        debug!(record_id = %id, "record document updated");
        Ok(Some(current))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        // Look the record up first to learn its partition key.
        let Some(record) = self.get_by_id(id).await? else {
            return Ok(false);
        };

        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("patientId", AttributeValue::S(record.patient_id.clone()))
            .key("id", AttributeValue::S(record.id.clone()))
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        debug!(record_id = %id, patient_id = %record.patient_id, "record document deleted");
        Ok(true)
    }

    async fn search_patient_ids(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        let needle = query.to_lowercase();

        let mut matches: BTreeSet<String> = BTreeSet::new();
        let mut exclusive_start_key = None;

        loop {
            let mut scan = self
                .client
                .scan()
                .table_name(&self.table_name)
                .projection_expression("patientId")
                .filter_expression("contains(patientIdLower, :needle)")
                .expression_attribute_values(":needle", AttributeValue::S(needle.clone()));

            if let Some(key) = exclusive_start_key {
                scan = scan.set_exclusive_start_key(Some(key));
            }

            let response = scan
                .send()
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;

            for item in response.items() {
                if let Some(AttributeValue::S(patient_id)) = item.get("patientId") {
                    matches.insert(patient_id.clone());
                }
            }

            exclusive_start_key = response.last_evaluated_key().cloned();
            if exclusive_start_key.is_none() {
                break;
            }
        }

        Ok(matches.into_iter().take(limit).collect())
    }
}

/// Build an AWS `DynamoDB` [`Client`] from the provided configuration.
///
/// Uses the standard AWS SDK environment credential chain and optionally
/// overrides the endpoint URL for local development.
pub async fn build_client(config: &DynamoConfig) -> Client {
    let mut aws_config =
        aws_config::from_env().region(aws_config::Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint_url {
        aws_config = aws_config.endpoint_url(endpoint);
    }

    let sdk_config = aws_config.load().await;
    Client::new(&sdk_config)
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;
    use crate::table::create_table;

    fn test_config() -> DynamoConfig {
        DynamoConfig {
            table_name: std::env::var("DYNAMODB_TABLE")
                .unwrap_or_else(|_| "carelog_records_test".to_owned()),
            endpoint_url: Some(
                std::env::var("DYNAMODB_ENDPOINT")
                    .unwrap_or_else(|_| "http://localhost:8000".to_owned()),
            ),
            ..DynamoConfig::default()
        }
    }

    #[tokio::test]
    async fn store_conformance() {
        let config = test_config();
        let store = DynamoRecordStore::new(&config).await;
        create_table(&store.client, &store.table_name)
            .await
            .expect("table creation should succeed");
        carelog_store::testing::run_store_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
    }
}
