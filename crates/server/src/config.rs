use serde::Deserialize;

/// Top-level configuration for the Carelog server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct CarelogConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Record store backend configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Blob store backend configuration.
    #[serde(default)]
    pub blob: BlobConfig,
    /// Workflow webhook endpoints.
    #[serde(default)]
    pub webhooks: WebhooksConfig,
}

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8000
}

/// Configuration for the record store backend.
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Which backend to use: `"memory"` or `"dynamodb"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// AWS region for the `DynamoDB` backend.
    pub region: Option<String>,

    /// `DynamoDB` table name.
    pub table_name: Option<String>,

    /// Endpoint URL override for local development (e.g. `DynamoDB` Local).
    pub endpoint_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            region: None,
            table_name: None,
            endpoint_url: None,
        }
    }
}

/// Configuration for the blob store backend.
#[derive(Debug, Deserialize)]
pub struct BlobConfig {
    /// Which backend to use: `"memory"` or `"s3"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// AWS region for the S3 backend.
    pub region: Option<String>,

    /// Bucket holding uploaded payloads.
    pub bucket: Option<String>,

    /// Endpoint URL override for local development (e.g. `LocalStack`).
    pub endpoint_url: Option<String>,

    /// Base URL used when composing object locators (e.g. a CDN).
    pub public_url: Option<String>,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            region: None,
            bucket: None,
            endpoint_url: None,
            public_url: None,
        }
    }
}

fn default_backend() -> String {
    "memory".to_owned()
}

/// Workflow webhook endpoints. Unset URLs disable the notification.
#[derive(Debug, Default, Deserialize)]
pub struct WebhooksConfig {
    /// Endpoint for the upload event.
    pub upload_url: Option<String>,

    /// Endpoint for the analysis event.
    pub analysis_url: Option<String>,

    /// Endpoint for the review event.
    pub review_url: Option<String>,

    /// Endpoint for the audit event.
    pub audit_url: Option<String>,

    /// Per-request timeout in seconds. Defaults to 5.
    pub timeout_seconds: Option<u64>,
}
