use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use carelog_core::Record;

use crate::config::WebhookConfig;
use crate::events::{AnalysisEvent, AuditEvent, ReviewEvent, UploadEvent};

/// Errors from building the notifier.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The underlying HTTP client could not be constructed.
    #[error("http client error: {0}")]
    Client(String),
}

/// Posts workflow events to the configured webhook endpoints.
///
/// Every send is dispatched on its own task so it never sits on the request
/// path; the client timeout bounds how long a slow endpoint can hold that
/// task. Failures are logged and discarded.
pub struct WorkflowNotifier {
    client: Client,
    config: WebhookConfig,
}

impl WorkflowNotifier {
    /// Create a new `WorkflowNotifier` with the given endpoint configuration.
    pub fn new(config: WebhookConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Announce a freshly uploaded record to the upload and analysis
    /// endpoints.
    pub fn record_uploaded(&self, record: &Record) {
        self.dispatch(
            "upload",
            self.config.upload_url.as_deref(),
            &UploadEvent {
                record_id: record.id.clone(),
                patient_id: record.patient_id.clone(),
                blob_url: record.blob_url.clone(),
                content_type: record.content_type.clone(),
            },
        );
        self.dispatch(
            "analysis",
            self.config.analysis_url.as_deref(),
            &AnalysisEvent {
                record_id: record.id.clone(),
                patient_id: record.patient_id.clone(),
                blob_url: record.blob_url.clone(),
            },
        );
    }

    /// Announce that a record's status reached `reviewed`.
    pub fn record_reviewed(&self, record: &Record) {
        self.dispatch(
            "review",
            self.config.review_url.as_deref(),
            &ReviewEvent {
                record_id: record.id.clone(),
                patient_id: record.patient_id.clone(),
                status: record.status.clone(),
                updated_at: record.updated_at.unwrap_or(record.created_at),
            },
        );
    }

    /// Announce that a record (and its blob) were deleted.
    pub fn record_deleted(&self, record: &Record, timestamp: i64) {
        self.dispatch(
            "audit",
            self.config.audit_url.as_deref(),
            &AuditEvent {
                record_id: record.id.clone(),
                patient_id: record.patient_id.clone(),
                action: "deleted".to_owned(),
                timestamp,
            },
        );
    }

    /// POST `payload` to `url` on a detached task. No endpoint, no send.
    fn dispatch<T: Serialize>(&self, hook: &'static str, url: Option<&str>, payload: &T) {
        let Some(url) = url else {
            debug!(hook, "no endpoint configured, skipping notification");
            return;
        };

        let url = url.to_owned();
        let client = self.client.clone();
        let body = match serde_json::to_value(payload) {
            Ok(body) => body,
            Err(e) => {
                warn!(hook, error = %e, "failed to serialize notification payload");
                return;
            }
        };

        tokio::spawn(async move {
            match client.post(&url).json(&body).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(hook, url = %url, "notification delivered");
                }
                Ok(response) => {
                    warn!(hook, url = %url, status = %response.status(), "notification endpoint returned failure");
                }
                Err(e) => {
                    warn!(hook, url = %url, error = %e, "notification delivery failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::Json;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use tokio::sync::mpsc;

    use super::*;

    /// Spin up a local endpoint that forwards every received JSON body into
    /// a channel, returning its URL.
    async fn capture_endpoint() -> (String, mpsc::Receiver<serde_json::Value>) {
        let (tx, rx) = mpsc::channel::<serde_json::Value>(8);
        let app = Router::new().route(
            "/hook",
            post(move |Json(body): Json<serde_json::Value>| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(body).await;
                    StatusCode::OK
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/hook"), rx)
    }

    async fn recv_event(rx: &mut mpsc::Receiver<serde_json::Value>) -> serde_json::Value {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("notification should arrive")
            .expect("capture channel should stay open")
    }

    fn sample_record() -> Record {
        Record::new(
            "P004",
            "P004/abc.jpg",
            "memory://P004/abc.jpg",
            Some("scan.jpg".to_owned()),
            Some("image/jpeg".to_owned()),
        )
    }

    #[tokio::test]
    async fn upload_event_is_delivered() {
        let (url, mut rx) = capture_endpoint().await;
        let notifier = WorkflowNotifier::new(WebhookConfig {
            upload_url: Some(url),
            ..WebhookConfig::default()
        })
        .unwrap();

        let record = sample_record();
        notifier.record_uploaded(&record);

        let event = recv_event(&mut rx).await;
        assert_eq!(event["recordId"], record.id.as_str());
        assert_eq!(event["patientId"], "P004");
        assert_eq!(event["blobUrl"], "memory://P004/abc.jpg");
        assert_eq!(event["contentType"], "image/jpeg");
    }

    #[tokio::test]
    async fn analysis_event_is_delivered() {
        let (url, mut rx) = capture_endpoint().await;
        let notifier = WorkflowNotifier::new(WebhookConfig {
            analysis_url: Some(url),
            ..WebhookConfig::default()
        })
        .unwrap();

        let record = sample_record();
        notifier.record_uploaded(&record);

        let event = recv_event(&mut rx).await;
        assert_eq!(event["recordId"], record.id.as_str());
        assert_eq!(event["blobUrl"], "memory://P004/abc.jpg");
        assert!(event.get("contentType").is_none(), "analysis event carries no content type");
    }

    #[tokio::test]
    async fn review_event_is_delivered() {
        let (url, mut rx) = capture_endpoint().await;
        let notifier = WorkflowNotifier::new(WebhookConfig {
            review_url: Some(url),
            ..WebhookConfig::default()
        })
        .unwrap();

        let mut record = sample_record();
        record.status = "reviewed".to_owned();
        record.updated_at = Some(record.created_at + 60);
        notifier.record_reviewed(&record);

        let event = recv_event(&mut rx).await;
        assert_eq!(event["recordId"], record.id.as_str());
        assert_eq!(event["status"], "reviewed");
        assert_eq!(event["updatedAt"], record.created_at + 60);
    }

    #[tokio::test]
    async fn audit_event_is_delivered() {
        let (url, mut rx) = capture_endpoint().await;
        let notifier = WorkflowNotifier::new(WebhookConfig {
            audit_url: Some(url),
            ..WebhookConfig::default()
        })
        .unwrap();

        let record = sample_record();
        notifier.record_deleted(&record, 1_754_000_123);

        let event = recv_event(&mut rx).await;
        assert_eq!(event["action"], "deleted");
        assert_eq!(event["timestamp"], 1_754_000_123);
    }

    #[tokio::test]
    async fn unconfigured_endpoints_are_skipped() {
        let notifier = WorkflowNotifier::new(WebhookConfig::default()).unwrap();
        let record = sample_record();

        // Nothing configured: every call is a silent no-op.
        notifier.record_uploaded(&record);
        notifier.record_reviewed(&record);
        notifier.record_deleted(&record, 0);
    }

    #[tokio::test]
    async fn unreachable_endpoint_never_propagates() {
        // Port 1 refuses connections; the spawned send fails and is logged.
        let notifier = WorkflowNotifier::new(WebhookConfig {
            upload_url: Some("http://127.0.0.1:1/hook".to_owned()),
            timeout: Duration::from_millis(200),
            ..WebhookConfig::default()
        })
        .unwrap();

        notifier.record_uploaded(&sample_record());
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
}
