//! Fire-and-forget workflow notifications.
//!
//! Record transitions (upload, review, delete) are announced to external
//! workflow endpoints as JSON webhooks. Delivery is best-effort: each send
//! runs on its own task with a bounded timeout, failures are logged at
//! warning level and never surface to the caller, and an unconfigured
//! endpoint means the notification is skipped entirely.

pub mod config;
pub mod events;
pub mod notifier;

pub use config::WebhookConfig;
pub use events::{AnalysisEvent, AuditEvent, ReviewEvent, UploadEvent};
pub use notifier::{NotifyError, WorkflowNotifier};
