use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use carelog_notify::{WebhookConfig, WorkflowNotifier};
use carelog_server::api::{self, AppState};
use carelog_server::config::CarelogConfig;
use carelog_service::RecordService;

/// Carelog portal HTTP server.
#[derive(Parser, Debug)]
#[command(name = "carelog-server", about = "HTTP API server for the Carelog portal")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "carelog.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber from RUST_LOG or default to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config: CarelogConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        info!(
            path = %cli.config,
            "config file not found, using defaults"
        );
        CarelogConfig::default()
    };

    // Create the backends.
    let store = carelog_server::store_factory::create_record_store(&config.store).await?;
    info!(backend = %config.store.backend, "record store initialized");

    let blobs = carelog_server::blob_factory::create_blob_store(&config.blob).await?;
    info!(backend = %config.blob.backend, "blob store initialized");

    // Build the workflow notifier from the configured webhook endpoints.
    let mut webhook_config = WebhookConfig {
        upload_url: config.webhooks.upload_url.clone(),
        analysis_url: config.webhooks.analysis_url.clone(),
        review_url: config.webhooks.review_url.clone(),
        audit_url: config.webhooks.audit_url.clone(),
        ..WebhookConfig::default()
    };
    if let Some(secs) = config.webhooks.timeout_seconds {
        webhook_config.timeout = Duration::from_secs(secs);
    }
    let notifier = Arc::new(WorkflowNotifier::new(webhook_config)?);

    let service = Arc::new(RecordService::new(store, blobs, notifier));
    let app = api::router(AppState { service });

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "carelog-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("carelog-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
