//! WADrive webhook gateway.
//!
//! Receives WhatsApp messages from Twilio, backs up their attachments to an
//! S3-compatible bucket and answers chat commands.

mod adapters;
mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use blob_store::S3ObjectStore;
use database::Database;
use messaging::{MessagingClient, SignatureValidator};
use orchestrator::{InMemoryRateLimiter, Orchestrator};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::{WhatsAppDownloader, WhatsAppSender};
use crate::config::Config;
use crate::state::{AppState, Sender};

/// How often expired rate windows are dropped.
const PRUNE_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting WADrive gateway");
    if !config.validate_signatures {
        warn!("Webhook signature validation is disabled");
    }

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Object store and messaging provider
    let store = Arc::new(S3ObjectStore::new(&config.storage)?);
    info!(bucket = %store.bucket_name(), "Object store ready");

    let client = Arc::new(MessagingClient::connect(config.twilio.clone()).await?);

    let rate_limiter = Arc::new(InMemoryRateLimiter::new(config.pipeline.rate_limit_per_hour));
    spawn_pruner(rate_limiter.clone());

    let sender: Sender = Arc::new(WhatsAppSender::new(client.clone()));
    let orchestrator = Orchestrator::new(
        db.clone(),
        store,
        Arc::new(WhatsAppDownloader::new(client)),
        rate_limiter,
        sender,
        &config.pipeline,
    );

    // Build application state
    let signatures = config
        .validate_signatures
        .then(|| SignatureValidator::new(config.twilio.auth_token.clone()));
    let state = AppState::new(orchestrator, signatures, config.public_base_url.clone());

    // Build router
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "Gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    db.close().await;
    Ok(())
}

fn spawn_pruner(limiter: Arc<InMemoryRateLimiter>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = limiter.prune_expired(chrono::Utc::now()).await;
            if removed > 0 {
                tracing::debug!(removed, "Pruned expired rate windows");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
