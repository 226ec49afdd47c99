//! reviewdesk Server
//!
//! HTTP API for the review workflow plus the `/ws/notifications` live
//! notification stream. Record mutations go through the workflow service,
//! which publishes into the same hub the WebSocket connections subscribe to.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod ws;

use config::ServerConfig;
use handlers::{create_router, AppState};
use reviewdesk_hub::{HeartbeatReaper, NotificationHub};
use reviewdesk_store::{SqliteStore, StoreError};
use reviewdesk_workflow::ReviewService;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Database could not be opened
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `log_level`. Calling this twice is harmless.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Open the store and wire the workflow service to a fresh hub
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let store = SqliteStore::new(&config.database_path)?;
    let hub = NotificationHub::new(config.hub.clone());
    let service = ReviewService::new(store, Arc::new(hub.clone()));
    Ok(AppState { service, hub })
}

/// Start the HTTP server
///
/// Runs the heartbeat reaper alongside the server and stops both on Ctrl-C.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    init_tracing(&config.log_level);

    info!("Starting reviewdesk server");
    info!("Bind address: {}", config.bind_addr());
    info!("Database: {}", config.database_path);
    info!(
        "Heartbeat interval: {}s, client buffer: {}",
        config.hub.heartbeat_interval_secs, config.hub.client_buffer_size
    );

    let state = build_state(&config)?;

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut reaper = HeartbeatReaper::new(state.hub.clone());
    let reaper_handle = tokio::spawn(async move {
        reaper
            .run_until(async {
                let _ = stop_rx.await;
            })
            .await;
    });

    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()));

    let _ = stop_tx.send(());
    let _ = reaper_handle.await;
    info!("Server stopped");

    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_state_in_memory() {
        let config = ServerConfig::default_test_config();
        let state = build_state(&config).unwrap();
        assert_eq!(state.hub.connection_count(), 0);
        assert_eq!(state.service.stats().unwrap().total, 0);
    }

    #[test]
    fn test_build_state_bad_path() {
        let config = ServerConfig {
            database_path: "/nonexistent-dir/for/sure/records.db".to_string(),
            ..ServerConfig::default_test_config()
        };
        assert!(matches!(build_state(&config), Err(ServerError::Store(_))));
    }

    #[test]
    fn test_records_survive_restart() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ServerConfig {
            database_path: dir.path().join("records.db").display().to_string(),
            ..ServerConfig::default_test_config()
        };

        let state = build_state(&config).unwrap();
        state
            .service
            .create_record(
                reviewdesk_domain::SourceDocument {
                    source_file: "form.html".to_string(),
                    record_type: reviewdesk_domain::RecordType::Form,
                },
                serde_json::Map::new(),
                0.5,
            )
            .unwrap();
        drop(state);

        let reopened = build_state(&config).unwrap();
        assert_eq!(reopened.service.stats().unwrap().total, 1);
    }
}
