//! Watch command implementation.

use crate::cli::WatchArgs;
use crate::error::Result;
use crate::output::Formatter;
use reviewdesk_client::{
    ClientConfig, ConnectionManager, ConnectionState, RecordCache, ReviewApiClient, WsConnector,
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Execute the watch command.
///
/// Streams notifications until Ctrl-C, or until reconnecting gives up.
/// `--max-reconnects` overrides the `[live]` config section.
pub async fn execute_watch(
    args: WatchArgs,
    live: &ClientConfig,
    client: &ReviewApiClient,
    formatter: &Formatter,
) -> Result<()> {
    let mut config = live.clone();
    if let Some(max) = args.max_reconnects {
        config.max_reconnect_attempts = max;
    }

    let connector = Arc::new(WsConnector::new(client.notifications_url()));
    let mut manager = ConnectionManager::new(config, connector);
    let mut events = manager.events();
    let mut refetch = manager.refetch_signal();
    let mut state = manager.watch_state();
    let mut cache = RecordCache::default();

    if args.stats {
        cache.refresh(client).await?;
        if let Some(stats) = cache.stats() {
            println!("{}", formatter.info(&formatter.stats_line(stats)));
        }
    }

    println!(
        "{}",
        formatter.info(&format!("Watching {} (Ctrl-C to stop)", client.base_url()))
    );
    manager.connect();

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => println!("{}", formatter.format_event(&event)?),
                Err(RecvError::Lagged(missed)) => {
                    println!("{}", formatter.warning(&format!("Missed {} notification(s)", missed)));
                }
                Err(RecvError::Closed) => break,
            },
            changed = refetch.changed() => {
                if changed.is_err() {
                    break;
                }
                if args.stats {
                    cache.invalidate();
                    match cache.refresh_if_stale(client).await {
                        Ok(_) => {
                            if let Some(stats) = cache.stats() {
                                println!("{}", formatter.info(&formatter.stats_line(stats)));
                            }
                        }
                        Err(e) => tracing::warn!("Stats refresh failed: {}", e),
                    }
                }
            },
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                match current {
                    ConnectionState::Connected => println!("{}", formatter.success("Connected")),
                    ConnectionState::Disconnected => println!("{}", formatter.warning("Disconnected")),
                    ConnectionState::Connecting => {}
                }
            },
            _ = manager.wait() => {
                if manager.gave_up() {
                    println!(
                        "{}",
                        formatter.error("Live notifications unavailable; use `reviewdesk list` to refresh")
                    );
                }
                break;
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    manager.disconnect().await;
    Ok(())
}
