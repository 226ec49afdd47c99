//! reviewdesk server binary
//!
//! Starts the review API and live notification endpoint.

use anyhow::Context;
use reviewdesk_server::{config::ServerConfig, start_server};
use std::env;
use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut config = if args.len() > 2 && args[1] == "--config" {
        let config_path = &args[2];
        ServerConfig::from_file(config_path)
            .with_context(|| format!("loading {}", config_path))?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        eprintln!("Warning: No config file specified, using defaults");
        eprintln!("Usage: reviewdesk-server --config <path-to-config.toml>");
        eprintln!();
        ServerConfig::default()
    };

    config
        .apply_env_overrides()
        .context("applying environment overrides")?;

    start_server(config).await?;

    Ok(())
}

fn print_help() {
    println!("reviewdesk server - Review API and live notifications");
    println!();
    println!("USAGE:");
    println!("    reviewdesk-server --config <path-to-config.toml>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("CONFIGURATION:");
    println!("    The TOML config file may contain:");
    println!("    - bind_address: IP address to bind (default: '127.0.0.1')");
    println!("    - bind_port: Port number (default: 8000)");
    println!("    - database_path: SQLite file (default: 'reviewdesk.db')");
    println!("    - log_level: Tracing filter when RUST_LOG is unset (default: 'info')");
    println!("    - [hub] heartbeat_interval_secs, stale_after_intervals, client_buffer_size");
    println!();
    println!("ENVIRONMENT:");
    println!("    REVIEWDESK_BIND_ADDRESS, REVIEWDESK_BIND_PORT, REVIEWDESK_DATABASE_PATH,");
    println!("    REVIEWDESK_HEARTBEAT_INTERVAL_SECS, REVIEWDESK_CLIENT_BUFFER_SIZE,");
    println!("    REVIEWDESK_LOG_LEVEL override the file");
    println!();
}
