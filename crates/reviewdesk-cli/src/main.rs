//! reviewdesk CLI - review extracted records from the command line.

use anyhow::Context;
use clap::Parser;
use reviewdesk_cli::commands;
use reviewdesk_cli::{Cli, Command, Config, Formatter};
use reviewdesk_client::ReviewApiClient;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("reviewdesk_client=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::path()?,
    };
    let mut config = Config::load_from(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    if let Some(profile_name) = cli.profile {
        config.switch_profile(profile_name)?;
    }

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let client = api_client(&config);
    let page_size = config.settings.page_size;

    match cli.command {
        Command::Profile(args) => {
            commands::execute_profile(args, &mut config, &config_path, &formatter)?
        }
        Command::List(args) => {
            commands::execute_list(args, page_size, &client?, &formatter).await?
        }
        Command::Stats => commands::execute_stats(&client?, &formatter).await?,
        Command::Show { id } => commands::execute_show(id, &client?, &formatter).await?,
        Command::Approve(args) => commands::execute_approve(args, &client?, &formatter).await?,
        Command::Reject(args) => commands::execute_reject(args, &client?, &formatter).await?,
        Command::Edit(args) => commands::execute_edit(args, &client?, &formatter).await?,
        Command::Export(args) => commands::execute_export(args, &client?, &formatter).await?,
        Command::Watch(args) => {
            commands::execute_watch(args, &config.live, &client?, &formatter).await?
        }
    }

    Ok(())
}

/// REST client for the active profile.
fn api_client(config: &Config) -> reviewdesk_cli::Result<ReviewApiClient> {
    let profile = config.get_active_profile()?;
    let client = ReviewApiClient::new(&profile.server_url);
    Ok(match &profile.reviewer {
        Some(reviewer) => client.with_reviewer(reviewer.clone()),
        None => client,
    })
}
