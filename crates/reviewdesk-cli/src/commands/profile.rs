//! Profile command implementation.

use crate::cli::{ProfileAction, ProfileArgs};
use crate::config::{Config, Profile};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Execute the profile command; changes are saved to `config_path`.
pub fn execute_profile(
    args: ProfileArgs,
    config: &mut Config,
    config_path: &Path,
    formatter: &Formatter,
) -> Result<()> {
    let changed = match args.action {
        ProfileAction::List => {
            list_profiles(config, formatter);
            false
        }
        ProfileAction::Show => {
            show_active_profile(config, formatter)?;
            false
        }
        ProfileAction::Switch { name } => {
            config.switch_profile(name.clone())?;
            println!(
                "{}",
                formatter.success(&format!("Switched to profile '{}'", name))
            );
            true
        }
        ProfileAction::Set {
            name,
            url,
            reviewer,
        } => {
            set_profile(config, name, url, reviewer, formatter);
            true
        }
        ProfileAction::Delete { name } => delete_profile(config, &name, formatter)?,
    };

    if changed {
        config.save_to(config_path)?;
    }
    Ok(())
}

/// List all profiles.
fn list_profiles(config: &Config, formatter: &Formatter) {
    if config.profiles.is_empty() {
        println!("{}", formatter.info("No profiles configured"));
        return;
    }

    println!("Available profiles:");
    for (name, profile) in &config.profiles {
        if name == &config.active_profile {
            println!("* {}", formatter.success(name));
        } else {
            println!("  {}", name);
        }
        println!("    URL: {}", profile.server_url);
        if let Some(reviewer) = &profile.reviewer {
            println!("    Reviewer: {}", reviewer);
        }
    }
}

/// Show the active profile.
fn show_active_profile(config: &Config, formatter: &Formatter) -> Result<()> {
    let profile = config.get_active_profile()?;

    println!("Active profile: {}", formatter.success(&config.active_profile));
    println!("  URL: {}", profile.server_url);
    println!(
        "  Reviewer: {}",
        profile.reviewer.as_deref().unwrap_or("(anonymous)")
    );

    Ok(())
}

/// Create or update a profile.
fn set_profile(
    config: &mut Config,
    name: String,
    url: String,
    reviewer: Option<String>,
    formatter: &Formatter,
) {
    let action = if config.profiles.contains_key(&name) {
        "Updated"
    } else {
        "Created"
    };

    config.set_profile(
        name.clone(),
        Profile {
            server_url: url.trim_end_matches('/').to_string(),
            reviewer,
        },
    );

    println!(
        "{}",
        formatter.success(&format!("{} profile '{}'", action, name))
    );
}

/// Delete a profile; returns whether anything was removed.
fn delete_profile(config: &mut Config, name: &str, formatter: &Formatter) -> Result<bool> {
    if name == config.active_profile {
        return Err(CliError::NotPermitted(
            "Cannot delete the active profile".to_string(),
        ));
    }

    if config.profiles.remove(name).is_some() {
        println!(
            "{}",
            formatter.success(&format!("Deleted profile '{}'", name))
        );
        Ok(true)
    } else {
        println!(
            "{}",
            formatter.warning(&format!("Profile '{}' does not exist", name))
        );
        Ok(false)
    }
}
