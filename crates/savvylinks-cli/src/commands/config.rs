//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use savvylinks_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
///
/// The token itself is never printed, only whether one is set.
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    let token_state = if config.token_or_empty().trim().is_empty() {
        "(not set)"
    } else {
        "(set)"
    };

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "token_set": token_state == "(set)",
                    "api_url": config.api_url,
                    "link_base_url": config.link_base_url,
                    "refresh_interval_secs": config.refresh_interval_secs,
                    "request_timeout_secs": config.request_timeout_secs,
                    "min_match_score": config.min_match_score,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.api_url);
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  token:                 {}", token_state);
            println!("  api_url:               {}", config.api_url);
            println!("  link_base_url:         {}", config.link_base_url);
            println!("  refresh_interval_secs: {}", config.refresh_interval_secs);
            println!("  request_timeout_secs:  {}", config.request_timeout_secs);
            println!("  min_match_score:       {}", config.min_match_score);
            println!(
                "  log_file:              {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match key.as_str() {
        "token" => {
            config.token = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.clone())
            };
        }
        "api_url" => {
            config.api_url = value.clone();
        }
        "link_base_url" => {
            config.link_base_url = value.clone();
        }
        "refresh_interval_secs" => {
            config.refresh_interval_secs = value
                .parse()
                .context("Invalid value for refresh_interval_secs. Use a number of seconds.")?;
        }
        "request_timeout_secs" => {
            config.request_timeout_secs = value
                .parse()
                .context("Invalid value for request_timeout_secs. Use a number of seconds.")?;
        }
        "min_match_score" => {
            config.min_match_score = value
                .parse()
                .context("Invalid value for min_match_score. Use an integer.")?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.clone().into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: token, api_url, link_base_url, refresh_interval_secs, \
                 request_timeout_secs, min_match_score, log_file",
                key
            );
        }
    }

    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    // Don't echo secrets
    let shown = if key == "token" { "********" } else { value.as_str() };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}
