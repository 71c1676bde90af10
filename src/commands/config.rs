//! `monitorctl config` — inspect the agent configuration.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::ports::ConfigStore as _;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (defaults filled in)
    Show,
    /// Print the configuration file path
    Path,
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized.
pub fn run(cmd: &ConfigCommand, app: &AppContext) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => {
            let config = app.config_store.load();
            if app.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&config).context("serializing config")?
                );
            } else {
                app.output
                    .kv("Config", &app.config_store.path().display().to_string());
                print!(
                    "{}",
                    serde_yaml::to_string(&config).context("serializing config")?
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", app.config_store.path().display());
        }
    }
    Ok(ExitCode::SUCCESS)
}
