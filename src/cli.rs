//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Lifecycle controller for the monitord monitoring agent
#[derive(Parser)]
#[command(
    name = "monitorctl",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Path to the agent configuration file
    #[arg(long, global = true, env = "MONITORD_CONFIG", default_value = "./config.yaml")]
    pub config: PathBuf,

    /// Path to the agent executable
    #[arg(long, global = true, env = "MONITORD_BIN", default_value = "monitord")]
    pub binary: PathBuf,

    /// Fall back to `cargo run` when the executable is missing
    #[arg(long, global = true)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// On/off argument for the Telegram flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToggleArg {
    On,
    Off,
}

impl ToggleArg {
    #[must_use]
    pub fn as_bool(self) -> bool {
        matches!(self, Self::On)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the agent and wait for it to become healthy
    Start(commands::start::StartArgs),

    /// Stop the agent (graceful, then forceful)
    Stop,

    /// Show agent status
    Status,

    /// Toggle Telegram alerting, rolling back if the new config fails
    Telegram {
        /// Desired state
        #[arg(value_enum)]
        state: ToggleArg,
    },

    /// Inspect the agent configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the application context cannot be constructed.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            config,
            binary,
            dev,
            command,
        } = self;

        if let Command::Version = command {
            commands::version::run(json);
            return Ok(ExitCode::SUCCESS);
        }

        let app = AppContext::new(AppFlags {
            json,
            quiet,
            no_color,
            config,
            binary,
            dev,
        })?;

        match command {
            Command::Start(args) => commands::start::run(&args, &app).await,
            Command::Stop => commands::stop::run(&app).await,
            Command::Status => commands::status::run(&app).await,
            Command::Telegram { state } => commands::telegram::run(state, &app).await,
            Command::Config(cmd) => commands::config::run(&cmd, &app),
            Command::Version => unreachable!("handled above"),
        }
    }
}
