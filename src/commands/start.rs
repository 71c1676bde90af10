//! `monitorctl start` — start the agent and health-gate it.

use anyhow::Result;
use clap::Args;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::ports::ConfigStore as _;
use crate::cli::ToggleArg;
use crate::commands::{resume_if_saved, sync_state_file};

/// Arguments for the start command.
#[derive(Args, Default)]
pub struct StartArgs {
    /// Telegram alerting for this start (defaults to the persisted flag)
    #[arg(long, value_enum)]
    pub telegram: Option<ToggleArg>,
}

/// Run `monitorctl start`.
///
/// # Errors
///
/// Returns an error if the supervisor state cannot be accessed.
pub async fn run(args: &StartArgs, app: &AppContext) -> Result<ExitCode> {
    let controller = app.controller();
    resume_if_saved(app, &controller).await;

    // A plain `start` never silently flips the feature.
    let telegram_enabled = match args.telegram {
        Some(flag) => flag.as_bool(),
        None => app.config_store.load().telegram.enabled,
    };

    let reporter = app.terminal_reporter();
    let outcome = controller.start(telegram_enabled, &reporter).await;
    sync_state_file(app, &controller).await;

    if outcome.ok {
        app.output.success(&outcome.message);
        app.output.kv(
            "Telegram",
            if telegram_enabled { "on" } else { "off" },
        );
        app.output.kv("Status", "monitorctl status");
        Ok(ExitCode::SUCCESS)
    } else {
        app.output.error(&outcome.message);
        Ok(ExitCode::FAILURE)
    }
}
