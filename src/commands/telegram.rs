//! `monitorctl telegram` — toggle Telegram alerting with rollback.

use anyhow::Result;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::cli::ToggleArg;
use crate::commands::{resume_if_saved, sync_state_file};
use crate::domain::agent::ToggleOutcome;

fn flag_word(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

/// Run `monitorctl telegram <on|off>`.
///
/// # Errors
///
/// Returns an error if the supervisor state cannot be accessed.
pub async fn run(state: ToggleArg, app: &AppContext) -> Result<ExitCode> {
    let controller = app.controller();
    resume_if_saved(app, &controller).await;

    let reporter = app.terminal_reporter();
    let outcome = controller
        .set_telegram_enabled(state.as_bool(), &reporter)
        .await;
    sync_state_file(app, &controller).await;

    match outcome {
        ToggleOutcome::Applied { telegram_enabled } => {
            app.output
                .success(&format!("Telegram alerting {}.", flag_word(telegram_enabled)));
            Ok(ExitCode::SUCCESS)
        }
        ToggleOutcome::Saved { telegram_enabled } => {
            app.output.success(&format!(
                "Telegram alerting {} in the configuration.",
                flag_word(telegram_enabled)
            ));
            app.output.info("Applies on next start: monitorctl start");
            Ok(ExitCode::SUCCESS)
        }
        ToggleOutcome::RolledBack { error } => {
            app.output
                .error(&format!("New configuration failed: {error}"));
            app.output
                .warn("Previous configuration was restored and is running.");
            Ok(ExitCode::FAILURE)
        }
        ToggleOutcome::RollbackFailed {
            toggle_error,
            rollback_error,
        } => {
            app.output
                .error(&format!("New configuration failed: {toggle_error}"));
            app.output
                .error(&format!("Rollback also failed: {rollback_error}"));
            app.output
                .warn("Agent is stopped. Restart manually: monitorctl start");
            Ok(ExitCode::FAILURE)
        }
    }
}
