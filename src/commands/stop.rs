//! `monitorctl stop` — stop the agent, graceful then forceful.

use anyhow::Result;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::commands::{resume_if_saved, sync_state_file};

/// Run `monitorctl stop`.
///
/// # Errors
///
/// Returns an error if the supervisor state cannot be accessed.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let controller = app.controller();
    let resumed = resume_if_saved(app, &controller).await;

    if !resumed {
        sync_state_file(app, &controller).await;
        app.output.info("No agent to stop.");
        app.output.info("Start one: monitorctl start");
        return Ok(ExitCode::SUCCESS);
    }

    let reporter = app.terminal_reporter();
    let outcome = controller.stop(&reporter).await;
    sync_state_file(app, &controller).await;

    if outcome.ok {
        app.output.success("Agent stopped.");
        app.output.info("Resume: monitorctl start");
        Ok(ExitCode::SUCCESS)
    } else {
        app.output.error(&outcome.message);
        Ok(ExitCode::FAILURE)
    }
}
