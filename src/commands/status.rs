//! `monitorctl status` — show the agent state snapshot.
//!
//! A pure read: never queued behind an in-flight operation, and a stale
//! state file (agent died while nobody was watching) is cleaned up here.

use anyhow::Result;
use std::process::ExitCode;
use std::time::Duration;

use crate::app::AppContext;
use crate::application::ports::{HealthProbe as _, ProcessControl as _, StateStore as _};
use crate::commands::resume_if_saved;

/// Run `monitorctl status`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let controller = app.controller();
    resume_if_saved(app, &controller).await;
    let snapshot = controller.status();

    if !snapshot.running {
        // Drop a stale record so later commands don't re-adopt a dead pid.
        let _ = app.state_store.clear();
    }

    if app.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(ExitCode::SUCCESS);
    }

    // One-shot liveness check: a zero timeout makes the probe issue a single
    // request and report the result.
    let healthy = match snapshot.pid {
        Some(pid) if snapshot.running => Some(
            app.health
                .wait_healthy(
                    &snapshot.base_address,
                    &app.process.adopt(pid),
                    Duration::ZERO,
                )
                .await,
        ),
        _ => None,
    };

    app.output.header("Agent");
    app.output.kv("Status", snapshot.status.display());
    if let Some(pid) = snapshot.pid {
        app.output.kv("PID", &pid.to_string());
    }
    app.output.kv(
        "Telegram",
        if snapshot.telegram_enabled { "on" } else { "off" },
    );
    app.output.kv("Address", &snapshot.base_address);
    if let Some(healthy) = healthy {
        app.output
            .kv("Health", if healthy { "healthy" } else { "unreachable" });
    }
    if snapshot.transitioning {
        app.output.info("An operation is in progress.");
    }
    if let Some(last_error) = &snapshot.last_error {
        app.output.warn(&format!("last error: {last_error}"));
    }
    if !snapshot.running {
        app.output.info("Start the agent: monitorctl start");
    }

    Ok(ExitCode::SUCCESS)
}
