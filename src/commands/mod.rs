//! Command handlers — thin presentation over the lifecycle controller.

pub mod config;
pub mod start;
pub mod status;
pub mod stop;
pub mod telegram;
pub mod version;

use chrono::Utc;

use crate::app::{AppContext, Controller};
use crate::application::ports::StateStore as _;
use crate::domain::agent::SupervisorState;

/// Resume supervision of a previously spawned agent, if any was recorded.
/// Returns whether a live process was adopted.
pub(crate) async fn resume_if_saved(app: &AppContext, controller: &Controller) -> bool {
    match app.state_store.load_async().await {
        Ok(Some(saved)) => controller.resume(&saved),
        Ok(None) => false,
        Err(err) => {
            app.output
                .warn(&format!("ignoring unreadable supervisor state: {err:#}"));
            false
        }
    }
}

/// Bring the supervisor state file in line with the controller's snapshot:
/// save while an agent is running, clear otherwise. Best-effort — a state
/// file problem should not fail an operation that already happened.
pub(crate) async fn sync_state_file(app: &AppContext, controller: &Controller) {
    let snapshot = controller.status();
    let result = match (snapshot.running, snapshot.pid) {
        (true, Some(pid)) => {
            app.state_store
                .save_async(&SupervisorState {
                    pid,
                    telegram_enabled: snapshot.telegram_enabled,
                    base_address: snapshot.base_address,
                    started_at: Utc::now(),
                })
                .await
        }
        _ => app.state_store.clear(),
    };
    if let Err(err) = result {
        app.output
            .warn(&format!("could not persist supervisor state: {err:#}"));
    }
}
