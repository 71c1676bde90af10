//! Agent lifecycle domain types.
//!
//! Pure data — the process handle itself lives at the port layer, the
//! controller pairs it with the [`AgentState`] defined here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Status ───────────────────────────────────────────────────────────────────

/// Lifecycle status of the supervised agent process.
///
/// `Transitioning` covers composite operations (the Telegram toggle) that
/// internally pass through several of the other states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
    Transitioning,
}

impl AgentStatus {
    /// True for states in which a process handle may be tracked.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::Starting | Self::Running | Self::Stopping | Self::Transitioning
        )
    }

    /// Display string for human-readable output.
    #[must_use]
    pub fn display(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Transitioning => "transitioning",
        }
    }
}

// ── Controller-owned state ───────────────────────────────────────────────────

/// Mutable supervisor-side view of the agent process.
///
/// `pid` is `Some` only while a live process is tracked. `telegram_enabled`
/// reflects the configuration the *currently running* process was started
/// with, which may differ from the persisted flag mid-transition.
#[derive(Debug, Clone)]
pub struct AgentState {
    pub status: AgentStatus,
    pub pid: Option<u32>,
    pub telegram_enabled: bool,
    pub base_address: String,
    pub last_error: Option<String>,
}

impl AgentState {
    /// Fresh state for a controller that has not started anything yet.
    #[must_use]
    pub fn new(base_address: String, telegram_enabled: bool) -> Self {
        Self {
            status: AgentStatus::Stopped,
            pid: None,
            telegram_enabled,
            base_address,
            last_error: None,
        }
    }

    /// Reset to `Stopped` after the process is gone (stop or out-of-band exit).
    pub fn reset_stopped(&mut self) {
        self.status = AgentStatus::Stopped;
        self.pid = None;
    }
}

// ── Snapshot ─────────────────────────────────────────────────────────────────

/// Point-in-time status snapshot returned by `status()`.
///
/// Serialized as-is for `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub running: bool,
    pub status: AgentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub telegram_enabled: bool,
    pub base_address: String,
    pub transitioning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

// ── Operation outcomes ───────────────────────────────────────────────────────

/// Result value returned by `start` and `stop`.
///
/// Lifecycle operations never propagate errors to the caller; failures are
/// converted to `{ok: false, message}` at the operation boundary.
#[derive(Debug, Clone)]
pub struct OpOutcome {
    pub ok: bool,
    pub message: String,
}

impl OpOutcome {
    #[must_use]
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Terminal outcome of a Telegram toggle.
///
/// The three failure-relevant cases are deliberately distinct: a rollback
/// that restored the previous configuration is recoverable, a rollback that
/// also failed leaves the agent stopped and needs a manual restart. The two
/// underlying causes are carried separately, never folded into one string.
#[derive(Debug, Clone)]
pub enum ToggleOutcome {
    /// New configuration is up and healthy.
    Applied { telegram_enabled: bool },
    /// Agent was not running; the flag was persisted for the next start.
    Saved { telegram_enabled: bool },
    /// New configuration failed; the previous one was restored and is running.
    RolledBack { error: String },
    /// Both the new configuration and the rollback failed; agent is stopped.
    RollbackFailed {
        toggle_error: String,
        rollback_error: String,
    },
}

// ── Persisted supervisor state ───────────────────────────────────────────────

/// Supervisor state persisted to `~/.monitord/supervisor.json`.
///
/// Lets a later CLI invocation resume supervision of an agent spawned by an
/// earlier one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorState {
    /// Pid of the detached agent process.
    pub pid: u32,
    /// Flag the running process was started with.
    pub telegram_enabled: bool,
    /// Probe address derived at start time.
    pub base_address: String,
    /// When the agent was started.
    pub started_at: DateTime<Utc>,
}

/// Validates a persisted pid before adopting it.
///
/// # Errors
///
/// Returns an error if the pid is zero (never a valid child of ours).
pub fn validate_pid(pid: u32) -> anyhow::Result<()> {
    anyhow::ensure!(pid != 0, "invalid pid 0 in supervisor state");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_states_track_a_handle() {
        assert!(AgentStatus::Starting.is_active());
        assert!(AgentStatus::Running.is_active());
        assert!(AgentStatus::Stopping.is_active());
        assert!(!AgentStatus::Stopped.is_active());
    }

    #[test]
    fn reset_clears_pid_and_status() {
        let mut state = AgentState::new("http://127.0.0.1:9108".into(), true);
        state.status = AgentStatus::Running;
        state.pid = Some(4242);
        state.reset_stopped();
        assert_eq!(state.status, AgentStatus::Stopped);
        assert!(state.pid.is_none());
    }

    #[test]
    fn snapshot_json_omits_pid_when_none() {
        let snap = StatusSnapshot {
            running: false,
            status: AgentStatus::Stopped,
            pid: None,
            telegram_enabled: false,
            base_address: "http://127.0.0.1:9108".into(),
            transitioning: false,
            last_error: None,
        };
        let json = serde_json::to_string(&snap).expect("serialize StatusSnapshot");
        assert!(!json.contains("pid"), "pid should be omitted when None");
        assert!(json.contains(r#""status":"stopped""#));
    }

    #[test]
    fn validate_pid_rejects_zero() {
        assert!(validate_pid(0).is_err());
        assert!(validate_pid(1234).is_ok());
    }
}
