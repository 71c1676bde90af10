//! Port trait definitions for the application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;

use crate::domain::agent::SupervisorState;
use crate::domain::config::AgentConfig;

// ── Value types ───────────────────────────────────────────────────────────────

/// Launch parameters for the agent process.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Agent executable (path or bare name resolved via `PATH`).
    pub binary: PathBuf,
    /// Configuration file passed as `--config <path>`.
    pub config_path: PathBuf,
    /// When the executable is missing, fall back to `cargo run` instead of
    /// failing (development launch mode).
    pub dev_fallback: bool,
}

/// Identity tokens for process handles. A fresh token per spawn/adopt lets
/// the exit watcher tell whether the controller still tracks *this* handle.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Handle to a (possibly already exited) agent process.
///
/// Exit is observed through a watch channel: the infrastructure flips it to
/// `true` exactly once, whatever the cause — normal exit, crash, external
/// kill. Clones share the same channel and token.
#[derive(Debug, Clone)]
pub struct AgentProcess {
    pid: u32,
    token: u64,
    exited: watch::Receiver<bool>,
}

impl AgentProcess {
    /// Wrap a pid and its exit channel into a handle with a fresh token.
    #[must_use]
    pub fn new(pid: u32, exited: watch::Receiver<bool>) -> Self {
        Self {
            pid,
            token: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
            exited,
        }
    }

    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    #[must_use]
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Whether the exit notification has fired.
    #[must_use]
    pub fn has_exited(&self) -> bool {
        *self.exited.borrow()
    }

    /// Resolve when the process has exited. Returns immediately if it
    /// already has; a dropped sender side counts as exited.
    pub async fn wait_exited(&self) {
        let mut rx = self.exited.clone();
        let _ = rx.wait_for(|exited| *exited).await;
    }
}

// ── Process control port ──────────────────────────────────────────────────────

/// Launch, observe, and terminate the agent process.
#[allow(async_fn_in_trait)]
pub trait ProcessControl {
    /// Spawn the agent detached from the supervisor's stdio.
    ///
    /// # Errors
    ///
    /// Returns an error if the executable cannot be started and no dev
    /// fallback applies.
    async fn spawn(&self, spec: &LaunchSpec) -> Result<AgentProcess>;

    /// Rebuild a handle for a process spawned by an earlier invocation.
    /// The returned handle reflects liveness at the time of the call and
    /// keeps tracking it afterwards.
    fn adopt(&self, pid: u32) -> AgentProcess;

    /// Request graceful shutdown, escalating to a forceful kill after the
    /// grace period. Idempotent: an already-exited handle is a no-op success.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process survives the forceful bound.
    async fn terminate(&self, process: &AgentProcess) -> Result<()>;
}

// ── Health port ───────────────────────────────────────────────────────────────

/// Bounded readiness polling against the agent's liveness endpoint.
#[allow(async_fn_in_trait)]
pub trait HealthProbe {
    /// Poll `<base_address>/health` until a success response, the timeout
    /// elapses, or the process exits. Network errors are "not ready yet".
    /// Returns `true` only on a success response.
    async fn wait_healthy(
        &self,
        base_address: &str,
        process: &AgentProcess,
        timeout: Duration,
    ) -> bool;
}

// ── Config store port ─────────────────────────────────────────────────────────

/// Read and edit the agent's persisted configuration document.
pub trait ConfigStore {
    /// Load the configuration, falling back to the baseline document when
    /// the file is missing, unreadable, or unparseable. Never a hard
    /// failure — feature toggling must stay possible with a corrupt file.
    fn load(&self) -> AgentConfig;

    /// Set `telegram.enabled`, writing only when the value differs.
    /// Returns whether the flag changed. Write failures are swallowed here
    /// and surface later through operation-level health checks.
    fn set_telegram_enabled(&self, enabled: bool) -> bool;

    /// Path of the backing document.
    fn path(&self) -> PathBuf;
}

// ── Supervisor state port ─────────────────────────────────────────────────────

/// Persistence for the supervisor's own state (pid of the detached agent).
#[allow(async_fn_in_trait)]
pub trait StateStore {
    /// Load the persisted state, returning `None` if no state exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    async fn load_async(&self) -> Result<Option<SupervisorState>>;

    /// Persist the given state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    async fn save_async(&self, state: &SupervisorState) -> Result<()>;

    /// Remove the persisted state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    fn clear(&self) -> Result<()>;
}

// ── Progress reporting port ───────────────────────────────────────────────────

/// Progress events emitted by lifecycle operations, so the controller never
/// depends on the presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handle_reports_exit_once_flipped() {
        let (tx, rx) = watch::channel(false);
        let process = AgentProcess::new(77, rx);
        assert!(!process.has_exited());
        tx.send(true).expect("send exit");
        assert!(process.has_exited());
        // Resolves immediately once exited.
        process.wait_exited().await;
    }

    #[tokio::test]
    async fn dropped_sender_counts_as_exited() {
        let (tx, rx) = watch::channel(false);
        let process = AgentProcess::new(78, rx);
        drop(tx);
        process.wait_exited().await;
    }

    #[test]
    fn tokens_are_unique_per_handle() {
        let (_tx1, rx1) = watch::channel(false);
        let (_tx2, rx2) = watch::channel(false);
        let a = AgentProcess::new(1, rx1);
        let b = AgentProcess::new(1, rx2);
        assert_ne!(a.token(), b.token());
        assert_eq!(a.token(), a.clone().token());
    }
}
