//! Lifecycle controller — the state machine behind every command.
//!
//! Composes the process-control, health-probe, and config-store ports to
//! implement start, stop, and toggle-with-rollback. All mutating operations
//! go through the [`OperationSerializer`]; `status()` bypasses it and is
//! always fresh. The controller owns the single process handle — no other
//! component mutates `AgentState`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::application::ports::{
    AgentProcess, ConfigStore, HealthProbe, LaunchSpec, ProcessControl, ProgressReporter,
};
use crate::application::serializer::OperationSerializer;
use crate::domain::agent::{
    AgentState, AgentStatus, OpOutcome, StatusSnapshot, SupervisorState, ToggleOutcome,
};
use crate::domain::config::base_address;
use crate::domain::error::LifecycleError;

/// Default bound on the health wait after a spawn.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(30);

struct Inner {
    state: AgentState,
    handle: Option<AgentProcess>,
}

/// Supervises exactly one agent process.
pub struct LifecycleController<P, H, C> {
    process: P,
    health: H,
    config: C,
    launch: LaunchSpec,
    health_timeout: Duration,
    serializer: Arc<OperationSerializer>,
    inner: Arc<Mutex<Inner>>,
}

impl<P, H, C> LifecycleController<P, H, C>
where
    P: ProcessControl,
    H: HealthProbe,
    C: ConfigStore,
{
    /// Create a controller in the `Stopped` state. The initial snapshot is
    /// seeded from the persisted configuration so `status` is meaningful
    /// before anything has been started.
    pub fn new(process: P, health: H, config: C, launch: LaunchSpec) -> Self {
        Self::with_health_timeout(process, health, config, launch, HEALTH_TIMEOUT)
    }

    /// Like [`Self::new`] with an explicit health bound (used in tests).
    pub fn with_health_timeout(
        process: P,
        health: H,
        config: C,
        launch: LaunchSpec,
        health_timeout: Duration,
    ) -> Self {
        let document = config.load();
        let state = AgentState::new(base_address(&document), document.telegram.enabled);
        Self {
            process,
            health,
            config,
            launch,
            health_timeout,
            serializer: Arc::new(OperationSerializer::new()),
            inner: Arc::new(Mutex::new(Inner {
                state,
                handle: None,
            })),
        }
    }

    // ── Operations ───────────────────────────────────────────────────────────

    /// Start the agent with the desired Telegram flag.
    ///
    /// No-op failure when already running. On a health failure the
    /// just-spawned process is terminated before reporting.
    pub async fn start(&self, telegram_enabled: bool, reporter: &impl ProgressReporter) -> OpOutcome {
        self.serializer
            .run(self.start_inner(telegram_enabled, reporter))
            .await
    }

    /// Stop the agent. No-op success when already stopped; the state is
    /// reset to `Stopped` regardless of how termination goes.
    pub async fn stop(&self, reporter: &impl ProgressReporter) -> OpOutcome {
        self.serializer.run(self.stop_inner(reporter)).await
    }

    /// Toggle Telegram alerting, restarting the agent when it is running and
    /// rolling back to the previous flag if the new configuration fails to
    /// come up healthy.
    pub async fn set_telegram_enabled(
        &self,
        target: bool,
        reporter: &impl ProgressReporter,
    ) -> ToggleOutcome {
        self.serializer
            .run(async {
                if self.live_handle().is_none() {
                    self.config.set_telegram_enabled(target);
                    self.lock().state.telegram_enabled = target;
                    return ToggleOutcome::Saved {
                        telegram_enabled: target,
                    };
                }

                let previous = self.lock().state.telegram_enabled;
                if previous == target {
                    return ToggleOutcome::Applied {
                        telegram_enabled: target,
                    };
                }

                self.lock().state.status = AgentStatus::Transitioning;
                let _ = self.stop_inner(reporter).await;

                let attempt = self.start_inner(target, reporter).await;
                if attempt.ok {
                    return ToggleOutcome::Applied {
                        telegram_enabled: target,
                    };
                }

                reporter.warn(&format!("new configuration failed: {}", attempt.message));
                reporter.step("rolling back to the previous configuration...");
                let rollback = self.start_inner(previous, reporter).await;
                if rollback.ok {
                    ToggleOutcome::RolledBack {
                        error: attempt.message,
                    }
                } else {
                    ToggleOutcome::RollbackFailed {
                        toggle_error: attempt.message,
                        rollback_error: rollback.message,
                    }
                }
            })
            .await
    }

    /// Current state snapshot. Never queued, never blocks on an in-flight
    /// operation, and never reports a pid whose exit notification has fired
    /// — even before the queued reset has run.
    pub fn status(&self) -> StatusSnapshot {
        let transitioning = self.serializer.is_transitioning();
        let guard = self.lock();
        let exited = guard.handle.as_ref().is_none_or(AgentProcess::has_exited);
        let status = if exited && guard.state.status.is_active() {
            AgentStatus::Stopped
        } else {
            guard.state.status
        };
        StatusSnapshot {
            running: status == AgentStatus::Running,
            status,
            pid: if exited { None } else { guard.state.pid },
            telegram_enabled: guard.state.telegram_enabled,
            base_address: guard.state.base_address.clone(),
            transitioning,
            last_error: guard.state.last_error.clone(),
        }
    }

    /// Resume supervision of an agent spawned by an earlier invocation.
    /// A stale pid (process already gone) leaves the controller stopped.
    /// Returns whether the adopted process is alive. Rehydration only —
    /// call before submitting operations, not concurrently with them.
    pub fn resume(&self, saved: &SupervisorState) -> bool {
        let handle = self.process.adopt(saved.pid);
        let alive = !handle.has_exited();
        {
            let mut guard = self.lock();
            guard.state.telegram_enabled = saved.telegram_enabled;
            guard.state.base_address = saved.base_address.clone();
            if alive {
                guard.state.status = AgentStatus::Running;
                guard.state.pid = Some(saved.pid);
                guard.handle = Some(handle.clone());
            }
        }
        if alive {
            self.watch_exit(&handle);
        }
        alive
    }

    // ── Internals ────────────────────────────────────────────────────────────

    async fn start_inner(
        &self,
        telegram_enabled: bool,
        reporter: &impl ProgressReporter,
    ) -> OpOutcome {
        if self.live_handle().is_some() {
            return OpOutcome::failed("agent is already running");
        }

        // Persist the desired flag first; a write failure degrades to the
        // in-memory value and is caught by the health gate if it matters.
        self.config.set_telegram_enabled(telegram_enabled);
        let document = self.config.load();
        let address = base_address(&document);

        {
            let mut guard = self.lock();
            guard.state.status = AgentStatus::Starting;
            guard.state.base_address = address.clone();
        }

        reporter.step("launching agent process...");
        let handle = match self.process.spawn(&self.launch).await {
            Ok(handle) => handle,
            Err(err) => {
                let message = format!("{err:#}");
                let mut guard = self.lock();
                guard.state.reset_stopped();
                guard.state.last_error = Some(message.clone());
                return OpOutcome::failed(message);
            }
        };

        {
            let mut guard = self.lock();
            guard.state.pid = Some(handle.pid());
            guard.handle = Some(handle.clone());
        }
        self.watch_exit(&handle);

        reporter.step(&format!("waiting for agent health at {address}..."));
        if self
            .health
            .wait_healthy(&address, &handle, self.health_timeout)
            .await
        {
            reporter.success("agent is healthy");
            let mut guard = self.lock();
            guard.state.status = AgentStatus::Running;
            guard.state.telegram_enabled = telegram_enabled;
            guard.state.last_error = None;
            OpOutcome::succeeded(format!("agent running (pid {})", handle.pid()))
        } else {
            let message = if handle.has_exited() {
                LifecycleError::DiedDuringStartup.to_string()
            } else {
                LifecycleError::HealthTimeout {
                    base_address: address,
                    timeout_secs: self.health_timeout.as_secs(),
                }
                .to_string()
            };
            // Don't leave an orphan behind a failed start.
            let _ = self.process.terminate(&handle).await;
            let mut guard = self.lock();
            Self::clear_handle(&mut guard, handle.token());
            guard.state.reset_stopped();
            guard.state.last_error = Some(message.clone());
            OpOutcome::failed(message)
        }
    }

    async fn stop_inner(&self, reporter: &impl ProgressReporter) -> OpOutcome {
        let Some(handle) = self.live_handle() else {
            // Clear any stale tracking left by an out-of-band exit.
            let mut guard = self.lock();
            guard.handle = None;
            guard.state.reset_stopped();
            return OpOutcome::succeeded("agent is not running");
        };

        self.lock().state.status = AgentStatus::Stopping;
        reporter.step("stopping agent...");
        let result = self.process.terminate(&handle).await;

        let mut guard = self.lock();
        Self::clear_handle(&mut guard, handle.token());
        guard.state.reset_stopped();
        match result {
            Ok(()) => OpOutcome::succeeded("agent stopped"),
            Err(err) => {
                let message = format!("{err:#}");
                guard.state.last_error = Some(message.clone());
                OpOutcome::failed(message)
            }
        }
    }

    /// The tracked handle, if its exit notification has not fired.
    fn live_handle(&self) -> Option<AgentProcess> {
        self.lock()
            .handle
            .clone()
            .filter(|handle| !handle.has_exited())
    }

    fn clear_handle(guard: &mut MutexGuard<'_, Inner>, token: u64) {
        if guard
            .handle
            .as_ref()
            .is_some_and(|tracked| tracked.token() == token)
        {
            guard.handle = None;
        }
    }

    /// Register the out-of-band exit watcher for a handle. The reset is
    /// posted into the operation queue so it cannot race an in-flight
    /// stop/start, and it only applies while this exact handle is still the
    /// tracked one.
    fn watch_exit(&self, handle: &AgentProcess) {
        let handle = handle.clone();
        let inner = Arc::clone(&self.inner);
        let serializer = Arc::clone(&self.serializer);
        tokio::spawn(async move {
            handle.wait_exited().await;
            serializer
                .run(async {
                    let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
                    let still_tracked = guard
                        .handle
                        .as_ref()
                        .is_some_and(|tracked| tracked.token() == handle.token());
                    if still_tracked {
                        guard.handle = None;
                        guard.state.reset_stopped();
                    }
                })
                .await;
        });
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
