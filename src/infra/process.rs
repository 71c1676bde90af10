//! Tokio-based implementation of the `ProcessControl` port.
//!
//! Spawned agents are detached from the supervisor: null stdio and their own
//! process group, so they survive the CLI process exiting. Exit observation
//! runs through a watch channel flipped exactly once by a reaper task (for
//! processes we spawned) or a liveness poller (for adopted pids).

use std::process::Stdio;
use std::time::Duration;

use anyhow::Result;
use tokio::process::Command;
use tokio::sync::watch;
use tokio::time::timeout;

use crate::application::ports::{AgentProcess, LaunchSpec, ProcessControl};
use crate::domain::error::LifecycleError;

/// Bound on the graceful-shutdown wait before escalating.
pub const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(7);

/// Bound on the wait after a forceful kill. Past this point termination is
/// best-effort; we do not block indefinitely.
pub const FORCE_KILL_TIMEOUT: Duration = Duration::from_secs(2);

/// How often an adopted pid is re-checked for liveness.
const ADOPTED_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Production `ProcessControl` backed by tokio child processes.
#[derive(Debug, Clone)]
pub struct TokioProcessControl {
    graceful: Duration,
    force: Duration,
}

impl Default for TokioProcessControl {
    fn default() -> Self {
        Self {
            graceful: GRACEFUL_TIMEOUT,
            force: FORCE_KILL_TIMEOUT,
        }
    }
}

impl TokioProcessControl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the termination bounds (used in tests).
    #[must_use]
    pub fn with_timeouts(graceful: Duration, force: Duration) -> Self {
        Self { graceful, force }
    }
}

impl ProcessControl for TokioProcessControl {
    async fn spawn(&self, spec: &LaunchSpec) -> Result<AgentProcess> {
        let child = match agent_command(spec).spawn() {
            Ok(child) => child,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && spec.dev_fallback => {
                // Development launch mode: no built binary available, run the
                // agent through cargo with the same trailing arguments.
                let mut cmd = Command::new("cargo");
                cmd.args(["run", "--quiet", "--"])
                    .arg("--config")
                    .arg(&spec.config_path);
                configure_detached(&mut cmd);
                cmd.spawn().map_err(|err| {
                    LifecycleError::Spawn(format!("cargo run fallback failed: {err}"))
                })?
            }
            Err(err) => {
                return Err(
                    LifecycleError::Spawn(format!("{}: {err}", spec.binary.display())).into(),
                );
            }
        };

        let pid = child.id().unwrap_or_default();
        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            // Reap the child whatever the exit cause; receivers observe the
            // flip. This is the only exit-notification path.
            let mut child = child;
            let _ = child.wait().await;
            let _ = tx.send(true);
        });
        Ok(AgentProcess::new(pid, rx))
    }

    fn adopt(&self, pid: u32) -> AgentProcess {
        let alive = process_alive(pid);
        let (tx, rx) = watch::channel(!alive);
        if alive {
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(ADOPTED_POLL_INTERVAL);
                loop {
                    ticker.tick().await;
                    if !process_alive(pid) {
                        let _ = tx.send(true);
                        break;
                    }
                }
            });
        }
        AgentProcess::new(pid, rx)
    }

    async fn terminate(&self, process: &AgentProcess) -> Result<()> {
        if process.has_exited() {
            return Ok(());
        }
        let pid = process.pid();

        request_graceful_shutdown(pid);
        if timeout(self.graceful, process.wait_exited()).await.is_ok() {
            return Ok(());
        }

        // The grace period elapsed without an exit: escalate.
        force_kill(pid);
        if timeout(self.force, process.wait_exited()).await.is_ok() {
            return Ok(());
        }
        Err(LifecycleError::ForceKillFailed { pid }.into())
    }
}

/// Build the regular agent invocation: `monitord --config <path>`.
fn agent_command(spec: &LaunchSpec) -> Command {
    let mut cmd = Command::new(&spec.binary);
    cmd.arg("--config").arg(&spec.config_path);
    configure_detached(&mut cmd);
    cmd
}

fn configure_detached(cmd: &mut Command) {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    #[cfg(unix)]
    cmd.process_group(0);
    #[cfg(windows)]
    {
        // Mirrors CREATE_NEW_PROCESS_GROUP so console signals do not
        // propagate between the supervisor and the agent.
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
    }
}

// ── Unix signals ─────────────────────────────────────────────────────────────

#[cfg(unix)]
#[allow(clippy::cast_possible_wrap)]
fn raw_pid(pid: u32) -> nix::unistd::Pid {
    nix::unistd::Pid::from_raw(pid as i32)
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    // Signal 0 probes existence. EPERM means the pid exists but belongs to
    // someone else — still alive.
    match kill(raw_pid(pid), None) {
        Ok(()) => true,
        Err(errno) => errno == Errno::EPERM,
    }
}

#[cfg(unix)]
fn request_graceful_shutdown(pid: u32) {
    use nix::sys::signal::{Signal, kill};
    let _ = kill(raw_pid(pid), Signal::SIGTERM);
}

#[cfg(unix)]
fn force_kill(pid: u32) {
    use nix::sys::signal::{Signal, kill};
    let _ = kill(raw_pid(pid), Signal::SIGKILL);
}

// ── Windows: no POSIX signals, use the taskkill process-tree kill ────────────

#[cfg(windows)]
fn process_alive(pid: u32) -> bool {
    std::process::Command::new("tasklist")
        .args(["/NH", "/FI", &format!("PID eq {pid}")])
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).contains(&pid.to_string()))
        .unwrap_or(false)
}

#[cfg(windows)]
fn request_graceful_shutdown(pid: u32) {
    let _ = std::process::Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T"])
        .output();
}

#[cfg(windows)]
fn force_kill(pid: u32) {
    let _ = std::process::Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .output();
}
