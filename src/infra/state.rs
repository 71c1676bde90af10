//! Infrastructure implementation of the `StateStore` port.
//!
//! `StateManager` provides async load/save using `tokio::task::spawn_blocking`
//! with atomic write (temp file + rename) so a crash mid-save never leaves a
//! corrupt supervisor state behind.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::StateStore;
use crate::domain::agent::{SupervisorState, validate_pid};

/// State file manager — implements `StateStore` for the infra layer.
#[derive(Debug, Clone)]
pub struct StateManager {
    path: PathBuf,
}

impl StateManager {
    /// Create a state manager using the default path
    /// (`~/.monitord/supervisor.json`, overridable via `MONITORCTL_STATE`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        if let Ok(path) = std::env::var("MONITORCTL_STATE") {
            return Ok(Self::with_path(PathBuf::from(path)));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::with_path(home.join(".monitord").join("supervisor.json")))
    }

    /// Create a state manager with an explicit path (used in tests).
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    fn load_sync(&self) -> Result<Option<SupervisorState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading state file {}", self.path.display()))?;
        let state: SupervisorState = serde_json::from_str(&content)
            .with_context(|| format!("parsing state file {}", self.path.display()))?;
        validate_pid(state.pid)?;
        Ok(Some(state))
    }

    fn save_sync(&self, state: &SupervisorState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(state).context("serializing state")?;

        // Atomic write via temp file then rename.
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("finalizing state file {}", self.path.display()))?;

        Ok(())
    }
}

impl StateStore for StateManager {
    async fn load_async(&self) -> Result<Option<SupervisorState>> {
        let mgr = self.clone();
        tokio::task::spawn_blocking(move || mgr.load_sync())
            .await
            .context("state load task panicked")?
    }

    async fn save_async(&self, state: &SupervisorState) -> Result<()> {
        let mgr = self.clone();
        let state = state.clone();
        tokio::task::spawn_blocking(move || mgr.save_sync(&state))
            .await
            .context("state save task panicked")?
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("removing state file {}", self.path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn sample_state() -> SupervisorState {
        SupervisorState {
            pid: 4242,
            telegram_enabled: true,
            base_address: "http://127.0.0.1:9108".to_string(),
            started_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mgr = StateManager::with_path(dir.path().join("supervisor.json"));

        mgr.save_async(&sample_state()).await.expect("save");
        let loaded = mgr
            .load_async()
            .await
            .expect("load")
            .expect("state should exist");
        assert_eq!(loaded.pid, 4242);
        assert!(loaded.telegram_enabled);
        assert_eq!(loaded.base_address, "http://127.0.0.1:9108");
    }

    #[tokio::test]
    async fn load_missing_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mgr = StateManager::with_path(dir.path().join("supervisor.json"));
        assert!(mgr.load_async().await.expect("load").is_none());
    }

    #[tokio::test]
    async fn clear_removes_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mgr = StateManager::with_path(dir.path().join("supervisor.json"));

        mgr.save_async(&sample_state()).await.expect("save");
        mgr.clear().expect("clear");
        assert!(mgr.load_async().await.expect("load").is_none());
        // Clearing again is a no-op.
        mgr.clear().expect("clear twice");
    }

    #[tokio::test]
    async fn zero_pid_is_rejected_on_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("supervisor.json");
        std::fs::write(
            &path,
            r#"{"pid":0,"telegram_enabled":false,"base_address":"http://127.0.0.1:9108","started_at":"2026-01-01T00:00:00Z"}"#,
        )
        .expect("write");
        let mgr = StateManager::with_path(path);
        assert!(mgr.load_async().await.is_err());
    }
}
