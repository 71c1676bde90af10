//! Infrastructure implementation of the `ConfigStore` port.
//!
//! The agent's YAML document is read defensively: a missing, unreadable, or
//! unparseable file degrades to the baseline document so feature toggling
//! keeps working. The flag write is idempotent and best-effort — a failed
//! write is caught later by the operation-level health gate, not here.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::config::AgentConfig;

/// Production `ConfigStore` that uses a YAML file on disk.
#[derive(Debug, Clone)]
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Serialize and write the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// file cannot be written.
    pub fn save(&self, config: &AgentConfig) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(config).context("cannot serialize config")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("cannot write {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("cannot set permissions on {}", self.path.display()))?;
        }
        Ok(())
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> AgentConfig {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return AgentConfig::default();
        };
        serde_yaml::from_str(&content).unwrap_or_default()
    }

    fn set_telegram_enabled(&self, enabled: bool) -> bool {
        let mut config = self.load();
        if config.telegram.enabled == enabled {
            return false;
        }
        config.telegram.enabled = enabled;
        let _ = self.save(&config);
        true
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> YamlConfigStore {
        YamlConfigStore::new(dir.path().join("config.yaml"))
    }

    #[test]
    fn missing_file_loads_baseline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let config = store.load();
        assert_eq!(config.listen, "127.0.0.1:9108");
        assert!(!config.telegram.enabled);
    }

    #[test]
    fn corrupt_file_loads_baseline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        std::fs::write(store.path(), "listen: [not: valid").expect("write corrupt file");
        let config = store.load();
        assert_eq!(config.listen, "127.0.0.1:9108");
    }

    #[test]
    fn flag_write_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        assert!(store.set_telegram_enabled(true), "first flip should write");
        assert!(
            !store.set_telegram_enabled(true),
            "same target again is a no-op"
        );
        assert!(store.load().telegram.enabled);

        assert!(store.set_telegram_enabled(false));
        assert!(!store.load().telegram.enabled);
    }

    #[test]
    fn flag_edit_preserves_unrelated_sections() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let yaml = concat!(
            "listen: 0.0.0.0:9108\n",
            "interval_secs: 10\n",
            "tcp_checks:\n",
            "  - name: db\n",
            "    host: 127.0.0.1\n",
            "    port: 5432\n",
            "    timeout_ms: 500\n",
            "telegram:\n",
            "  allowed_chat_ids: [99]\n",
        );
        std::fs::write(store.path(), yaml).expect("seed config");

        assert!(store.set_telegram_enabled(true));

        let config = store.load();
        assert!(config.telegram.enabled);
        assert_eq!(config.listen, "0.0.0.0:9108");
        assert_eq!(config.interval_secs, 10);
        assert_eq!(config.tcp_checks.len(), 1);
        assert_eq!(config.tcp_checks[0].port, 5432);
        assert_eq!(config.telegram.allowed_chat_ids, vec![99]);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        store.save(&AgentConfig::default()).expect("save");
        let mode = std::fs::metadata(store.path())
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
