//! Typed view of the agent's YAML configuration document.
//!
//! The document is owned by the agent; the supervisor reads it to derive the
//! probe address and rewrites it only to flip `telegram.enabled`. Every field
//! carries a serde default so a partially written file still round-trips —
//! feature toggling must keep working even when the file is degraded.

use serde::{Deserialize, Serialize};

/// Top-level agent configuration (`config.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Listen address of the agent's HTTP server, `host:port`.
    pub listen: String,
    /// Metric collection interval in seconds.
    pub interval_secs: u64,
    /// Agent-side HTTP probes. Opaque to the supervisor, preserved on rewrite.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub http_checks: Vec<HttpCheckConfig>,
    /// Agent-side TCP probes. Opaque to the supervisor, preserved on rewrite.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tcp_checks: Vec<TcpCheckConfig>,
    /// Telegram alerting feature block.
    pub telegram: TelegramConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            interval_secs: default_interval_secs(),
            http_checks: Vec::new(),
            tcp_checks: Vec::new(),
            telegram: TelegramConfig::default(),
        }
    }
}

/// One HTTP check performed by the agent itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpCheckConfig {
    pub name: String,
    pub url: String,
    pub timeout_ms: u64,
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
}

/// One TCP check performed by the agent itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcpCheckConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub timeout_ms: u64,
}

/// Telegram alerting block — the feature the supervisor toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    /// Environment variable the agent reads the bot token from.
    pub bot_token_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    /// Chat ids allowed to talk to the bot.
    pub allowed_chat_ids: Vec<i64>,
    pub rate_limit_per_minute: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
    pub alerts: AlertsConfig,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token_env: "TELEGRAM_BOT_TOKEN".to_string(),
            bot_token: None,
            allowed_chat_ids: Vec::new(),
            rate_limit_per_minute: 30,
            public_base_url: None,
            alerts: AlertsConfig::default(),
        }
    }
}

/// Alert thresholds nested under the Telegram block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub enabled_by_default: bool,
    pub repeat_interval_secs: u64,
    pub fail_threshold: u32,
    pub recovery_notify: bool,
    pub resource_alerts_enabled: bool,
    pub gpu_load_threshold_percent: f64,
    pub gpu_temp_threshold_celsius: f64,
    pub cpu_temp_threshold_celsius: f64,
    pub cpu_load_threshold_percent: f64,
    pub ram_usage_threshold_percent: f64,
    pub disk_usage_threshold_percent: f64,
    pub resource_alert_cooldown_secs: u64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled_by_default: true,
            repeat_interval_secs: 1800,
            fail_threshold: 3,
            recovery_notify: true,
            resource_alerts_enabled: true,
            gpu_load_threshold_percent: 92.0,
            gpu_temp_threshold_celsius: 75.0,
            cpu_temp_threshold_celsius: 85.0,
            cpu_load_threshold_percent: 92.0,
            ram_usage_threshold_percent: 92.0,
            disk_usage_threshold_percent: 95.0,
            resource_alert_cooldown_secs: 10,
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:9108".to_string()
}

const fn default_interval_secs() -> u64 {
    5
}

const fn default_expected_status() -> u16 {
    200
}

// ── Base address derivation ──────────────────────────────────────────────────

/// Derive the probe/UI base address from the configured listen address.
///
/// A wildcard bind (`0.0.0.0` or `[::]`) guarantees loopback reachability but
/// is not itself dialable, so the matching loopback address is substituted.
/// A value that does not parse as a socket address (e.g. a hostname) is
/// passed through unchanged.
#[must_use]
pub fn base_address(config: &AgentConfig) -> String {
    match config.listen.parse::<std::net::SocketAddr>() {
        Ok(addr) if addr.ip().is_unspecified() => {
            if addr.is_ipv6() {
                format!("http://[::1]:{}", addr.port())
            } else {
                format!("http://127.0.0.1:{}", addr.port())
            }
        }
        Ok(addr) => format!("http://{addr}"),
        Err(_) => format!("http://{}", config.listen),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn config_with_listen(listen: &str) -> AgentConfig {
        AgentConfig {
            listen: listen.to_string(),
            ..AgentConfig::default()
        }
    }

    #[test]
    fn base_address_substitutes_ipv4_wildcard() {
        let cfg = config_with_listen("0.0.0.0:9108");
        assert_eq!(base_address(&cfg), "http://127.0.0.1:9108");
    }

    #[test]
    fn base_address_substitutes_ipv6_wildcard() {
        let cfg = config_with_listen("[::]:9108");
        assert_eq!(base_address(&cfg), "http://[::1]:9108");
    }

    #[test]
    fn base_address_keeps_concrete_address() {
        let cfg = config_with_listen("192.168.1.20:9200");
        assert_eq!(base_address(&cfg), "http://192.168.1.20:9200");
    }

    #[test]
    fn base_address_passes_hostname_through() {
        let cfg = config_with_listen("localhost:9108");
        assert_eq!(base_address(&cfg), "http://localhost:9108");
    }

    #[test]
    fn default_document_is_usable() {
        let cfg = AgentConfig::default();
        assert_eq!(cfg.listen, "127.0.0.1:9108");
        assert_eq!(cfg.interval_secs, 5);
        assert!(!cfg.telegram.enabled);
        assert_eq!(cfg.telegram.bot_token_env, "TELEGRAM_BOT_TOKEN");
    }

    #[test]
    fn deserialize_empty_document_uses_defaults() {
        let cfg: AgentConfig = serde_yaml::from_str("{}").expect("empty yaml");
        assert_eq!(cfg.listen, "127.0.0.1:9108");
        assert!(!cfg.telegram.enabled);
    }

    #[test]
    fn deserialize_partial_telegram_block() {
        let yaml = "listen: 0.0.0.0:9108\ntelegram:\n  enabled: true\n  allowed_chat_ids: [42]\n";
        let cfg: AgentConfig = serde_yaml::from_str(yaml).expect("valid yaml");
        assert!(cfg.telegram.enabled);
        assert_eq!(cfg.telegram.allowed_chat_ids, vec![42]);
        // Unset nested fields still get their defaults.
        assert_eq!(cfg.telegram.alerts.fail_threshold, 3);
    }

    #[test]
    fn rewrite_preserves_agent_side_checks() {
        let yaml = concat!(
            "listen: 127.0.0.1:9108\n",
            "interval_secs: 5\n",
            "http_checks:\n",
            "  - name: api\n",
            "    url: https://example.com/health\n",
            "    timeout_ms: 2000\n",
        );
        let mut cfg: AgentConfig = serde_yaml::from_str(yaml).expect("valid yaml");
        cfg.telegram.enabled = true;
        let rewritten = serde_yaml::to_string(&cfg).expect("serialize");
        let back: AgentConfig = serde_yaml::from_str(&rewritten).expect("reparse");
        assert_eq!(back.http_checks.len(), 1);
        assert_eq!(back.http_checks[0].name, "api");
        assert!(back.telegram.enabled);
    }
}
