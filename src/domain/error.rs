//! Typed lifecycle error enums.
//!
//! All error types implement `thiserror::Error` and convert to
//! `anyhow::Error` via the `?` operator. Operations catch these at the
//! boundary and turn them into result values — nothing escapes the
//! controller uncaught.

use thiserror::Error;

/// Errors raised while driving the agent process lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to launch agent: {0}")]
    Spawn(String),

    #[error("agent did not become healthy at {base_address} within {timeout_secs}s")]
    HealthTimeout {
        base_address: String,
        timeout_secs: u64,
    },

    #[error("agent process exited before becoming healthy")]
    DiedDuringStartup,

    #[error("agent process {pid} survived forced termination")]
    ForceKillFailed { pid: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_timeout_names_address_and_bound() {
        let err = LifecycleError::HealthTimeout {
            base_address: "http://127.0.0.1:9108".into(),
            timeout_secs: 30,
        };
        let msg = err.to_string();
        assert!(msg.contains("http://127.0.0.1:9108"), "got: {msg}");
        assert!(msg.contains("30s"), "got: {msg}");
    }
}
