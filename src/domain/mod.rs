//! Domain layer — pure types and derivations.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`
//! I/O. All functions take data in and return data out.

pub mod agent;
pub mod config;
pub mod error;

#[allow(unused_imports)]
pub use agent::{AgentState, AgentStatus, OpOutcome, StatusSnapshot, SupervisorState, ToggleOutcome};
#[allow(unused_imports)]
pub use config::{AgentConfig, TelegramConfig, base_address};
#[allow(unused_imports)]
pub use error::LifecycleError;
