//! Application context — unified state passed to every command handler.
//!
//! `AppContext` wires the production port implementations together so each
//! command constructs one controller instead of assembling loose pieces.

use anyhow::Result;
use std::path::PathBuf;

use crate::application::controller::LifecycleController;
use crate::application::ports::LaunchSpec;
use crate::infra::config::YamlConfigStore;
use crate::infra::health::HttpHealthProbe;
use crate::infra::process::TokioProcessControl;
use crate::infra::state::StateManager;
use crate::output::OutputContext;
use crate::output::reporter::TerminalReporter;

/// Controller over the production port implementations.
pub type Controller = LifecycleController<TokioProcessControl, HttpHealthProbe, YamlConfigStore>;

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Enable JSON output mode.
    pub json: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Path to the agent configuration file.
    pub config: PathBuf,
    /// Path to the agent executable.
    pub binary: PathBuf,
    /// Fall back to `cargo run` when the executable is missing.
    pub dev: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// When `true`, render machine-readable JSON instead of human output.
    pub json: bool,
    /// Agent configuration document store.
    pub config_store: YamlConfigStore,
    /// Supervisor state persistence.
    pub state_store: StateManager,
    /// Process launching and termination.
    pub process: TokioProcessControl,
    /// Agent liveness probing.
    pub health: HttpHealthProbe,
    /// How the agent gets launched.
    pub launch: LaunchSpec,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the state manager cannot determine its path
    /// (home directory not found).
    pub fn new(flags: AppFlags) -> Result<Self> {
        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            json: flags.json,
            config_store: YamlConfigStore::new(flags.config.clone()),
            state_store: StateManager::new()?,
            process: TokioProcessControl::new(),
            health: HttpHealthProbe::new(),
            launch: LaunchSpec {
                binary: flags.binary,
                config_path: flags.config,
                dev_fallback: flags.dev,
            },
        })
    }

    /// Build a lifecycle controller over the production ports.
    #[must_use]
    pub fn controller(&self) -> Controller {
        LifecycleController::new(
            self.process.clone(),
            self.health.clone(),
            self.config_store.clone(),
            self.launch.clone(),
        )
    }

    /// Progress reporter bound to this context's output settings.
    #[must_use]
    pub fn terminal_reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }
}
