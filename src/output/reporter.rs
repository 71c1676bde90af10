//! `TerminalReporter` — presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so the lifecycle controller can emit progress events without
//! depending on any presentation type directly. On a TTY, step messages
//! animate a spinner (the health wait can take up to 30 seconds); elsewhere
//! they degrade to plain lines.

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    spinner: Option<ProgressBar>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        let spinner = ctx.show_progress().then(|| progress::spinner(""));
        Self { ctx, spinner }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        match &self.spinner {
            Some(pb) => pb.set_message(message.to_string()),
            None if !self.ctx.quiet => println!("  {} {message}", "→".cyan()),
            None => {}
        }
    }

    fn success(&self, message: &str) {
        match &self.spinner {
            // Keep the spinner live: later steps of a composite operation
            // (stop + start during a toggle) reuse it.
            Some(pb) => {
                pb.println(format!("  {} {message}", "✓".green()));
                pb.set_message(String::new());
            }
            None if !self.ctx.quiet => println!("  {} {message}", "✓".green()),
            None => {}
        }
    }

    fn warn(&self, message: &str) {
        match &self.spinner {
            Some(pb) => pb.println(format!("  {} {message}", "!".yellow())),
            None if !self.ctx.quiet => println!("  {} {message}", "!".yellow()),
            None => {}
        }
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        if let Some(pb) = &self.spinner {
            pb.finish_and_clear();
        }
    }
}
