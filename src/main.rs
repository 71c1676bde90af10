//! Monitorctl - lifecycle controller for the monitord monitoring agent

use std::process::ExitCode;

use clap::Parser;

use monitorctl::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
