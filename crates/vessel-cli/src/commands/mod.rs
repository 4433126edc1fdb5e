//! CLI command definitions and dispatch.

pub mod child;
pub mod pull;
pub mod run;

use clap::{Parser, Subcommand};

/// Vessel — minimal single-host container runtime.
#[derive(Parser, Debug)]
#[command(name = "vsl", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch an image's root filesystem into local storage.
    Pull(pull::PullArgs),
    /// Run a command inside an isolated container.
    Run(run::RunArgs),
    /// Internal re-entry point executed inside the new namespaces.
    #[command(hide = true)]
    Child(child::ChildArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Pull(args) => pull::execute(&args),
        Command::Run(args) => run::execute(args),
        Command::Child(args) => child::execute(args),
    }
}
