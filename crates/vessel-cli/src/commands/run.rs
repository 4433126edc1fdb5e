//! `vsl run` — Run a command inside an isolated container.

use clap::Args;

use vessel_common::types::ContainerSpec;
use vessel_runtime::launcher::Launcher;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Image to run (e.g. `alpine`).
    pub image: String,

    /// Command to execute inside the container.
    pub command: String,

    /// Arguments passed to the command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Executes the `run` command.
///
/// The process exits with the user command's exit code; setup failures
/// propagate as errors and exit non-zero.
///
/// # Errors
///
/// Returns an error if any setup step of the run fails.
pub fn execute(args: RunArgs) -> anyhow::Result<()> {
    let spec = ContainerSpec::new(args.image, args.command, args.args);
    let launcher = Launcher::new();
    let code = launcher.run(&spec)?;
    std::process::exit(code);
}
