//! `vsl child` — Internal re-entry point (hidden).
//!
//! Invoked by `run` via `/proc/self/exe` after `clone(2)`; already inside
//! the new namespaces when it starts. Not a stable user-facing command.

use clap::Args;

use vessel_common::types::ContainerSpec;

/// Arguments for the internal `child` command.
#[derive(Args, Debug)]
pub struct ChildArgs {
    /// Image whose rootfs to enter.
    pub image: String,

    /// Command to execute inside the container.
    pub command: String,

    /// Arguments passed to the command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Executes container init and exits with the user command's code.
///
/// # Errors
///
/// Returns an error if an isolation step fails; the launcher observes it
/// through this process's non-zero exit and stderr.
pub fn execute(args: ChildArgs) -> anyhow::Result<()> {
    let spec = ContainerSpec::new(args.image, args.command, args.args);
    let code = vessel_runtime::init::run(&spec)?;
    std::process::exit(code);
}
