//! Container-side init: the entry point of the `child` re-exec.
//!
//! Runs already inside the new namespaces. Finishes filesystem and
//! network isolation, executes the user command with inherited stdio,
//! and unmounts what it mounted. The returned exit code becomes this
//! process's exit code, which the launcher observes as the run result.

use std::path::Path;
use std::process::Command;

use vessel_common::constants;
use vessel_common::error::{Result, VesselError};
use vessel_common::types::ContainerSpec;
use vessel_core::network::NetworkBridge;
use vessel_core::{mount, namespace};
use vessel_image::store::ImageStore;

use crate::handshake;

/// Completes isolation and runs the user command, returning its exit
/// code.
///
/// # Errors
///
/// Returns an error if any isolation step fails or the user command
/// cannot be spawned. Unmount failures after the command are warnings
/// only and never change the returned code.
pub fn run(spec: &ContainerSpec) -> Result<i32> {
    tracing::info!(
        image = %spec.image,
        command = %spec.command,
        "container init starting"
    );

    let rootfs = ImageStore::default().rootfs_path(&spec.image);

    mount::make_mounts_private()?;
    mount::bind_mount(
        Path::new(constants::VOLUME_SOURCE_DIR),
        &rootfs.join("volume"),
    )?;
    mount::enter_rootfs(&rootfs)?;
    mount::mount_pseudo_filesystems()?;
    namespace::set_hostname(constants::CONTAINER_HOSTNAME)?;

    // The peer interface only exists in this namespace once the launcher
    // has moved it; block until it says so.
    handshake::await_ready_from_env()?;
    NetworkBridge::default().configure_container()?;

    let code = run_user_command(spec);
    mount::unmount_pseudo_filesystems();
    code
}

/// Spawns the user command with inherited standard streams and maps its
/// termination to an exit code.
fn run_user_command(spec: &ContainerSpec) -> Result<i32> {
    let status = Command::new(&spec.command)
        .args(&spec.args)
        .status()
        .map_err(|e| VesselError::ChildExecutionFailed {
            message: format!("{}: {e}", spec.command),
        })?;

    Ok(exit_code(&status))
}

/// Maps an exit status to a code, using `128 + signal` for signal
/// deaths.
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        status
            .code()
            .or_else(|| status.signal().map(|s| 128 + s))
            .unwrap_or(1)
    }
    #[cfg(not(unix))]
    {
        status.code().unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(command: &str, args: &[&str]) -> std::process::ExitStatus {
        Command::new(command)
            .args(args)
            .status()
            .expect("spawn test command")
    }

    #[test]
    fn exit_code_passes_through_success() {
        assert_eq!(exit_code(&status_of("true", &[])), 0);
    }

    #[test]
    fn exit_code_passes_through_failure() {
        assert_eq!(exit_code(&status_of("false", &[])), 1);
    }

    #[test]
    fn exit_code_passes_through_custom_codes() {
        assert_eq!(exit_code(&status_of("sh", &["-c", "exit 42"])), 42);
    }

    #[test]
    fn missing_command_is_child_execution_failure() {
        let spec = ContainerSpec::new("alpine", "/definitely/not/a/binary", Vec::new());
        let err = run_user_command(&spec).expect_err("missing binary must fail");
        assert!(matches!(err, VesselError::ChildExecutionFailed { .. }));
    }
}
