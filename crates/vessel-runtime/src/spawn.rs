//! Namespaced child process creation.
//!
//! Two-phase handoff: `clone(2)` creates a process already inside the new
//! UTS/PID/mount/network namespaces, and that process immediately
//! re-executes `/proc/self/exe` with the hidden `child` subcommand, which
//! completes isolation before running the user workload.

use std::os::fd::RawFd;

use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;

use vessel_common::error::{Result, VesselError};
use vessel_common::types::ContainerSpec;
use vessel_core::namespace::NamespaceSet;

/// Stack for the cloned child; it only lives long enough to `execve`.
#[cfg(target_os = "linux")]
const CHILD_STACK_SIZE: usize = 1024 * 1024;

/// The launcher's handle on the running container process.
///
/// Owned exclusively by the parent; container init never observes it.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Pid,
}

impl ProcessHandle {
    /// Wraps an existing child pid.
    #[must_use]
    pub const fn new(pid: Pid) -> Self {
        Self { pid }
    }

    /// The child's process id as seen from the host.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid.as_raw().unsigned_abs()
    }

    /// Blocks until the child terminates and returns its exit code.
    ///
    /// A signal death maps to `128 + signal`, the shell convention.
    ///
    /// # Errors
    ///
    /// Returns `ChildExecutionFailed` if the wait itself fails.
    pub fn wait(&self) -> Result<i32> {
        loop {
            let status = nix::sys::wait::waitpid(self.pid, None).map_err(|e| {
                VesselError::ChildExecutionFailed {
                    message: format!("waitpid({}) failed: {e}", self.pid),
                }
            })?;
            if let Some(code) = wait_status_code(&status) {
                tracing::debug!(pid = %self.pid, code, "container process exited");
                return Ok(code);
            }
        }
    }

    /// Force-terminates and reaps the child; used on abort paths so
    /// teardown never runs under a live container.
    ///
    /// Best-effort: failures are logged as warnings.
    pub fn kill(&self) {
        use nix::sys::signal::Signal;

        match nix::sys::signal::kill(self.pid, Signal::SIGKILL) {
            Ok(()) => {
                if let Err(e) = nix::sys::wait::waitpid(self.pid, None) {
                    tracing::warn!(pid = %self.pid, error = %e, "failed to reap killed container");
                }
            }
            Err(e) => tracing::warn!(pid = %self.pid, error = %e, "failed to kill container"),
        }
    }
}

/// Maps a wait status to a final exit code, if the status is terminal.
fn wait_status_code(status: &WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(*code),
        WaitStatus::Signaled(_, signal, _) => Some(128 + *signal as i32),
        _ => None,
    }
}

/// Creates the container child: a process born inside the requested
/// namespaces that immediately becomes `vsl child <image> <command> …`.
///
/// The readiness pipe fd travels to the child through its environment.
///
/// # Errors
///
/// Returns `StartFailed` if argument encoding or `clone(2)` fails.
#[cfg(target_os = "linux")]
pub fn spawn_child(
    spec: &ContainerSpec,
    namespaces: &NamespaceSet,
    ready_fd: RawFd,
) -> Result<ProcessHandle> {
    use std::ffi::CString;

    let exe = cstring("/proc/self/exe")?;
    let mut argv = vec![
        cstring(vessel_common::constants::BIN_NAME)?,
        cstring("child")?,
        cstring(&spec.image)?,
        cstring(&spec.command)?,
    ];
    for arg in &spec.args {
        argv.push(cstring(arg)?);
    }

    let mut envp = Vec::new();
    for (key, value) in std::env::vars() {
        envp.push(cstring(&format!("{key}={value}"))?);
    }
    envp.push(cstring(&format!(
        "{}={ready_fd}",
        vessel_common::constants::READY_FD_ENV
    ))?);

    let mut stack = vec![0u8; CHILD_STACK_SIZE];

    // SAFETY: the callback only execs; it touches no parent-owned memory
    // beyond the argv/envp buffers that stay alive until clone returns,
    // and the stack buffer outlives the callback on both error and exec.
    let pid = unsafe {
        nix::sched::clone(
            Box::new(|| {
                // Runs inside the new namespaces with inherited stdio and
                // fds; replace ourselves with the child re-entry point.
                // execve only returns on failure.
                let _ = nix::unistd::execve(&exe, argv.as_slice(), envp.as_slice());
                127
            }),
            &mut stack,
            namespaces.clone_flags(),
            Some(libc::SIGCHLD),
        )
    }
    .map_err(|e| VesselError::StartFailed {
        message: format!("clone failed: {e}"),
    })?;

    tracing::info!(pid = %pid, image = %spec.image, "container process started");
    Ok(ProcessHandle::new(pid))
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns `StartFailed` — namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn spawn_child(
    _spec: &ContainerSpec,
    _namespaces: &NamespaceSet,
    _ready_fd: RawFd,
) -> Result<ProcessHandle> {
    Err(VesselError::StartFailed {
        message: "Linux required for container operations".into(),
    })
}

#[cfg(target_os = "linux")]
fn cstring(s: &str) -> Result<std::ffi::CString> {
    std::ffi::CString::new(s).map_err(|e| VesselError::StartFailed {
        message: format!("argument contains NUL byte: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_status_passes_through() {
        let status = WaitStatus::Exited(Pid::from_raw(42), 3);
        assert_eq!(wait_status_code(&status), Some(3));
    }

    #[test]
    fn signal_death_maps_to_shell_convention() {
        use nix::sys::signal::Signal;

        let status = WaitStatus::Signaled(Pid::from_raw(42), Signal::SIGKILL, false);
        assert_eq!(wait_status_code(&status), Some(137));
    }

    #[test]
    fn non_terminal_status_is_ignored() {
        use nix::sys::signal::Signal;

        let status = WaitStatus::Stopped(Pid::from_raw(42), Signal::SIGSTOP);
        assert_eq!(wait_status_code(&status), None);
    }

    #[test]
    fn handle_reports_pid() {
        let handle = ProcessHandle::new(Pid::from_raw(4242));
        assert_eq!(handle.pid(), 4242);
    }
}
