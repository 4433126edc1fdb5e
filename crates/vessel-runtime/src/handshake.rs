//! Readiness handshake between launcher and container init.
//!
//! The child's network configuration must not run before the host has
//! moved the veth peer into the child's namespace. Relying on scheduling
//! order would be a race, so the launcher creates a pipe before cloning
//! the child, passes the read end's fd number through the environment
//! across `execve`, and writes a single byte once the network wiring is
//! done. The child blocks on that byte; end-of-file means the launcher
//! died or aborted before wiring finished.

use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use vessel_common::constants;
use vessel_common::error::{Result, VesselError};

/// Parent side of the readiness handshake.
///
/// Both pipe ends are held open until [`ReadySignal::signal`] so the
/// child inherits the read end across `clone(2)` and `execve(2)`.
#[derive(Debug)]
pub struct ReadySignal {
    read_end: OwnedFd,
    write_end: OwnedFd,
}

impl ReadySignal {
    /// Creates the readiness pipe.
    ///
    /// # Errors
    ///
    /// Returns `StartFailed` if `pipe(2)` fails.
    pub fn new() -> Result<Self> {
        let (read_end, write_end) =
            nix::unistd::pipe().map_err(|e| VesselError::StartFailed {
                message: format!("failed to create readiness pipe: {e}"),
            })?;
        Ok(Self { read_end, write_end })
    }

    /// The fd number the child must read from, passed via
    /// [`constants::READY_FD_ENV`].
    #[must_use]
    pub fn child_fd(&self) -> RawFd {
        self.read_end.as_raw_fd()
    }

    /// Signals the child that the veth peer is in place, closing both
    /// pipe ends.
    ///
    /// # Errors
    ///
    /// Returns `NetworkSetupFailed` if the byte cannot be written.
    pub fn signal(self) -> Result<()> {
        drop(self.read_end);
        let _ = nix::unistd::write(&self.write_end, b"1").map_err(|e| {
            VesselError::NetworkSetupFailed {
                step: "signal readiness",
                message: e.to_string(),
            }
        })?;
        tracing::debug!("readiness signaled to container");
        Ok(())
    }
}

/// Child side: blocks until the launcher signals readiness.
///
/// Reads the pipe fd number from the environment; the fd was inherited
/// across `clone`/`execve`.
///
/// # Errors
///
/// Returns an error if the environment variable is missing or malformed,
/// or if the pipe reports end-of-file before the signal byte arrives.
pub fn await_ready_from_env() -> Result<()> {
    let raw = std::env::var(constants::READY_FD_ENV).map_err(|e| VesselError::InitFailed {
        step: "await network readiness",
        message: format!("{} not set: {e}", constants::READY_FD_ENV),
    })?;
    let raw: RawFd = raw.parse().map_err(|e| VesselError::InitFailed {
        step: "await network readiness",
        message: format!("invalid fd in {}: {e}", constants::READY_FD_ENV),
    })?;
    // SAFETY: the fd number was placed in the environment by the launcher
    // and refers to the inherited pipe read end, which nothing else in
    // this process owns.
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };
    await_ready(fd)
}

/// Blocks on `fd` until one byte arrives.
///
/// # Errors
///
/// Returns an error on end-of-file (the launcher went away) or a read
/// failure other than `EINTR`.
pub fn await_ready(fd: OwnedFd) -> Result<()> {
    let mut buf = [0u8; 1];
    loop {
        match nix::unistd::read(&fd, &mut buf) {
            Ok(0) => {
                return Err(VesselError::InitFailed {
                    step: "await network readiness",
                    message: "launcher closed the readiness pipe before signaling".into(),
                });
            }
            Ok(_) => {
                tracing::debug!("network readiness received");
                return Ok(());
            }
            Err(nix::errno::Errno::EINTR) => {}
            Err(e) => {
                return Err(VesselError::InitFailed {
                    step: "await network readiness",
                    message: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn await_ready_returns_once_byte_arrives() {
        let (read_end, write_end) = nix::unistd::pipe().expect("pipe");
        let _ = nix::unistd::write(&write_end, b"1").expect("write");
        await_ready(read_end).expect("must unblock on the signal byte");
    }

    #[test]
    fn await_ready_errors_on_eof() {
        let (read_end, write_end) = nix::unistd::pipe().expect("pipe");
        drop(write_end);
        let err = await_ready(read_end).expect_err("EOF must be an error");
        assert!(matches!(err, VesselError::InitFailed { .. }));
    }

    #[test]
    fn signal_closes_both_ends_without_error() {
        let signal = ReadySignal::new().expect("pipe");
        assert!(signal.child_fd() >= 0);
        signal.signal().expect("signal must succeed");
    }

    #[test]
    fn await_from_env_fails_without_variable() {
        // The variable is never set in the test environment.
        let err = await_ready_from_env().expect_err("missing env var must fail");
        assert!(matches!(err, VesselError::InitFailed { .. }));
    }
}
