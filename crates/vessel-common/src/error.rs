//! Unified error types for the Vessel workspace.
//!
//! Setup-phase failures are fatal to a run and carry context naming the
//! failing step. Teardown failures are never represented here — they are
//! logged as warnings and must not mask the child's exit result.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum VesselError {
    /// The image could not be resolved to a local root filesystem.
    #[error("image {image} unavailable: {reason}")]
    ImageUnavailable {
        /// Image name as given on the command line.
        image: String,
        /// Why retrieval failed (not found, network, integrity).
        reason: String,
    },

    /// Creating the namespaced child process failed.
    #[error("failed to start container process: {message}")]
    StartFailed {
        /// Underlying clone/exec failure.
        message: String,
    },

    /// A host-side network wiring step failed.
    #[error("network setup failed at {step}: {message}")]
    NetworkSetupFailed {
        /// Which wiring step broke (e.g. "create veth pair").
        step: &'static str,
        /// Underlying command or syscall failure.
        message: String,
    },

    /// The cgroup could not be created or the process not attached.
    #[error("resource limit setup failed for pid {pid}: {source}")]
    ResourceLimitFailed {
        /// Process the limit was being attached to.
        pid: u32,
        /// Underlying I/O error from the cgroup filesystem.
        source: std::io::Error,
    },

    /// The user command inside the container could not be executed.
    #[error("failed to execute container command: {message}")]
    ChildExecutionFailed {
        /// Underlying spawn failure.
        message: String,
    },

    /// A container-side isolation step (mount, chroot, hostname) failed.
    #[error("container init failed at {step}: {message}")]
    InitFailed {
        /// Which isolation step broke.
        step: &'static str,
        /// Underlying syscall failure.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, VesselError>;
