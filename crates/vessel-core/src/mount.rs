//! Mount utilities for container filesystem setup.
//!
//! Handles the volume bind mount, chroot entry, and the pseudo-filesystems
//! (`/proc`, `/sys`, `/sys/fs/cgroup`, `/dev`) mounted inside the
//! container's mount namespace.

use std::path::Path;

use vessel_common::error::{Result, VesselError};

/// Pseudo-filesystems mounted inside the container, in mount order.
///
/// Unmounting walks this list in reverse.
#[cfg(target_os = "linux")]
const PSEUDO_FILESYSTEMS: [(&str, &str, &str); 4] = [
    ("proc", "/proc", "proc"),
    ("sysfs", "/sys", "sysfs"),
    ("cgroup2", "/sys/fs/cgroup", "cgroup2"),
    ("dev", "/dev", "devtmpfs"),
];

/// Remounts `/` recursively private so mount events never propagate
/// to or from the host mount namespace.
///
/// # Errors
///
/// Returns an error if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn make_mounts_private() -> Result<()> {
    use nix::mount::{MsFlags, mount};

    mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_REC | MsFlags::MS_PRIVATE,
        None::<&str>,
    )
    .map_err(|e| VesselError::InitFailed {
        step: "make mounts private",
        message: e.to_string(),
    })?;
    tracing::debug!("mount propagation set to private");
    Ok(())
}

/// Bind-mounts `source` at `target`, read-write, private propagation.
///
/// The target directory is created if it does not exist.
///
/// # Errors
///
/// Returns an error if directory creation or the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn bind_mount(source: &Path, target: &Path) -> Result<()> {
    use nix::mount::{MsFlags, mount};

    std::fs::create_dir_all(target).map_err(|e| VesselError::Io {
        path: target.to_path_buf(),
        source: e,
    })?;

    mount(
        Some(source),
        target,
        None::<&str>,
        MsFlags::MS_BIND | MsFlags::MS_PRIVATE,
        None::<&str>,
    )
    .map_err(|e| VesselError::InitFailed {
        step: "bind mount volume",
        message: format!("{} -> {}: {e}", source.display(), target.display()),
    })?;
    tracing::debug!(
        source = %source.display(),
        target = %target.display(),
        "volume bind-mounted"
    );
    Ok(())
}

/// Changes the process root to `rootfs` and the working directory to `/`.
///
/// # Errors
///
/// Returns an error if `chroot(2)` or `chdir(2)` fails.
#[cfg(target_os = "linux")]
pub fn enter_rootfs(rootfs: &Path) -> Result<()> {
    nix::unistd::chroot(rootfs).map_err(|e| VesselError::InitFailed {
        step: "chroot",
        message: format!("{}: {e}", rootfs.display()),
    })?;
    nix::unistd::chdir("/").map_err(|e| VesselError::InitFailed {
        step: "chdir to /",
        message: e.to_string(),
    })?;
    tracing::debug!(rootfs = %rootfs.display(), "entered rootfs");
    Ok(())
}

/// Mounts `/proc`, `/sys`, `/sys/fs/cgroup`, and `/dev` inside the
/// container root, in that order.
///
/// # Errors
///
/// Returns an error naming the filesystem whose `mount(2)` call failed.
#[cfg(target_os = "linux")]
pub fn mount_pseudo_filesystems() -> Result<()> {
    use nix::mount::{MsFlags, mount};

    for (source, target, fstype) in PSEUDO_FILESYSTEMS {
        mount(
            Some(source),
            target,
            Some(fstype),
            MsFlags::empty(),
            None::<&str>,
        )
        .map_err(|e| VesselError::InitFailed {
            step: "mount pseudo-filesystem",
            message: format!("{fstype} at {target}: {e}"),
        })?;
        tracing::debug!(target, fstype, "mounted");
    }
    Ok(())
}

/// Unmounts the pseudo-filesystems in reverse mount order.
///
/// Best-effort: each failure is logged as a warning and the remaining
/// unmounts still run.
#[cfg(target_os = "linux")]
pub fn unmount_pseudo_filesystems() {
    for &(_, target, fstype) in PSEUDO_FILESYSTEMS.iter().rev() {
        match nix::mount::umount(target) {
            Ok(()) => tracing::debug!(target, "unmounted"),
            Err(e) => tracing::warn!(target, fstype, error = %e, "failed to unmount"),
        }
    }
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — mount namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn make_mounts_private() -> Result<()> {
    Err(non_linux("make mounts private"))
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — bind mounts require Linux.
#[cfg(not(target_os = "linux"))]
pub fn bind_mount(_source: &Path, _target: &Path) -> Result<()> {
    Err(non_linux("bind mount volume"))
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — chroot entry requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn enter_rootfs(_rootfs: &Path) -> Result<()> {
    Err(non_linux("chroot"))
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — pseudo-filesystems require Linux.
#[cfg(not(target_os = "linux"))]
pub fn mount_pseudo_filesystems() -> Result<()> {
    Err(non_linux("mount pseudo-filesystem"))
}

/// Stub for non-Linux platforms. Does nothing.
#[cfg(not(target_os = "linux"))]
pub fn unmount_pseudo_filesystems() {}

#[cfg(not(target_os = "linux"))]
fn non_linux(step: &'static str) -> VesselError {
    VesselError::InitFailed {
        step,
        message: "Linux required for container operations".into(),
    }
}
