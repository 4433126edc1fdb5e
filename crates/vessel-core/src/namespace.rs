//! Namespace selection for the container child process.
//!
//! The child is born inside the new namespaces via `clone(2)`; this module
//! only describes which isolation domains are requested and provides the
//! UTS-namespace hostname setter used by container init.

use vessel_common::error::Result;

/// The set of isolation domains requested for the child process.
///
/// Fixed per run; Vessel does not make this configurable per image.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy)]
pub struct NamespaceSet {
    /// Isolate UTS (hostname) namespace.
    pub uts: bool,
    /// Isolate PID namespace.
    pub pid: bool,
    /// Isolate mount namespace.
    pub mount: bool,
    /// Isolate network namespace.
    pub network: bool,
}

impl Default for NamespaceSet {
    fn default() -> Self {
        Self {
            uts: true,
            pid: true,
            mount: true,
            network: true,
        }
    }
}

#[cfg(target_os = "linux")]
impl NamespaceSet {
    /// Converts the set into `clone(2)` flags.
    #[must_use]
    pub fn clone_flags(&self) -> nix::sched::CloneFlags {
        use nix::sched::CloneFlags;

        let mut flags = CloneFlags::empty();
        if self.uts {
            flags |= CloneFlags::CLONE_NEWUTS;
        }
        if self.pid {
            flags |= CloneFlags::CLONE_NEWPID;
        }
        if self.mount {
            flags |= CloneFlags::CLONE_NEWNS;
        }
        if self.network {
            flags |= CloneFlags::CLONE_NEWNET;
        }
        flags
    }
}

/// Sets the hostname inside the container's UTS namespace.
///
/// # Errors
///
/// Returns an error if `sethostname(2)` fails.
#[cfg(target_os = "linux")]
pub fn set_hostname(hostname: &str) -> Result<()> {
    nix::unistd::sethostname(hostname).map_err(|e| {
        vessel_common::error::VesselError::InitFailed {
            step: "set hostname",
            message: e.to_string(),
        }
    })?;
    tracing::debug!(hostname, "hostname set");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — UTS namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn set_hostname(_hostname: &str) -> Result<()> {
    Err(vessel_common::error::VesselError::InitFailed {
        step: "set hostname",
        message: "Linux required for container operations".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_isolates_all_four_domains() {
        let set = NamespaceSet::default();
        assert!(set.uts && set.pid && set.mount && set.network);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn clone_flags_match_selected_domains() {
        use nix::sched::CloneFlags;

        let set = NamespaceSet {
            uts: true,
            pid: false,
            mount: true,
            network: false,
        };
        let flags = set.clone_flags();
        assert!(flags.contains(CloneFlags::CLONE_NEWUTS));
        assert!(flags.contains(CloneFlags::CLONE_NEWNS));
        assert!(!flags.contains(CloneFlags::CLONE_NEWPID));
        assert!(!flags.contains(CloneFlags::CLONE_NEWNET));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn default_clone_flags_cover_full_set() {
        use nix::sched::CloneFlags;

        let flags = NamespaceSet::default().clone_flags();
        assert_eq!(
            flags,
            CloneFlags::CLONE_NEWUTS
                | CloneFlags::CLONE_NEWPID
                | CloneFlags::CLONE_NEWNS
                | CloneFlags::CLONE_NEWNET
        );
    }
}
