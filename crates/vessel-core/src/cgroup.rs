//! Cgroups v2 resource limiting.
//!
//! Each container gets one group under `/sys/fs/cgroup/vessel/<pid>` with
//! fixed default limits. Attachment is idempotent and removal tolerates a
//! group that is already gone, so teardown can run redundantly.

use std::path::PathBuf;

use vessel_common::constants;
use vessel_common::error::{Result, VesselError};
use vessel_common::types::ResourceLimits;

/// Attaches and detaches processes to a resource-constrained cgroup.
///
/// The trait seam lets the launcher be exercised without root privileges.
pub trait ResourceLimiter {
    /// Creates the group for `pid`, applies limits, and attaches the
    /// process. Idempotent if the group already exists.
    ///
    /// # Errors
    ///
    /// Returns `ResourceLimitFailed` if the cgroup filesystem rejects any
    /// write.
    fn setup(&self, pid: u32) -> Result<()>;

    /// Removes the group for `pid`. An already-removed group is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `ResourceLimitFailed` if an existing group cannot be
    /// removed.
    fn remove(&self, pid: u32) -> Result<()>;
}

/// Cgroups v2 implementation writing directly to the unified hierarchy.
#[derive(Debug, Clone)]
pub struct CgroupLimiter {
    root: PathBuf,
    limits: ResourceLimits,
}

impl Default for CgroupLimiter {
    fn default() -> Self {
        Self {
            root: PathBuf::from(constants::CGROUP_V2_PATH),
            limits: ResourceLimits::default(),
        }
    }
}

impl CgroupLimiter {
    /// Creates a limiter rooted at a custom hierarchy path, used by tests.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>, limits: ResourceLimits) -> Self {
        Self {
            root: root.into(),
            limits,
        }
    }

    /// Returns the group directory for `pid`.
    #[must_use]
    pub fn group_path(&self, pid: u32) -> PathBuf {
        self.root
            .join(constants::CGROUP_PARENT)
            .join(pid.to_string())
    }

    fn write_control(&self, pid: u32, file: &str, value: &str) -> Result<()> {
        let path = self.group_path(pid).join(file);
        std::fs::write(&path, value).map_err(|e| VesselError::ResourceLimitFailed {
            pid,
            source: e,
        })
    }
}

impl ResourceLimiter for CgroupLimiter {
    fn setup(&self, pid: u32) -> Result<()> {
        let group = self.group_path(pid);
        std::fs::create_dir_all(&group).map_err(|e| VesselError::ResourceLimitFailed {
            pid,
            source: e,
        })?;

        self.write_control(pid, "memory.max", &self.limits.memory_bytes.to_string())?;
        self.write_control(pid, "pids.max", &self.limits.pids_max.to_string())?;
        self.write_control(pid, "cpu.weight", &self.limits.cpu_weight.to_string())?;
        self.write_control(pid, "cgroup.procs", &pid.to_string())?;

        tracing::info!(pid, path = %group.display(), "cgroup attached");
        Ok(())
    }

    fn remove(&self, pid: u32) -> Result<()> {
        let group = self.group_path(pid);
        if !group.exists() {
            tracing::debug!(pid, "cgroup already removed");
            return Ok(());
        }
        // Control files vanish with the directory; cgroupfs only supports
        // rmdir, never recursive unlink.
        std::fs::remove_dir(&group).map_err(|e| VesselError::ResourceLimitFailed {
            pid,
            source: e,
        })?;
        tracing::info!(pid, path = %group.display(), "cgroup removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(dir: &std::path::Path) -> CgroupLimiter {
        CgroupLimiter::with_root(dir, ResourceLimits::default())
    }

    #[test]
    fn setup_writes_limits_and_attaches_pid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let limiter = limiter(dir.path());

        limiter.setup(4242).expect("setup failed");

        let group = limiter.group_path(4242);
        let memory = std::fs::read_to_string(group.join("memory.max")).expect("read");
        assert_eq!(memory, ResourceLimits::default().memory_bytes.to_string());
        let procs = std::fs::read_to_string(group.join("cgroup.procs")).expect("read");
        assert_eq!(procs, "4242");
    }

    #[test]
    fn setup_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let limiter = limiter(dir.path());

        limiter.setup(7).expect("first setup failed");
        limiter.setup(7).expect("second setup failed");
    }

    #[test]
    fn remove_deletes_an_empty_group() {
        let dir = tempfile::tempdir().expect("tempdir");
        let limiter = limiter(dir.path());

        // On cgroupfs the control files disappear with the rmdir; a plain
        // filesystem stands in for an already-emptied group here.
        std::fs::create_dir_all(limiter.group_path(99)).expect("mkdir");
        limiter.remove(99).expect("remove failed");
        assert!(!limiter.group_path(99).exists());
    }

    #[test]
    fn remove_tolerates_missing_group() {
        let dir = tempfile::tempdir().expect("tempdir");
        let limiter = limiter(dir.path());

        limiter.remove(31337).expect("remove of absent group failed");
        limiter.remove(31337).expect("redundant remove failed");
    }
}
