//! Domain primitive types used across the Vessel workspace.

use serde::{Deserialize, Serialize};

/// Immutable input to a single container run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Image name as given on the command line (e.g. `alpine`).
    pub image: String,
    /// Command to execute inside the container.
    pub command: String,
    /// Arguments passed to the command.
    pub args: Vec<String>,
}

impl ContainerSpec {
    /// Creates a new spec from an image name, command, and arguments.
    #[must_use]
    pub fn new(image: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            image: image.into(),
            command: command.into(),
            args,
        }
    }
}

/// Resource limits applied to a container's cgroup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Memory ceiling in bytes (`memory.max`).
    pub memory_bytes: u64,
    /// Maximum number of processes (`pids.max`).
    pub pids_max: u64,
    /// CPU weight, 1-10000 (`cpu.weight`).
    pub cpu_weight: u16,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory_bytes: 256 * 1024 * 1024,
            pids_max: 128,
            cpu_weight: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_stores_image_command_and_args() {
        let spec = ContainerSpec::new("alpine", "echo", vec!["hi".into()]);
        assert_eq!(spec.image, "alpine");
        assert_eq!(spec.command, "echo");
        assert_eq!(spec.args, vec!["hi"]);
    }

    #[test]
    fn default_limits_are_sane() {
        let limits = ResourceLimits::default();
        assert!(limits.memory_bytes > 0);
        assert!(limits.pids_max > 0);
        assert!((1..=10_000).contains(&limits.cpu_weight));
    }
}
