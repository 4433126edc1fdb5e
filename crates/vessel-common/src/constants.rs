//! System-wide constants and fixed runtime parameters.
//!
//! The network layout and on-disk paths are deliberately not configurable:
//! Vessel supports one container at a time, so the interface names, subnet,
//! and addresses are a system-wide singleton.

use std::path::{Path, PathBuf};

/// Base directory for Vessel data on the host.
pub const DATA_DIR: &str = "/var/lib/vessel";

/// Directory holding one root filesystem tree per image.
pub const IMAGE_FS_DIR: &str = "/var/lib/vessel/fs";

/// Host directory bind-mounted into every container at `/volume`.
pub const VOLUME_SOURCE_DIR: &str = "/var/lib/vessel/volume";

/// Hostname set inside every container's UTS namespace.
pub const CONTAINER_HOSTNAME: &str = "vessel";

/// Resolver configuration written into every prepared image root.
pub const RESOLV_CONF: &str = "nameserver 1.1.1.1\n";

/// Host-side end of the veth pair.
pub const HOST_LINK: &str = "veth0";

/// Container-side end of the veth pair.
pub const PEER_LINK: &str = "veth1";

/// Host address on the container subnet, with prefix length.
pub const HOST_CIDR: &str = "10.0.0.1/24";

/// Container address on the container subnet, with prefix length.
pub const CONTAINER_CIDR: &str = "10.0.0.2/24";

/// Host address without the prefix, used as the container's default gateway.
pub const HOST_ADDR: &str = "10.0.0.1";

/// The container subnet masqueraded to the host's address.
pub const SUBNET: &str = "10.0.0.0/24";

/// Cgroups v2 unified hierarchy mount point.
pub const CGROUP_V2_PATH: &str = "/sys/fs/cgroup";

/// Parent directory for per-container cgroups under the unified hierarchy.
pub const CGROUP_PARENT: &str = "vessel";

/// Environment variable carrying the readiness-pipe fd into the child.
pub const READY_FD_ENV: &str = "VESSEL_READY_FD";

/// Application name used in CLI output.
pub const APP_NAME: &str = "vessel";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "vsl";

/// Returns the root filesystem directory for an image under `base`.
///
/// Slashes and colons in the image name are flattened so a reference like
/// `library/alpine:3.20` maps to a single directory component.
#[must_use]
pub fn image_rootfs(base: &Path, image: &str) -> PathBuf {
    base.join(sanitize_image_name(image))
}

/// Flattens an image reference into a filesystem-safe directory name.
#[must_use]
pub fn sanitize_image_name(image: &str) -> String {
    image
        .chars()
        .map(|c| if c == '/' || c == ':' { '_' } else { c })
        .collect()
}
