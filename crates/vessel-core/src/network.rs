//! Host/container veth pair and masquerade NAT management.
//!
//! Single-subnet design: one fixed private subnet with the host at `.1`
//! and the container at `.2`, and deterministic interface names. The pair
//! and the NAT rule are system-wide singleton resources for the duration
//! of a run; a second concurrent run would conflict on both.
//!
//! All operations shell out to `ip(8)` and `iptables(8)` and check the
//! exit status, mirroring how the container-side configuration must run
//! against the image's own `ip` binary after chroot.

use std::process::Command;

use vessel_common::constants;
use vessel_common::error::{Result, VesselError};

/// A point-to-point virtual link between the host and the container
/// network namespace, plus the masquerade rule for its subnet.
#[derive(Debug, Clone)]
pub struct NetworkBridge {
    /// Host-side interface name.
    pub host_link: String,
    /// Container-side (peer) interface name.
    pub peer_link: String,
    /// Host address with prefix length.
    pub host_cidr: String,
    /// Container address with prefix length.
    pub container_cidr: String,
    /// Container default gateway (host address, no prefix).
    pub gateway: String,
    /// Subnet masqueraded to the host address.
    pub subnet: String,
}

impl Default for NetworkBridge {
    fn default() -> Self {
        Self {
            host_link: constants::HOST_LINK.into(),
            peer_link: constants::PEER_LINK.into(),
            host_cidr: constants::HOST_CIDR.into(),
            container_cidr: constants::CONTAINER_CIDR.into(),
            gateway: constants::HOST_ADDR.into(),
            subnet: constants::SUBNET.into(),
        }
    }
}

impl NetworkBridge {
    /// Creates the veth pair on the host.
    ///
    /// Must happen before the child process starts so the peer exists to
    /// be moved into its namespace.
    ///
    /// # Errors
    ///
    /// Returns `NetworkSetupFailed` if `ip link add` fails.
    pub fn create_pair(&self) -> Result<()> {
        run_checked(
            "ip",
            &[
                "link", "add", &self.host_link, "type", "veth", "peer", "name", &self.peer_link,
            ],
            "create veth pair",
        )?;
        tracing::debug!(host = %self.host_link, peer = %self.peer_link, "veth pair created");
        Ok(())
    }

    /// Moves the peer interface into the network namespace of `pid`.
    ///
    /// # Errors
    ///
    /// Returns `NetworkSetupFailed` if `ip link set … netns` fails.
    pub fn move_peer_to(&self, pid: u32) -> Result<()> {
        let pid_str = pid.to_string();
        run_checked(
            "ip",
            &["link", "set", &self.peer_link, "netns", &pid_str],
            "move peer into container namespace",
        )?;
        tracing::debug!(peer = %self.peer_link, pid, "peer moved into container namespace");
        Ok(())
    }

    /// Assigns the host address to the host end and brings it up.
    ///
    /// # Errors
    ///
    /// Returns `NetworkSetupFailed` if either `ip` invocation fails.
    pub fn configure_host(&self) -> Result<()> {
        run_checked(
            "ip",
            &["addr", "add", &self.host_cidr, "dev", &self.host_link],
            "assign host address",
        )?;
        run_checked(
            "ip",
            &["link", "set", &self.host_link, "up"],
            "bring host link up",
        )?;
        tracing::debug!(link = %self.host_link, addr = %self.host_cidr, "host end configured");
        Ok(())
    }

    /// Installs the masquerade rule for the container subnet.
    ///
    /// # Errors
    ///
    /// Returns `NetworkSetupFailed` if `iptables` fails.
    pub fn install_nat(&self) -> Result<()> {
        run_checked(
            "iptables",
            &[
                "-t", "nat", "-A", "POSTROUTING", "-s", &self.subnet, "-j", "MASQUERADE",
            ],
            "install NAT rule",
        )?;
        tracing::debug!(subnet = %self.subnet, "NAT rule installed");
        Ok(())
    }

    /// Removes the masquerade rule.
    ///
    /// # Errors
    ///
    /// Returns `NetworkSetupFailed` if `iptables` fails; callers tearing
    /// down treat this as a warning.
    pub fn remove_nat(&self) -> Result<()> {
        run_checked(
            "iptables",
            &[
                "-t", "nat", "-D", "POSTROUTING", "-s", &self.subnet, "-j", "MASQUERADE",
            ],
            "remove NAT rule",
        )
    }

    /// Deletes the veth pair.
    ///
    /// Deleting the host end also destroys the peer, wherever its
    /// namespace ended up.
    ///
    /// # Errors
    ///
    /// Returns `NetworkSetupFailed` if `ip link delete` fails; callers
    /// tearing down treat this as a warning.
    pub fn delete_pair(&self) -> Result<()> {
        run_checked(
            "ip",
            &["link", "delete", &self.host_link],
            "delete veth pair",
        )
    }

    /// Configures the container end from inside the container: assigns
    /// the container address to the peer, brings it up, and adds the
    /// default route via the host.
    ///
    /// Must only run after the host has moved the peer into this
    /// namespace; the runtime enforces that with a readiness handshake.
    ///
    /// # Errors
    ///
    /// Returns `NetworkSetupFailed` if any `ip` invocation fails.
    pub fn configure_container(&self) -> Result<()> {
        run_checked(
            "ip",
            &["addr", "add", &self.container_cidr, "dev", &self.peer_link],
            "assign container address",
        )?;
        run_checked(
            "ip",
            &["link", "set", &self.peer_link, "up"],
            "bring peer link up",
        )?;
        run_checked(
            "ip",
            &["route", "add", "default", "via", &self.gateway],
            "add default route",
        )?;
        tracing::debug!(link = %self.peer_link, addr = %self.container_cidr, "container end configured");
        Ok(())
    }
}

/// Runs a command and maps a non-zero exit or spawn failure to
/// `NetworkSetupFailed` naming the step.
fn run_checked(program: &str, args: &[&str], step: &'static str) -> Result<()> {
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| VesselError::NetworkSetupFailed {
            step,
            message: format!("failed to run {program}: {e}"),
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(VesselError::NetworkSetupFailed {
            step,
            message: format!("`{program} {}` exited with {status}", args.join(" ")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bridge_uses_fixed_parameters() {
        let bridge = NetworkBridge::default();
        assert_eq!(bridge.host_link, "veth0");
        assert_eq!(bridge.peer_link, "veth1");
        assert_eq!(bridge.host_cidr, "10.0.0.1/24");
        assert_eq!(bridge.container_cidr, "10.0.0.2/24");
        assert_eq!(bridge.gateway, "10.0.0.1");
        assert_eq!(bridge.subnet, "10.0.0.0/24");
    }

    #[test]
    fn run_checked_reports_failing_command() {
        let err = run_checked("false", &[], "probe").expect_err("false must fail");
        assert!(matches!(
            err,
            VesselError::NetworkSetupFailed { step: "probe", .. }
        ));
    }

    #[test]
    fn run_checked_reports_missing_program() {
        let err = run_checked("definitely-not-a-real-binary", &[], "probe")
            .expect_err("missing binary must fail");
        assert!(matches!(err, VesselError::NetworkSetupFailed { .. }));
    }

    #[test]
    fn run_checked_succeeds_on_zero_exit() {
        run_checked("true", &[], "probe").expect("true must succeed");
    }
}
