//! Parent-side run orchestration.
//!
//! The launcher drives the full lifecycle: prepare the rootfs, create the
//! veth pair, start the namespaced child, wire the network across the
//! namespace boundary, attach the cgroup, wait for the child, and tear
//! everything down. Each host resource is registered in the
//! [`CleanupLedger`] the moment its setup succeeds, and the ledger runs on
//! every exit path — success, child failure, or an abort partway through
//! setup — in strict reverse registration order.

use std::path::PathBuf;

use vessel_common::constants;
use vessel_common::error::{Result, VesselError};
use vessel_common::types::ContainerSpec;
use vessel_core::cgroup::{CgroupLimiter, ResourceLimiter};
use vessel_core::namespace::NamespaceSet;
use vessel_core::network::NetworkBridge;
use vessel_image::ImageProvider;
use vessel_image::registry::RegistryPuller;
use vessel_image::store::ImageStore;

use crate::handshake::ReadySignal;
use crate::spawn::{ProcessHandle, spawn_child};

/// A host resource that must be released during teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupAction {
    /// The veth pair (deleting the host end destroys the peer too).
    VethPair,
    /// The masquerade rule for the container subnet.
    NatRule,
    /// The cgroup attached to the given pid.
    Cgroup {
        /// Process the group was created for.
        pid: u32,
    },
}

/// Ordered teardown ledger.
///
/// Actions are registered as their corresponding setup succeeds and
/// executed in reverse registration order. A failing action is logged as
/// a warning and never stops the remaining actions or masks the child's
/// exit result.
#[derive(Debug, Default)]
pub struct CleanupLedger {
    actions: Vec<CleanupAction>,
}

impl CleanupLedger {
    /// Records a completed setup step for later teardown.
    pub fn register(&mut self, action: CleanupAction) {
        self.actions.push(action);
    }

    /// The actions still pending, in registration order.
    #[must_use]
    pub fn pending(&self) -> &[CleanupAction] {
        &self.actions
    }

    /// Executes and drains all registered actions, newest first.
    pub fn run(&mut self, bridge: &NetworkBridge, limiter: &dyn ResourceLimiter) {
        while let Some(action) = self.actions.pop() {
            let outcome = match action {
                CleanupAction::NatRule => bridge.remove_nat(),
                CleanupAction::VethPair => bridge.delete_pair(),
                CleanupAction::Cgroup { pid } => limiter.remove(pid),
            };
            match outcome {
                Ok(()) => tracing::debug!(?action, "cleanup step done"),
                Err(e) => tracing::warn!(?action, error = %e, "cleanup step failed"),
            }
        }
    }
}

/// Parent-side orchestrator for a single container run.
pub struct Launcher {
    store: ImageStore,
    bridge: NetworkBridge,
    provider: Box<dyn ImageProvider>,
    limiter: Box<dyn ResourceLimiter>,
    namespaces: NamespaceSet,
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Launcher {
    /// Creates a launcher with the production collaborators: the fixed
    /// image store, the Docker Hub puller, and the cgroup-v2 limiter.
    #[must_use]
    pub fn new() -> Self {
        let store = ImageStore::default();
        let provider = Box::new(RegistryPuller::new(store.clone()));
        Self {
            store,
            bridge: NetworkBridge::default(),
            provider,
            limiter: Box::new(CgroupLimiter::default()),
            namespaces: NamespaceSet::default(),
        }
    }

    /// Creates a launcher over explicit collaborators, used by tests.
    #[must_use]
    pub fn with_collaborators(
        store: ImageStore,
        provider: Box<dyn ImageProvider>,
        limiter: Box<dyn ResourceLimiter>,
    ) -> Self {
        Self {
            store,
            bridge: NetworkBridge::default(),
            provider,
            limiter,
            namespaces: NamespaceSet::default(),
        }
    }

    /// Ensures a rootfs for `image` exists, pulling it if absent, and
    /// writes the fixed resolver configuration into it.
    ///
    /// # Errors
    ///
    /// Returns `ImageUnavailable` if the pull fails, or `Io` if the
    /// resolver file cannot be written.
    pub fn prepare_rootfs(&self, image: &str) -> Result<PathBuf> {
        if !self.store.is_present(image) {
            tracing::info!(image, "rootfs absent, pulling");
            self.provider.pull(image)?;
        }

        let rootfs = self.store.rootfs_path(image);
        let etc = rootfs.join("etc");
        std::fs::create_dir_all(&etc).map_err(|e| VesselError::Io {
            path: etc.clone(),
            source: e,
        })?;
        let resolv = etc.join("resolv.conf");
        std::fs::write(&resolv, constants::RESOLV_CONF).map_err(|e| VesselError::Io {
            path: resolv,
            source: e,
        })?;

        Ok(rootfs)
    }

    /// Runs the full container lifecycle and returns the user command's
    /// exit code.
    ///
    /// A non-zero code from the user command is a successful run; only
    /// setup failures are errors. Teardown runs on every path once the
    /// first host resource exists.
    ///
    /// # Errors
    ///
    /// Returns the first fatal setup error: `ImageUnavailable`,
    /// `StartFailed`, `NetworkSetupFailed`, or `ResourceLimitFailed`.
    pub fn run(&self, spec: &ContainerSpec) -> Result<i32> {
        let _rootfs = self.prepare_rootfs(&spec.image)?;

        let mut ledger = CleanupLedger::default();

        // The pair must exist on the host before the child is created;
        // the child expects the peer to appear in its namespace.
        self.bridge.create_pair()?;
        ledger.register(CleanupAction::VethPair);

        let outcome = self.launch_and_wait(spec, &mut ledger);
        ledger.run(&self.bridge, self.limiter.as_ref());
        outcome
    }

    fn launch_and_wait(&self, spec: &ContainerSpec, ledger: &mut CleanupLedger) -> Result<i32> {
        let signal = ReadySignal::new()?;
        let handle = spawn_child(spec, &self.namespaces, signal.child_fd())?;

        match self.wire_and_limit(&handle, signal, ledger) {
            Ok(()) => handle.wait(),
            Err(e) => {
                // The child may be blocked on the handshake or already
                // running; it must not outlive an aborted setup.
                handle.kill();
                Err(e)
            }
        }
    }

    fn wire_and_limit(
        &self,
        handle: &ProcessHandle,
        signal: ReadySignal,
        ledger: &mut CleanupLedger,
    ) -> Result<()> {
        let pid = handle.pid();

        self.bridge.move_peer_to(pid)?;
        self.bridge.configure_host()?;
        self.bridge.install_nat()?;
        ledger.register(CleanupAction::NatRule);

        signal.signal()?;

        self.limiter.setup(pid)?;
        ledger.register(CleanupAction::Cgroup { pid });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Limiter that records every call instead of touching cgroupfs.
    #[derive(Debug, Default)]
    struct RecordingLimiter {
        removed: Mutex<Vec<u32>>,
        fail_remove: bool,
    }

    impl ResourceLimiter for RecordingLimiter {
        fn setup(&self, _pid: u32) -> Result<()> {
            Ok(())
        }

        fn remove(&self, pid: u32) -> Result<()> {
            self.removed.lock().expect("lock").push(pid);
            if self.fail_remove {
                Err(VesselError::ResourceLimitFailed {
                    pid,
                    source: std::io::Error::other("injected"),
                })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn ledger_registers_in_setup_order() {
        let mut ledger = CleanupLedger::default();
        ledger.register(CleanupAction::VethPair);
        ledger.register(CleanupAction::NatRule);
        ledger.register(CleanupAction::Cgroup { pid: 1 });
        assert_eq!(
            ledger.pending(),
            &[
                CleanupAction::VethPair,
                CleanupAction::NatRule,
                CleanupAction::Cgroup { pid: 1 },
            ]
        );
    }

    #[test]
    fn ledger_runs_in_reverse_registration_order() {
        let limiter = RecordingLimiter::default();
        let mut ledger = CleanupLedger::default();
        ledger.register(CleanupAction::Cgroup { pid: 1 });
        ledger.register(CleanupAction::Cgroup { pid: 2 });
        ledger.register(CleanupAction::Cgroup { pid: 3 });

        ledger.run(&NetworkBridge::default(), &limiter);

        assert_eq!(*limiter.removed.lock().expect("lock"), vec![3, 2, 1]);
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn ledger_failure_does_not_skip_earlier_actions() {
        let limiter = RecordingLimiter {
            fail_remove: true,
            ..RecordingLimiter::default()
        };
        let mut ledger = CleanupLedger::default();
        // The bridge actions fail too in a test environment; every
        // failure must be swallowed as a warning.
        ledger.register(CleanupAction::VethPair);
        ledger.register(CleanupAction::NatRule);
        ledger.register(CleanupAction::Cgroup { pid: 9 });
        ledger.register(CleanupAction::Cgroup { pid: 10 });

        ledger.run(&NetworkBridge::default(), &limiter);

        assert_eq!(*limiter.removed.lock().expect("lock"), vec![10, 9]);
        assert!(ledger.pending().is_empty());
    }
}
