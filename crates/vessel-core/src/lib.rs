//! # vessel-core
//!
//! Low-level Linux isolation primitives for the Vessel runtime.
//!
//! This crate provides safe abstractions over:
//! - **Namespaces**: the UTS/PID/mount/network namespace set and hostname.
//! - **Cgroups v2**: creating, attaching, and removing the per-container
//!   resource group.
//! - **Mounts**: bind mounts, chroot entry, and the pseudo-filesystems a
//!   container needs (`/proc`, `/sys`, `/sys/fs/cgroup`, `/dev`).
//! - **Networking**: the host/container veth pair and the masquerade rule.
//!
//! All unsafe system calls are encapsulated in safe wrappers with proper
//! error handling and `// SAFETY:` documentation.

pub mod cgroup;
pub mod mount;
pub mod namespace;
pub mod network;
