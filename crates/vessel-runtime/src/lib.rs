//! # vessel-runtime
//!
//! Lifecycle orchestration for the Vessel runtime.
//!
//! Two halves cooperate across a process boundary:
//! - [`launcher`]: the parent side — prepares the rootfs, creates the
//!   namespaced child, wires the veth pair across namespaces, attaches the
//!   cgroup, waits, and unconditionally tears everything down in reverse.
//! - [`init`]: the child side — runs as the entry point inside the new
//!   namespaces, finishes filesystem and network isolation, and executes
//!   the user command.
//!
//! The two are synchronized by a [`handshake`] over a pipe: the child must
//! not configure its network end before the parent has moved the veth peer
//! into its namespace.

pub mod handshake;
pub mod init;
pub mod launcher;
pub mod spawn;
