//! # vessel-image
//!
//! Image retrieval and root filesystem storage for the Vessel runtime.
//!
//! Handles:
//! - **Store**: the on-disk layout of one rootfs tree per image name.
//! - **Manifest**: Docker Registry v2 / OCI manifest parsing.
//! - **Registry**: anonymous Docker Hub pull with token auth, digest
//!   verification, and layer extraction.

pub mod manifest;
pub mod registry;
pub mod store;

use vessel_common::error::Result;

/// Resolves an image name to a root filesystem tree on disk.
///
/// Implementations must be idempotent: a rootfs that already exists is
/// left untouched. All retrieval failures (not found, network, integrity)
/// surface as `ImageUnavailable`.
pub trait ImageProvider {
    /// Fetches and unpacks `image` into its deterministic rootfs path.
    ///
    /// # Errors
    ///
    /// Returns `ImageUnavailable` with the underlying reason on failure.
    fn pull(&self, image: &str) -> Result<()>;
}
