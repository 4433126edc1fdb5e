//! On-disk root filesystem storage.
//!
//! One directory per image under the fixed base path; the tree is reused
//! across runs of the same image and only replaced by an explicit pull.

use std::path::{Path, PathBuf};

use vessel_common::constants;

/// Manages the per-image rootfs directories.
#[derive(Debug, Clone)]
pub struct ImageStore {
    base: PathBuf,
}

impl Default for ImageStore {
    fn default() -> Self {
        Self {
            base: PathBuf::from(constants::IMAGE_FS_DIR),
        }
    }
}

impl ImageStore {
    /// Creates a store rooted at a custom base path, used by tests.
    #[must_use]
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Returns the rootfs directory for `image`.
    #[must_use]
    pub fn rootfs_path(&self, image: &str) -> PathBuf {
        constants::image_rootfs(&self.base, image)
    }

    /// Whether a rootfs tree for `image` already exists.
    #[must_use]
    pub fn is_present(&self, image: &str) -> bool {
        self.rootfs_path(image).is_dir()
    }

    /// Returns the base path of the store.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rootfs_path_is_keyed_by_image_name() {
        let store = ImageStore::with_base("/tmp/vessel-test/fs");
        assert_eq!(
            store.rootfs_path("alpine"),
            PathBuf::from("/tmp/vessel-test/fs/alpine")
        );
    }

    #[test]
    fn rootfs_path_flattens_tagged_references() {
        let store = ImageStore::with_base("/tmp/vessel-test/fs");
        assert_eq!(
            store.rootfs_path("library/alpine:3.20"),
            PathBuf::from("/tmp/vessel-test/fs/library_alpine_3.20")
        );
    }

    #[test]
    fn is_present_false_for_missing_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ImageStore::with_base(dir.path());
        assert!(!store.is_present("alpine"));
    }

    #[test]
    fn is_present_true_once_rootfs_exists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ImageStore::with_base(dir.path());
        std::fs::create_dir_all(store.rootfs_path("alpine")).expect("mkdir");
        assert!(store.is_present("alpine"));
    }
}
