//! Docker Registry v2 / OCI manifest models.

use serde::Deserialize;

/// A single-platform image manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Manifest schema version (2 for everything Vessel pulls).
    pub schema_version: u32,
    /// Ordered layer descriptors, bottom to top.
    pub layers: Vec<Descriptor>,
}

/// A content descriptor for a blob (layer or config).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Blob media type.
    pub media_type: String,
    /// Content digest in `sha256:<hex>` form.
    pub digest: String,
    /// Blob size in bytes.
    pub size: u64,
}

/// A multi-platform manifest list / OCI image index.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestList {
    /// One entry per platform.
    pub manifests: Vec<PlatformManifest>,
}

/// One platform's manifest reference within a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformManifest {
    /// Digest of the platform manifest.
    pub digest: String,
    /// Target platform, absent for attestation entries.
    pub platform: Option<Platform>,
}

/// Target OS and architecture of a platform manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    /// CPU architecture in registry terms (`amd64`, `arm64`, …).
    pub architecture: String,
    /// Operating system (`linux`).
    pub os: String,
}

impl ManifestList {
    /// Picks the manifest digest for `os`/`arch`, if present.
    #[must_use]
    pub fn digest_for(&self, os: &str, arch: &str) -> Option<&str> {
        self.manifests
            .iter()
            .find(|m| {
                m.platform
                    .as_ref()
                    .is_some_and(|p| p.os == os && p.architecture == arch)
            })
            .map(|m| m.digest.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST_JSON: &str = r#"{
        "schemaVersion": 2,
        "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
        "config": {
            "mediaType": "application/vnd.docker.container.image.v1+json",
            "digest": "sha256:aaaa",
            "size": 1469
        },
        "layers": [
            {
                "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
                "digest": "sha256:bbbb",
                "size": 3623807
            }
        ]
    }"#;

    const LIST_JSON: &str = r#"{
        "schemaVersion": 2,
        "manifests": [
            {
                "digest": "sha256:amd",
                "platform": { "architecture": "amd64", "os": "linux" }
            },
            {
                "digest": "sha256:arm",
                "platform": { "architecture": "arm64", "os": "linux" }
            },
            {
                "digest": "sha256:attest"
            }
        ]
    }"#;

    #[test]
    fn parses_v2_manifest_layers() {
        let manifest: Manifest = serde_json::from_str(MANIFEST_JSON).expect("parse");
        assert_eq!(manifest.schema_version, 2);
        assert_eq!(manifest.layers.len(), 1);
        assert_eq!(manifest.layers[0].digest, "sha256:bbbb");
        assert_eq!(manifest.layers[0].size, 3_623_807);
    }

    #[test]
    fn manifest_list_selects_platform_digest() {
        let list: ManifestList = serde_json::from_str(LIST_JSON).expect("parse");
        assert_eq!(list.digest_for("linux", "amd64"), Some("sha256:amd"));
        assert_eq!(list.digest_for("linux", "arm64"), Some("sha256:arm"));
    }

    #[test]
    fn manifest_list_misses_unknown_platform() {
        let list: ManifestList = serde_json::from_str(LIST_JSON).expect("parse");
        assert_eq!(list.digest_for("linux", "riscv64"), None);
    }

    #[test]
    fn manifest_list_skips_entries_without_platform() {
        let list: ManifestList = serde_json::from_str(LIST_JSON).expect("parse");
        assert_eq!(list.manifests.len(), 3);
        assert!(list.digest_for("", "").is_none());
    }
}
