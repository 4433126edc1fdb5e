//! Anonymous Docker Hub pull over the Registry v2 API.
//!
//! Flow: fetch a pull token from the auth service, fetch the manifest
//! (resolving a manifest list to the current platform), then download,
//! verify, and extract each layer in order over the image's rootfs.

use std::time::Duration;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use vessel_common::error::{Result, VesselError};

use crate::ImageProvider;
use crate::manifest::{Descriptor, Manifest, ManifestList};
use crate::store::ImageStore;

/// Docker Hub registry base URL.
const REGISTRY_URL: &str = "https://registry-1.docker.io";

/// Docker Hub token endpoint.
const AUTH_URL: &str = "https://auth.docker.io/token";

/// Accept header for manifest requests.
const ACCEPT_MANIFEST: &str = concat!(
    "application/vnd.docker.distribution.manifest.v2+json, ",
    "application/vnd.docker.distribution.manifest.list.v2+json, ",
    "application/vnd.oci.image.manifest.v1+json, ",
    "application/vnd.oci.image.index.v1+json"
);

/// Request timeout for manifest and blob downloads.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Internal pull failure, folded into `ImageUnavailable` at the trait
/// boundary.
#[derive(Debug, Error)]
enum PullError {
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{context}: registry returned {status}")]
    Status {
        context: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("manifest parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no manifest for platform {os}/{arch}")]
    NoPlatform { os: &'static str, arch: String },

    #[error("digest mismatch for layer {digest}")]
    DigestMismatch { digest: String },

    #[error("layer extraction failed: {0}")]
    Extract(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Pulls images anonymously from Docker Hub into an [`ImageStore`].
pub struct RegistryPuller {
    client: reqwest::blocking::Client,
    store: ImageStore,
}

impl RegistryPuller {
    /// Creates a puller writing into the given store.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be constructed, which only
    /// happens when the TLS backend is unavailable.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn new(store: ImageStore) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("vessel/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to create HTTP client");
        Self { client, store }
    }

    fn fetch_token(&self, repository: &str) -> std::result::Result<String, PullError> {
        let response = self
            .client
            .get(AUTH_URL)
            .query(&[
                ("service", "registry.docker.io"),
                ("scope", &format!("repository:{repository}:pull")),
            ])
            .send()?;
        if !response.status().is_success() {
            return Err(PullError::Status {
                context: "token request",
                status: response.status(),
            });
        }
        let token: TokenResponse = serde_json::from_str(&response.text()?)?;
        Ok(token.token)
    }

    fn fetch_manifest(
        &self,
        repository: &str,
        reference: &str,
        token: &str,
    ) -> std::result::Result<Manifest, PullError> {
        let url = format!("{REGISTRY_URL}/v2/{repository}/manifests/{reference}");
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, ACCEPT_MANIFEST)
            .send()?;
        if !response.status().is_success() {
            return Err(PullError::Status {
                context: "manifest request",
                status: response.status(),
            });
        }

        let is_list = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("manifest.list") || ct.contains("image.index"));
        let body = response.text()?;

        if is_list {
            let list: ManifestList = serde_json::from_str(&body)?;
            let arch = registry_arch();
            let digest = list
                .digest_for("linux", arch)
                .ok_or_else(|| PullError::NoPlatform {
                    os: "linux",
                    arch: arch.to_string(),
                })?
                .to_string();
            tracing::debug!(digest, arch, "resolved manifest list to platform manifest");
            return self.fetch_manifest(repository, &digest, token);
        }

        Ok(serde_json::from_str(&body)?)
    }

    fn fetch_layer(
        &self,
        repository: &str,
        layer: &Descriptor,
        token: &str,
        rootfs: &std::path::Path,
    ) -> std::result::Result<(), PullError> {
        let url = format!("{REGISTRY_URL}/v2/{repository}/blobs/{}", layer.digest);
        let response = self.client.get(&url).bearer_auth(token).send()?;
        if !response.status().is_success() {
            return Err(PullError::Status {
                context: "blob request",
                status: response.status(),
            });
        }
        let bytes = response.bytes()?;

        verify_digest(&bytes, &layer.digest)?;

        let decoder = flate2::read::GzDecoder::new(&bytes[..]);
        let mut archive = tar::Archive::new(decoder);
        archive.set_preserve_permissions(true);
        archive.unpack(rootfs)?;

        tracing::info!(
            digest = %layer.digest,
            size = layer.size,
            "layer extracted"
        );
        Ok(())
    }

    fn pull_fresh(&self, image: &str) -> std::result::Result<(), PullError> {
        let (repository, tag) = parse_reference(image);
        tracing::info!(image, repository, tag, "pulling image");

        let token = self.fetch_token(&repository)?;
        let manifest = self.fetch_manifest(&repository, &tag, &token)?;

        let rootfs = self.store.rootfs_path(image);
        std::fs::create_dir_all(&rootfs)?;

        for layer in &manifest.layers {
            self.fetch_layer(&repository, layer, &token, &rootfs)?;
        }

        tracing::info!(image, rootfs = %rootfs.display(), "image pulled");
        Ok(())
    }
}

impl ImageProvider for RegistryPuller {
    fn pull(&self, image: &str) -> Result<()> {
        if self.store.is_present(image) {
            tracing::info!(image, "rootfs already present, skipping pull");
            return Ok(());
        }

        self.pull_fresh(image).map_err(|e| {
            // A half-extracted rootfs must not satisfy the next presence
            // check.
            let rootfs = self.store.rootfs_path(image);
            if let Err(cleanup) = std::fs::remove_dir_all(&rootfs) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        rootfs = %rootfs.display(),
                        error = %cleanup,
                        "failed to discard partial rootfs"
                    );
                }
            }
            VesselError::ImageUnavailable {
                image: image.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

/// Splits an image reference into Docker Hub repository and tag.
///
/// Bare names map into the `library/` namespace and an absent tag means
/// `latest`.
#[must_use]
pub fn parse_reference(image: &str) -> (String, String) {
    let (name, tag) = image
        .rsplit_once(':')
        .map_or((image, "latest"), |(n, t)| (n, t));
    let repository = if name.contains('/') {
        name.to_string()
    } else {
        format!("library/{name}")
    };
    (repository, tag.to_string())
}

/// Maps the build architecture to registry platform terms.
fn registry_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    }
}

fn verify_digest(bytes: &[u8], digest: &str) -> std::result::Result<(), PullError> {
    let expected = digest.strip_prefix("sha256:").unwrap_or(digest);
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let actual = format!("{:x}", hasher.finalize());
    if actual == expected {
        Ok(())
    } else {
        Err(PullError::DigestMismatch {
            digest: digest.to_string(),
        })
    }
}
