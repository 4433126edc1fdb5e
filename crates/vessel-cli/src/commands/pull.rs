//! `vsl pull` — Fetch an image's root filesystem.

use clap::Args;

use vessel_image::ImageProvider;
use vessel_image::registry::RegistryPuller;
use vessel_image::store::ImageStore;

/// Arguments for the `pull` command.
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Image to fetch (e.g. `alpine` or `alpine:3.20`).
    pub image: String,
}

/// Executes the `pull` command.
///
/// # Errors
///
/// Returns an error if the image cannot be retrieved.
#[allow(clippy::print_stderr)]
pub fn execute(args: &PullArgs) -> anyhow::Result<()> {
    eprintln!("Pulling {}", args.image);
    let puller = RegistryPuller::new(ImageStore::default());
    puller.pull(&args.image)?;
    eprintln!("Pulled {}", args.image);
    Ok(())
}
