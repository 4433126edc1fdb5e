//! # vsl — Vessel CLI
//!
//! Minimal single-host container runtime: pull an image, run a command
//! inside private namespaces with NAT'd networking and a cgroup.

mod commands;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
