//! CLI surface tests plus the root-only end-to-end lifecycle check.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::process::Command;

fn vsl() -> Command {
    Command::new(env!("CARGO_BIN_EXE_vsl"))
}

#[test]
fn help_lists_public_commands() {
    let output = vsl().arg("--help").output().expect("run vsl --help");
    assert!(output.status.success());

    let help = String::from_utf8(output.stdout).expect("utf8");
    assert!(help.contains("pull"));
    assert!(help.contains("run"));
}

#[test]
fn child_reentry_point_is_hidden_from_help() {
    let output = vsl().arg("--help").output().expect("run vsl --help");
    let help = String::from_utf8(output.stdout).expect("utf8");
    assert!(!help.contains("child"));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let output = vsl().output().expect("run vsl");
    assert!(!output.status.success());
}

#[test]
fn run_requires_image_and_command() {
    let output = vsl().args(["run", "alpine"]).output().expect("run vsl");
    assert!(!output.status.success());
}

/// Full lifecycle against a real image. Needs root, network access, and
/// the `ip`/`iptables` binaries, so it only runs when explicitly asked
/// for on a prepared host: `cargo test -- --ignored`.
#[test]
#[ignore = "requires root, network access, and ip/iptables"]
fn run_echo_prints_and_exits_zero() {
    let output = vsl()
        .args(["run", "alpine", "echo", "hi"])
        .output()
        .expect("run vsl run");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hi\n");

    // No leftover host state: the veth pair must be gone.
    let links = Command::new("ip")
        .args(["link", "show"])
        .output()
        .expect("ip link show");
    assert!(!String::from_utf8_lossy(&links.stdout).contains("veth0"));
}

/// A failing user command surfaces its own exit code unchanged.
#[test]
#[ignore = "requires root, network access, and ip/iptables"]
fn run_false_reports_exit_code_one() {
    let output = vsl()
        .args(["run", "alpine", "false"])
        .output()
        .expect("run vsl run");
    assert_eq!(output.status.code(), Some(1));
}
