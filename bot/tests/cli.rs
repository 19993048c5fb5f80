//! CLI tests for the `bot` binary.
//!
//! Spawns the binary against temporary config files and checks exit codes
//! and output for commands that need no network access.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use bot::exit_codes;

fn bot(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bot"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn bot")
}

#[test]
fn prompts_lists_configured_catalog() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("bot.toml");
    fs::write(
        &path,
        "[[prompts]]\nmode = \"relaxed\"\nprompt = \"Tell us about the food.\"\n",
    )
    .expect("write config");

    let output = bot(&path, &["prompts"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert_eq!(stdout, "[relaxed]\nTell us about the food.\n");
}

#[test]
fn prompts_without_config_uses_builtin_catalog() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = bot(&temp.path().join("missing.toml"), &["prompts"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.starts_with("[relaxed]\n"));
    assert!(stdout.contains("\n\n[strict]\n"));
}

#[test]
fn run_without_trips_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = bot(&temp.path().join("missing.toml"), &["run"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("no trips configured"));
}

#[test]
fn malformed_config_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("bot.toml");
    fs::write(&path, "language = [").expect("write config");
    let output = bot(&path, &["prompts"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
}
