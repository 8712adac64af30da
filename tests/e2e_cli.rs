//! CLI end-to-end tests
//!
//! Tests for the stickerforge command-line interface that need no network
//! and no external tools.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the stickerforge binary
#[allow(deprecated)]
fn stickerforge_cmd() -> Command {
    Command::cargo_bin("stickerforge").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = stickerforge_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = stickerforge_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("stickerforge"))
        .stdout(predicate::str::contains("convert"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = stickerforge_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_check_tools_command() {
    let mut cmd = stickerforge_cmd();
    cmd.arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("magick"));
}

#[test]
fn test_cli_convert_help() {
    let mut cmd = stickerforge_cmd();
    cmd.args(["convert", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--no-overlay"));
}

#[test]
fn test_cli_rejects_unknown_sticker_type() {
    let temp = tempdir().unwrap();
    let mut cmd = stickerforge_cmd();
    cmd.args(["convert", temp.path().to_str().unwrap(), "--type", "hologram", "--out", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("hologram"));
}

#[test]
fn test_cli_convert_still_pack_to_gif_fails() {
    let temp = tempdir().unwrap();
    fs::create_dir_all(temp.path().join("static")).unwrap();
    fs::write(temp.path().join("static").join("1.png"), b"\x89PNG\r\n\x1a\n").unwrap();

    let mut cmd = stickerforge_cmd();
    cmd.args([
        "convert",
        temp.path().to_str().unwrap(),
        "--type",
        "static",
        "--format",
        "gif",
        "--out",
        temp.path().join("out").to_str().unwrap(),
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no animation"));
}

#[test]
fn test_cli_convert_dry_run_shows_plan() {
    let temp = tempdir().unwrap();
    fs::create_dir_all(temp.path().join("animation")).unwrap();
    for id in ["101", "102"] {
        fs::write(temp.path().join("animation").join(format!("{id}.png")), b"x").unwrap();
    }

    let mut cmd = stickerforge_cmd();
    cmd.args([
        "convert",
        temp.path().to_str().unwrap(),
        "--type",
        "animated",
        "--format",
        "webm",
        "--out",
        temp.path().join("out").to_str().unwrap(),
        "--dry-run",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("Stickers: 2"))
    .stdout(predicate::str::contains("scale -> towebm"))
    .stdout(predicate::str::contains("[DRY RUN]"));

    assert!(!temp.path().join("out").exists());
}

#[test]
fn test_cli_convert_dry_run_plans_pack_icon() {
    let temp = tempdir().unwrap();
    fs::create_dir_all(temp.path().join("popup")).unwrap();
    fs::write(temp.path().join("popup").join("101.png"), b"x").unwrap();
    fs::write(temp.path().join("icon.png"), b"x").unwrap();
    let out = temp.path().join("out");

    let mut cmd = stickerforge_cmd();
    cmd.args([
        "convert",
        temp.path().to_str().unwrap(),
        "--type",
        "popup",
        "--format",
        "webm",
        "--out",
        out.to_str().unwrap(),
        "--dry-run",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("Stickers: 1"))
    .stdout(predicate::str::contains("Pack icon:"))
    .stdout(predicate::str::contains("icon.webm"))
    .stdout(predicate::str::contains("Would transcode 2 files"));
}

#[test]
fn test_cli_png_copy_needs_no_tools() {
    let temp = tempdir().unwrap();
    fs::create_dir_all(temp.path().join("static")).unwrap();
    fs::write(temp.path().join("static").join("7.png"), b"\x89PNG\r\n\x1a\n").unwrap();
    let out = temp.path().join("out");

    let mut cmd = stickerforge_cmd();
    cmd.args([
        "convert",
        temp.path().to_str().unwrap(),
        "--type",
        "static",
        "--out",
        out.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("Converted 1 of 1"));

    assert_eq!(fs::read(out.join("7.png")).unwrap(), b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_cli_decrypt_round_trip() {
    let temp = tempdir().unwrap();
    let original: Vec<u8> = (0..200u8).collect();
    let input = temp.path().join("sticker.webp");
    fs::write(&input, &original).unwrap();

    let once = temp.path().join("once");
    stickerforge_cmd()
        .args(["decrypt", input.to_str().unwrap(), "--out", once.to_str().unwrap()])
        .assert()
        .success();
    let decoded = fs::read(once.join("sticker.webp")).unwrap();
    assert_ne!(decoded, original);
    assert_eq!(decoded[128..], original[128..]);

    let twice = temp.path().join("twice");
    stickerforge_cmd()
        .args([
            "decrypt",
            once.join("sticker.webp").to_str().unwrap(),
            "--out",
            twice.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert_eq!(fs::read(twice.join("sticker.webp")).unwrap(), original);
}

#[test]
fn test_cli_validate_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("config.toml");
    fs::write(
        &config_file,
        r#"
[workers]
download = 2

[limits]
max_duration_secs = 2.5
"#,
    )
    .unwrap();

    let mut cmd = stickerforge_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("download 2"));
}

#[test]
fn test_cli_validate_rejects_bad_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("config.toml");
    fs::write(&config_file, "[workers]\ntranscode = 0\n").unwrap();

    let mut cmd = stickerforge_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Worker counts"));
}
