use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

fn write_valid_config(dir: &Path, file_name: &str) -> PathBuf {
    let data_dir = dir.join("data");
    fs::create_dir_all(&data_dir).expect("create data dir");

    let config_path = dir.join(file_name);
    fs::write(
        &config_path,
        format!(
            r#"
[store]
path = "{data}"
namespace = "talk"

[log]
output = "stdout"
filter_level = "info"
"#,
            data = data_dir.display()
        ),
    )
    .expect("write valid config");

    config_path
}

fn run_icecheck(args: &[&str], current_dir: Option<&Path>) -> Output {
    let mut cmd = Command::new(PathBuf::from(env!("CARGO_BIN_EXE_icecheck")));
    cmd.args(args);
    if let Some(dir) = current_dir {
        cmd.current_dir(dir);
    }
    cmd.output().expect("run icecheck command")
}

#[test]
fn test_command_accepts_explicit_valid_config() {
    let temp = tempfile::tempdir().expect("temp dir");
    let config_path = write_valid_config(temp.path(), "valid.toml");
    let output = run_icecheck(&["test", config_path.to_str().expect("utf8 path")], None);

    assert!(
        output.status.success(),
        "command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_command_finds_default_config_in_current_directory() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_valid_config(temp.path(), "config.toml");
    let output = run_icecheck(&["test"], Some(temp.path()));

    assert!(
        output.status.success(),
        "command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_command_fails_for_invalid_config_content() {
    let temp = tempfile::tempdir().expect("temp dir");
    let bad_path = temp.path().join("bad.toml");
    fs::write(&bad_path, "log = [\n").expect("write invalid toml");

    let output = run_icecheck(&["test", bad_path.to_str().expect("utf8 path")], None);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "command should fail");
    assert!(
        stderr.contains("parse") || stderr.contains("invalid") || stderr.contains("expected"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn test_command_fails_for_validation_errors() {
    let temp = tempfile::tempdir().expect("temp dir");
    let config_path = temp.path().join("validation-error.toml");
    fs::write(
        &config_path,
        r#"
[log]
output = "syslog"
"#,
    )
    .expect("write config");

    let output = run_icecheck(&["test", config_path.to_str().expect("utf8 path")], None);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "command should fail");
    assert!(
        stderr.contains("validation failed") || stderr.contains("Invalid log output"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn turn_add_list_remove_roundtrip() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_valid_config(temp.path(), "config.toml");

    let output = run_icecheck(
        &[
            "turn",
            "add",
            "turn.example.com",
            "s3cr3t",
            "--protocols",
            "udp",
        ],
        Some(temp.path()),
    );
    assert!(
        output.status.success(),
        "add should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output = run_icecheck(&["turn", "list"], Some(temp.path()));
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("turn.example.com") && stdout.contains("[udp]"),
        "unexpected stdout: {stdout}"
    );

    let output = run_icecheck(&["turn", "remove", "0"], Some(temp.path()));
    assert!(output.status.success());

    let output = run_icecheck(&["turn", "list"], Some(temp.path()));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("No TURN servers configured"),
        "unexpected stdout: {stdout}"
    );
}

#[test]
fn stun_add_list_remove_roundtrip() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_valid_config(temp.path(), "config.toml");

    let output = run_icecheck(&["stun", "add", "stun.example.com:443"], Some(temp.path()));
    assert!(
        output.status.success(),
        "add should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output = run_icecheck(&["stun", "add", "stun2.example.com:3478"], Some(temp.path()));
    assert!(output.status.success());

    let output = run_icecheck(&["stun", "list"], Some(temp.path()));
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("0: stun.example.com:443") && stdout.contains("1: stun2.example.com:3478"),
        "unexpected stdout: {stdout}"
    );

    let output = run_icecheck(&["stun", "remove", "0"], Some(temp.path()));
    assert!(output.status.success());

    let output = run_icecheck(&["stun", "list"], Some(temp.path()));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("0: stun2.example.com:3478") && !stdout.contains("stun.example.com:443"),
        "unexpected stdout: {stdout}"
    );

    let output = run_icecheck(&["stun", "remove", "5"], Some(temp.path()));
    assert!(!output.status.success(), "out-of-range remove should fail");
}

#[test]
fn signaling_add_and_set_secret() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_valid_config(temp.path(), "config.toml");

    let output = run_icecheck(
        &["signaling", "add", "wss://signaling.example.org", "--verify"],
        Some(temp.path()),
    );
    assert!(
        output.status.success(),
        "add should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output = run_icecheck(
        &["signaling", "set-secret", "block-secret"],
        Some(temp.path()),
    );
    assert!(output.status.success());

    let output = run_icecheck(&["signaling", "list"], Some(temp.path()));
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("wss://signaling.example.org")
            && stdout.contains("(verified)")
            && stdout.contains("Shared secret is set"),
        "unexpected stdout: {stdout}"
    );
}

#[test]
fn signaling_add_rejects_invalid_url() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_valid_config(temp.path(), "config.toml");

    let output = run_icecheck(
        &["signaling", "add", "not a url at all"],
        Some(temp.path()),
    );
    assert!(!output.status.success(), "add should fail");
}

#[test]
fn probe_rejects_unknown_transport() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_valid_config(temp.path(), "config.toml");

    let output = run_icecheck(
        &[
            "probe",
            "turn.example.com",
            "s3cr3t",
            "--protocols",
            "sctp",
        ],
        Some(temp.path()),
    );
    assert!(!output.status.success(), "probe should fail");
}
