//! Running the `oracle-probe` binary.

use std::path::Path;
use std::process::{Command, Output};

use crate::common::spawn_guess_server;

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

fn probe(config: &Path, arg: Option<&str>) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_oracle-probe"));
    command
        .env("ORACLE_PROBE_CONFIG", config)
        .env_remove("ORACLE_PROBE_LOG_FILE")
        .env("RUST_LOG", "warn");
    if let Some(arg) = arg {
        command.arg(arg);
    }
    command.output().unwrap()
}

#[cfg(unix)]
#[test]
fn local_mode_prints_value_and_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let script = crate::common::pick_a_number_script(dir.path(), 4242);
    let config = write_config(
        dir.path(),
        &format!(
            "[search]\ndomain_low = 1\ndomain_high = 10000\nretry_backoff_ms = 1\n\n[local]\nexec_path = \"{}\"\n",
            script.display()
        ),
    );

    let output = probe(&config, Some("local"));
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stdout: {stdout}");
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("4242"));
    assert!(stdout.contains("flag{found_4242}"));
}

#[test]
fn construction_failure_reports_fatal_and_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-oracle");
    let config = write_config(
        dir.path(),
        &format!("[local]\nexec_path = \"{}\"\n", missing.display()),
    );

    let output = probe(&config, Some("local"));
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(!output.status.success());
    assert!(stdout.starts_with("search fatal:"), "stdout: {stdout}");
    assert!(stdout.contains("no-such-oracle"));
}

#[test]
fn invalid_config_aborts_before_searching() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[remote]\nport = 0\n");

    let output = probe(&config, None);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("remote.port"));
}

#[tokio::test]
async fn remote_mode_is_the_default() {
    let port = spawn_guess_server(777, 0).await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &format!(
            "[search]\ndomain_low = 1\ndomain_high = 1000\n\n[remote]\nhost = \"127.0.0.1\"\nport = {port}\n"
        ),
    );

    // Keep the runtime free to serve the oracle while the binary runs.
    let output = tokio::task::spawn_blocking(move || probe(&config, Some("anything-else")))
        .await
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stdout: {stdout}");
    assert_eq!(stdout.lines().next(), Some("777"));
    assert!(stdout.contains("proof: oracle response"));
}
