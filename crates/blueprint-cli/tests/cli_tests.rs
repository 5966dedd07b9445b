//! CLI integration tests
//!
//! Run the `blueprint-cli` binary against the simulated service with every
//! delay set to zero.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const FAST_CONFIG: &str = r#"
[orchestrator]
tick_interval_ms = 100

[simulation]
request_latency_ms = 0
stage_delay_ms = 0
"#;

fn write_config(temp_dir: &TempDir, body: &str) -> PathBuf {
    let path = temp_dir.path().join("blueprint.toml");
    fs::write(&path, body).unwrap();
    path
}

fn cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_blueprint-cli"))
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

fn console(config: &Path, script: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_blueprint-cli"))
        .args(["console", "--config", config.to_str().unwrap()])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_generate_succeeds() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, FAST_CONFIG);

    let output = cli(&[
        "generate",
        "acme-1",
        "--win",
        "fast POV",
        "--config",
        config.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("[REQUESTING] Submitting blueprint request..."));
    assert!(text.contains("[READY] Blueprint generation complete!"));
    assert!(text.contains("Customer: Acme Financial"));
    assert!(text.contains("Download PDF: https://storage.blueprints.local/"));
}

#[test]
fn test_generate_job_failure_exits_nonzero() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, FAST_CONFIG);

    let output = cli(&[
        "generate",
        "acme-1",
        "--fail-at",
        "rendered",
        "--config",
        config.to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    assert!(stdout(&output).contains("[ERROR] Blueprint renderer crashed"));
    assert!(stderr(&output).contains("Error: Blueprint renderer crashed"));
}

#[test]
fn test_generate_blank_engagement_exits_nonzero() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, FAST_CONFIG);

    let output = cli(&["generate", "  ", "--config", config.to_str().unwrap()]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error: Engagement ID is required"));
}

#[test]
fn test_generate_rejects_terminal_fail_stage() {
    let output = cli(&["generate", "acme-1", "--fail-at", "succeeded", "--stage-delay-ms", "0"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid configuration: fail_at must be one of"));
}

#[test]
fn test_generate_rejects_unknown_stage() {
    let output = cli(&["generate", "acme-1", "--fail-at", "shipping"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown stage 'shipping'"));
}

#[test]
fn test_invalid_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, "[simulation]\nstage_delay = 5\n");

    let output = cli(&["generate", "acme-1", "--config", config.to_str().unwrap()]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error: Invalid configuration: "));
}

#[test]
fn test_console_session() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, FAST_CONFIG);

    let output = console(
        &config,
        "help\nbp globex-7 --risk \"carrier onboarding\"\nwait\nstatus\nexit\n",
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Available commands:"));
    assert!(text.contains("Generating blueprint for globex-7."));
    assert!(text.contains("[READY] Blueprint generation complete!"));
    assert!(text.contains("Customer: Globex Logistics"));
    assert!(text.trim_end().ends_with("Goodbye."));
}

#[test]
fn test_console_reports_unknown_command() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, FAST_CONFIG);

    let output = console(&config, "deploy acme-1\nhelp bp\n");

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Error: Unknown command: deploy"));
    assert!(text.contains("Aliases: bp, generate"));
}
