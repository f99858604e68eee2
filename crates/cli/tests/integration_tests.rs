/// Integration tests for the EddyKV CLI
/// Tests cover: basic ops, fetch directions, key ranges, flush, schemas, config errors
use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Runs the CLI with the given `EDDY_*` overrides, feeds `commands` on stdin
/// followed by EXIT, and returns the process output.
fn run_cli_with(env: &[(&str, &str)], commands: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cli"));
    cmd.env("EDDY_WINDOW_SIZE_MS", "10")
        .env("EDDY_SEGMENT_INTERVAL_MS", "100")
        .env_remove("EDDY_KEY_SCHEMA")
        .env_remove("EDDY_RETAIN_DUPLICATES");
    for (k, v) in env {
        cmd.env(k, v);
    }
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    {
        let stdin = child.stdin.as_mut().expect("Failed to open stdin");
        stdin
            .write_all(commands.as_bytes())
            .expect("Failed to write to stdin");
        stdin.write_all(b"EXIT\n").expect("Failed to write EXIT");
    }

    child.wait_with_output().expect("Failed to read output")
}

fn run_cli_command(commands: &str) -> String {
    let output = run_cli_with(&[], commands);
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Result lines only: prompts and the banner are stripped.
fn lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|l| l.trim_start_matches("> ").to_string())
        .filter(|l| !l.is_empty() && !l.starts_with("EddyKV") && !l.starts_with("Commands") && !l.starts_with(' '))
        .collect()
}

#[test]
fn test_basic_put_get() {
    let output = run_cli_command("PUT key1 0 value1\nGET key1 0\nGET key1 10\n");
    assert_eq!(lines(&output), vec!["OK", "value1", "(nil)", "bye"]);
}

#[test]
fn test_delete_key() {
    let output = run_cli_command("PUT k 0 v\nFLUSH\nDEL k 0\nGET k 0\nALL\n");
    let out = lines(&output);
    assert!(out.contains(&"(nil)".to_string()));
    assert!(out.contains(&"(empty)".to_string()));
}

#[test]
fn test_fetch_forward_and_backward() {
    let commands = "PUT a 0 x\nPUT a 120 y\nFLUSH\nPUT a 50 z\nFETCH a 0 200\nBFETCH a 0 200\n";
    let out = lines(&run_cli_command(commands));
    let fetched: Vec<_> = out.iter().filter(|l| l.contains(" -> ")).cloned().collect();
    assert_eq!(
        fetched,
        vec![
            "a@[0,10) -> x",
            "a@[50,60) -> z",
            "a@[120,130) -> y",
            "a@[120,130) -> y",
            "a@[50,60) -> z",
            "a@[0,10) -> x",
        ]
    );
    assert_eq!(out.iter().filter(|l| *l == "(3 entries)").count(), 2);
}

#[test]
fn test_range_with_open_bound() {
    let commands = "PUT a 0 1\nPUT b 0 2\nPUT c 0 3\nRANGE * b 0 100\nBRANGE b * 0 100\n";
    let out = lines(&run_cli_command(commands));
    let fetched: Vec<_> = out.iter().filter(|l| l.contains(" -> ")).cloned().collect();
    assert_eq!(
        fetched,
        vec!["a@[0,10) -> 1", "b@[0,10) -> 2", "c@[0,10) -> 3", "b@[0,10) -> 2"]
    );
}

#[test]
fn test_flush_reports_counts() {
    let output = run_cli_command("PUT a 0 1\nPUT b 150 2\nFLUSH\nFLUSH\n");
    let out = lines(&output);
    assert!(out.contains(&"OK (flushed=2, store=2, segments=2)".to_string()));
    assert!(out.contains(&"OK (flushed=0, store=2, segments=2)".to_string()));
}

#[test]
fn test_inverted_range_is_empty() {
    let out = lines(&run_cli_command("PUT a 0 1\nFETCH a 100 0\n"));
    assert!(out.contains(&"(empty)".to_string()));
}

#[test]
fn test_time_first_schema() {
    let output = run_cli_with(
        &[("EDDY_KEY_SCHEMA", "time-first")],
        "PUT b 0 1\nPUT a 20 2\nALL\nSTATS\n",
    );
    let out = lines(&String::from_utf8_lossy(&output.stdout));
    let fetched: Vec<_> = out.iter().filter(|l| l.contains(" -> ")).cloned().collect();
    // Time-major: b@0 before a@20.
    assert_eq!(fetched, vec!["b@[0,10) -> 1", "a@[20,30) -> 2"]);
    assert!(out.iter().any(|l| l.contains("TimeFirst")));
}

#[test]
fn test_retain_duplicates() {
    let output = run_cli_with(
        &[("EDDY_RETAIN_DUPLICATES", "true")],
        "PUT k 0 first\nPUT k 0 second\nFETCH k 0 0\n",
    );
    let out = lines(&String::from_utf8_lossy(&output.stdout));
    assert!(out.contains(&"(2 entries)".to_string()));
}

#[test]
fn test_bad_input() {
    let out = lines(&run_cli_command("PUT k\nGET k notanumber\nFOO\nPUT k -5 v\n"));
    assert!(out.contains(&"ERR usage: PUT key start value".to_string()));
    assert!(out.iter().any(|l| l.contains("bad timestamp: notanumber")));
    assert!(out.contains(&"unknown command: FOO".to_string()));
    assert!(out.iter().any(|l| l.starts_with("ERR put failed")));
}

#[test]
fn test_invalid_config_fails_startup() {
    let output = run_cli_with(&[("EDDY_WINDOW_SIZE_MS", "-1")], "");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("window_size"));
}
