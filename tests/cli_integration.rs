//! CLI Integration Tests
//!
//! These tests verify that the CLI commands work correctly end-to-end.
//! They test the actual binary behavior, not just the library.
//!
//! Run with:
//! ```bash
//! cargo test --test cli_integration
//! ```

use serde_json::Value;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const ALICE: &str = "0x000000000000000000000000000000000000000a";
const BOB: &str = "0x000000000000000000000000000000000000000b";

/// Run poem command and return (stdout, stderr, success)
fn run_poem(args: &[&str], state: &Path) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_poem"))
        .arg("-s")
        .arg(state)
        .args(["-f", "json"])
        .args(args)
        .output()
        .expect("Failed to execute poem");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

/// Run a command that must succeed and parse its JSON output
fn run_json(args: &[&str], state: &Path) -> Value {
    let (stdout, stderr, success) = run_poem(args, state);
    assert!(success, "{:?} failed: {}", args, stderr);
    serde_json::from_str(&stdout).expect("stdout should be JSON")
}

// ============================================================================
// Initialization
// ============================================================================

#[test]
fn test_cli_init_creates_snapshot() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");

    let out = run_json(&["init"], &state);

    assert_eq!(out["status"], "ok");
    assert_eq!(out["nodes"], 25);
    assert_eq!(out["encoding"], "packed");
    assert!(state.exists(), "snapshot file should be created");
}

#[test]
fn test_cli_init_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");
    run_json(&["init"], &state);

    let (_stdout, stderr, success) = run_poem(&["init"], &state);
    assert!(!success);
    assert!(stderr.contains("already exists"), "got: {}", stderr);

    run_json(&["init", "--force"], &state);
}

#[test]
fn test_cli_init_with_config() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");
    let config = dir.path().join("poem.json");
    std::fs::write(&config, r#"{"encoding": "structured"}"#).unwrap();

    let out = run_json(&["init", "--config", config.to_str().unwrap()], &state);
    assert_eq!(out["encoding"], "structured");
}

#[test]
fn test_cli_commands_need_a_snapshot() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("missing.snap");
    let (_stdout, stderr, success) = run_poem(&["status"], &state);
    assert!(!success);
    assert!(stderr.contains("poem init"), "got: {}", stderr);
}

// ============================================================================
// Graph
// ============================================================================

#[test]
fn test_cli_read_node() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");
    run_json(&["init"], &state);

    let node = run_json(&["node", "1"], &state);
    assert_eq!(node["value"], "As he ");
    assert_eq!(node["left_child"], 2);
    assert_eq!(node["right_child"], 3);
}

#[test]
fn test_cli_graph_summary() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");
    run_json(&["init"], &state);

    let graph = run_json(&["graph"], &state);
    assert_eq!(graph["paths"], 70);
    assert_eq!(graph["valid"], true);
    assert_eq!(graph["levels"].as_array().unwrap().len(), 9);
}

#[test]
fn test_cli_graph_summary_of_empty_poem() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");
    run_json(&["init", "--empty"], &state);

    let graph = run_json(&["graph"], &state);
    assert_eq!(graph["nodes"], 0);
    assert_eq!(graph["valid"], false);
    assert!(graph["levels"].is_null());
    assert!(graph["problem"].as_str().unwrap().contains("No node stored"));
}

#[test]
fn test_cli_node_write_on_empty_poem() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");
    run_json(&["init", "--empty"], &state);

    run_json(
        &["node-write", "1", "hello", "-l", "2", "-r", "3", "--siblings", "5,6"],
        &state,
    );
    let node = run_json(&["node", "1"], &state);
    assert_eq!(node["value"], "hello");
    assert_eq!(node["siblings"], serde_json::json!([5, 6, 0, 0]));

    let (_stdout, stderr, success) = run_poem(&["node", "2"], &state);
    assert!(!success);
    assert!(stderr.contains("No node stored"), "got: {}", stderr);
}

#[test]
fn test_cli_node_write_rejects_bad_input() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");
    run_json(&["init", "--empty"], &state);

    let long = "x".repeat(27);
    let (_stdout, stderr, success) = run_poem(&["node-write", "2", &long], &state);
    assert!(!success);
    assert!(stderr.contains("Value can't be more than"), "got: {}", stderr);

    let (_stdout, stderr, success) =
        run_poem(&["node-write", "2", "self", "--siblings", "2"], &state);
    assert!(!success);
    assert!(stderr.contains("its own sibling"), "got: {}", stderr);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_cli_mint_burn_advances_poem() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");
    run_json(&["init"], &state);

    let minted = run_json(&["mint", ALICE], &state);
    assert_eq!(minted["token"], 1);

    let burned = run_json(&["burn", ALICE, "1"], &state);
    assert_eq!(burned["curr_step"], 1);

    let status = run_json(&["status"], &state);
    assert_eq!(status["curr_step"], 1);
    assert_eq!(status["minted"], 1);
    assert_eq!(status["live"], 0);
    assert_eq!(status["frozen"], true);
    let path = status["path"].as_array().unwrap();
    assert_eq!(path[0], 1);
    assert_eq!(path[8], 25);
}

#[test]
fn test_cli_graph_frozen_after_mint() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");
    run_json(&["init"], &state);
    run_json(&["mint", ALICE], &state);

    let (_stdout, stderr, success) = run_poem(&["node-write", "3", "late"], &state);
    assert!(!success);
    assert!(stderr.contains("frozen"), "got: {}", stderr);
}

#[test]
fn test_cli_mint_limits() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");
    run_json(&["init"], &state);
    run_json(&["mint", ALICE], &state);

    let (_stdout, stderr, success) = run_poem(&["mint", ALICE], &state);
    assert!(!success);
    assert!(stderr.contains("already minted"), "got: {}", stderr);
}

#[test]
fn test_cli_transfer_and_token_view() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");
    run_json(&["init"], &state);
    run_json(&["mint", ALICE], &state);
    run_json(&["transfer", ALICE, BOB, "1"], &state);

    let view = run_json(&["token", "1"], &state);
    assert_eq!(view["owner"], BOB);
    assert_eq!(view["num_owners"], 2);
    assert_eq!(view["jitter"], 5);

    let all = run_json(&["token"], &state);
    assert_eq!(all["count"], 1);
}

#[test]
fn test_cli_hold_advances_chain() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");
    run_json(&["init"], &state);

    let out = run_json(&["hold", "10"], &state);
    assert_eq!(out["block"], 10);
    let status = run_json(&["status"], &state);
    assert_eq!(status["block"], 10);
}

#[test]
fn test_cli_hold_rejects_huge_counts() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");
    run_json(&["init"], &state);

    let (_stdout, stderr, success) = run_poem(&["hold", "18446744073709551615"], &state);
    assert!(!success);
    assert!(stderr.contains("Cannot advance"), "got: {}", stderr);
    let status = run_json(&["status"], &state);
    assert_eq!(status["block"], 0);
}

#[test]
fn test_cli_verse_text_output() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");
    run_json(&["init"], &state);

    let output = Command::new(env!("CARGO_BIN_EXE_poem"))
        .arg("-s")
        .arg(&state)
        .args(["-f", "text", "verse"])
        .output()
        .expect("Failed to execute poem");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "As he \n");
}

// ============================================================================
// Replay
// ============================================================================

#[test]
fn test_cli_replay_is_deterministic() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("events.json");
    std::fs::write(
        &log,
        format!(
            r#"[
                {{"op": "mint", "to": "{a}"}},
                {{"op": "mint", "to": "{b}"}},
                {{"op": "hold", "blocks": 4}},
                {{"op": "burn", "holder": "{a}", "token": 1}},
                {{"op": "transfer", "from": "{b}", "to": "{a}", "token": 2}},
                {{"op": "burn", "holder": "{a}", "token": 2}}
            ]"#,
            a = ALICE,
            b = BOB
        ),
    )
    .unwrap();
    let log = log.to_str().unwrap();

    let first = dir.path().join("first.snap");
    let second = dir.path().join("second.snap");
    run_json(&["init"], &first);
    run_json(&["init"], &second);

    let one = run_json(&["replay", log], &first);
    let two = run_json(&["replay", log], &second);
    assert_eq!(one["trajectory"], two["trajectory"]);
    assert_eq!(one["trajectory"].as_array().unwrap().len(), 6);

    let status = run_json(&["status"], &first);
    assert_eq!(status["curr_step"], 2);
}

#[test]
fn test_cli_replay_dry_run_keeps_state() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("poem.snap");
    let log = dir.path().join("events.json");
    std::fs::write(&log, format!(r#"[{{"op": "mint", "to": "{}"}}]"#, ALICE)).unwrap();
    run_json(&["init"], &state);

    let out = run_json(&["replay", log.to_str().unwrap(), "--dry-run"], &state);
    assert_eq!(out["saved"], false);
    let status = run_json(&["status"], &state);
    assert_eq!(status["minted"], 0);
}
