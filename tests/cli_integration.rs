//! Integration tests for the `sb` CLI.
//!
//! Board commands run against the block dump in tests/fixtures via
//! `--fixture`, so no network or token is needed.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Get the path to the built `sb` binary.
fn sb_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("sb");
    path
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Run `sb` in `dir`, returning (stdout, stderr, success).
fn run_sb(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(sb_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run sb");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run a board command against the fixture dump, expecting success.
fn run_board_ok(args: &[&str]) -> String {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = fixture("stickyboard.toml");
    let dump = fixture("roadmap.json");
    let mut full = vec![
        "--config",
        config.to_str().unwrap(),
        "--fixture",
        dump.to_str().unwrap(),
    ];
    full.extend_from_slice(args);

    let (stdout, stderr, success) = run_sb(tmp.path(), &full);
    if !success {
        panic!("sb {:?} failed:\nstdout: {}\nstderr: {}", args, stdout, stderr);
    }
    stdout
}

// ---------------------------------------------------------------------------
// Read command tests
// ---------------------------------------------------------------------------

#[test]
fn test_board_groups_by_lane() {
    let out = run_board_ok(&["board"]);
    assert!(out.contains("== Alpha (A1) (lane-a) =="));
    assert!(out.contains("== Beta (B2) (lane-b) =="));
    assert!(!out.contains("lane-dac"));
    assert!(out.contains("Ship API"));
    assert!(out.contains("[cp2]"));
    assert!(!out.contains("Checkpoint 3"));
}

#[test]
fn test_board_filters() {
    let out = run_board_ok(&["board", "--status", "blocked"]);
    assert!(out.contains("[cp1]"));
    assert!(!out.contains("[dl1]"));

    let out = run_board_ok(&["board", "--owner", "kim"]);
    assert!(out.contains("[dl2]"));
    assert!(!out.contains("[cp1]"));

    let out = run_board_ok(&["board", "-s", "nothing matches this"]);
    assert_eq!(out.trim(), "no deliverables");
}

#[test]
fn test_board_json() {
    let out = run_board_ok(&["board", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let cards = parsed.as_array().unwrap();
    assert_eq!(cards.len(), 4);
    assert_eq!(cards[0]["id"], "cp1");
    assert_eq!(cards[0]["status"], "blocked");
    assert_eq!(cards[0]["ownerBlockId"], "own1");
    assert_eq!(cards[3]["quarterId"], "2026-Q2");
}

#[test]
fn test_show() {
    let out = run_board_ok(&["show", "dl2"]);
    assert!(out.starts_with("● Pricing page"));
    assert!(out.contains("lane: Beta (B2) (lane-b)"));
    assert!(out.contains("owner: Kim"));
    assert!(out.contains("delivery date: TBD"));
    assert!(out.contains("  ▸ Details"));
}

#[test]
fn test_show_not_found() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = fixture("stickyboard.toml");
    let dump = fixture("roadmap.json");
    let (_, stderr, success) = run_sb(
        tmp.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "--fixture",
            dump.to_str().unwrap(),
            "show",
            "nope",
        ],
    );
    assert!(!success);
    assert!(stderr.contains("deliverable not found: nope"));
}

#[test]
fn test_milestones() {
    let out = run_board_ok(&["milestones"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("2026-Q1"));
    assert!(lines[0].contains("Jan 10, 2026"));
    assert!(lines[1].contains("Q2 2026"));
}

#[test]
fn test_stats_json() {
    let out = run_board_ok(&["stats", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["totals"]["total"], 4);
    assert_eq!(parsed["totals"]["onTrack"], 3);
    assert_eq!(parsed["totals"]["blocked"], 1);
    // lanes without cards are left out
    assert_eq!(parsed["lanes"].as_array().unwrap().len(), 2);
}

#[test]
fn test_stats_text_lists_owners() {
    let out = run_board_ok(&["stats"]);
    assert!(out.contains("Total"));
    assert!(out.contains("owners: Kim, Sam"));
}

#[test]
fn test_lanes() {
    let out = run_board_ok(&["lanes"]);
    assert!(out.contains("Product\n"));
    assert!(out.contains("Alpha (A1) (lane-a) [Product]  2 cards"));
    assert!(out.contains("DAC Reports (D9) (lane-dac) [Platform]  0 cards"));
    // lanes of one group are printed under a single heading
    assert_eq!(out.matches("Platform\n").count(), 1);
}

// ---------------------------------------------------------------------------
// Edit command tests
// ---------------------------------------------------------------------------

#[test]
fn test_owner_edit_prints_card() {
    let out = run_board_ok(&["owner", "cp1", "Jane"]);
    assert!(out.contains("Jane"));
    assert!(out.contains("[cp1]"));
    assert!(!out.contains("local only"));
}

#[test]
fn test_owner_edit_without_anchor() {
    let out = run_board_ok(&["owner", "dl1", "Jane"]);
    assert!(out.contains("(local only: no anchor block to write back to)"));
}

#[test]
fn test_move_json() {
    let out = run_board_ok(&["move", "cp2", "-q", "2026-Q1", "-l", "lane-b", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["deliverable"]["quarterId"], "2026-Q1");
    assert_eq!(parsed["deliverable"]["laneId"], "lane-b");
    // the Q2 date does not fit Q1, so the card lands mid-quarter
    assert_eq!(parsed["deliverable"]["deliveryDate"], "2026-02-15");
    assert_eq!(parsed["writtenBack"], true);
}

#[test]
fn test_move_rejects_tbd_date() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = fixture("stickyboard.toml");
    let dump = fixture("roadmap.json");
    let (stdout, stderr, success) = run_sb(
        tmp.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "--fixture",
            dump.to_str().unwrap(),
            "move",
            "cp2",
            "-q",
            "2026-Q1",
            "--date",
            "tbd",
        ],
    );
    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("invalid date: tbd"));
}

#[test]
fn test_failed_write_back_is_reported() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = fixture("stickyboard.toml");
    let text = fs::read_to_string(fixture("roadmap.json")).unwrap();
    let text = text.replace(r#""pages": {}"#, r#""pages": {}, "failing": ["own1"]"#);
    let dump = tmp.path().join("roadmap.json");
    fs::write(&dump, text).unwrap();

    let (stdout, stderr, success) = run_sb(
        tmp.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "--fixture",
            dump.to_str().unwrap(),
            "--json",
            "owner",
            "cp1",
            "Jane",
        ],
    );
    assert!(success, "owner failed: {}", stderr);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["deliverable"]["owner"], "Jane");
    assert_eq!(parsed["writtenBack"], false);
}

#[test]
fn test_date_rejects_garbage() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = fixture("stickyboard.toml");
    let dump = fixture("roadmap.json");
    let (_, stderr, success) = run_sb(
        tmp.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "--fixture",
            dump.to_str().unwrap(),
            "date",
            "cp1",
            "someday",
        ],
    );
    assert!(!success);
    assert!(stderr.contains("invalid date: someday"));
}

// ---------------------------------------------------------------------------
// Setup tests
// ---------------------------------------------------------------------------

#[test]
fn test_init_writes_config_once() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (stdout, stderr, success) = run_sb(tmp.path(), &["init"]);
    assert!(success, "init failed: {}", stderr);
    assert!(stdout.contains("Wrote"));
    assert!(tmp.path().join("stickyboard.toml").exists());

    let (_, stderr, success) = run_sb(tmp.path(), &["init"]);
    assert!(!success);
    assert!(stderr.contains("already exists"));

    let (_, _, success) = run_sb(tmp.path(), &["init", "--force"]);
    assert!(success);
}

#[test]
fn test_missing_config_is_an_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let output = Command::new(sb_bin())
        .args(["board"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("error: "));
}

#[test]
fn test_config_copied_elsewhere_still_loads() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::copy(fixture("stickyboard.toml"), tmp.path().join("stickyboard.toml")).unwrap();
    let dump = fixture("roadmap.json");
    // discovered from the working directory, no --config
    let (stdout, stderr, success) = run_sb(
        tmp.path(),
        &["--fixture", dump.to_str().unwrap(), "lanes"],
    );
    assert!(success, "lanes failed: {}", stderr);
    assert!(stdout.contains("lane-b"));
}
