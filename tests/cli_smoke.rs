use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// Helper to get a Command for the `ccline` binary with an isolated home
// directory, so no real config, credentials or memory files leak in.
fn ccline(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ccline").expect("binary exists");
    cmd.env("HOME", home)
        .env_remove("CCLINE_CONFIG")
        .env_remove("CCLINE_SINGLE_LINE")
        .env_remove("CCLINE_LOG")
        .env_remove("NO_COLOR");
    cmd
}

fn write_config(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("statusline.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

fn session_json(cwd: &Path) -> String {
    serde_json::json!({
        "session_id": "s-1",
        "cwd": cwd,
        "model": {"id": "claude-opus-4-5", "display_name": ""},
        "version": "2.0.14",
        "context_window": {
            "context_window_size": 200000,
            "current_usage": {
                "input_tokens": 40000,
                "output_tokens": 5000,
                "cache_read_input_tokens": 8000,
                "cache_creation_input_tokens": 2000
            }
        }
    })
    .to_string()
}

fn git_available() -> bool {
    StdCommand::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let status = StdCommand::new("git")
        .args(["-c", "user.name=ccline", "-c", "user.email=ccline@example.com"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git runs")
        .status;
    assert!(status.success(), "git {:?} failed", args);
}

// -----------------------------------------------------------------------
// Basic CLI
// -----------------------------------------------------------------------

#[test]
fn help_shows_description() {
    let home = TempDir::new().unwrap();
    ccline(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("status line"));
}

#[test]
fn version_shows_semver() {
    let home = TempDir::new().unwrap();
    ccline(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn types_lists_content_types_and_fragments() {
    let home = TempDir::new().unwrap();
    ccline(home.path())
        .args(["types", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"token-usage\""))
        .stdout(predicate::str::contains("\"model-info\""));
}

// -----------------------------------------------------------------------
// Input handling
// -----------------------------------------------------------------------

#[test]
fn empty_stdin_prints_nothing() {
    let home = TempDir::new().unwrap();
    ccline(home.path())
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn nul_only_stdin_prints_nothing() {
    let home = TempDir::new().unwrap();
    ccline(home.path())
        .write_stdin("\0\0\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn malformed_json_reports_on_stderr_only() {
    let home = TempDir::new().unwrap();
    ccline(home.path())
        .arg("--no-color")
        .write_stdin("{not json")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("invalid status line input"));
}

#[test]
fn nul_prefixed_json_renders() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let config = write_config(home.path(), "show: [folder, model]\n");
    let payload = format!("\0\0{}", session_json(work.path()));

    ccline(home.path())
        .arg("--no-color")
        .env("CCLINE_CONFIG", &config)
        .write_stdin(payload)
        .assert()
        .success()
        .stdout(predicate::str::contains("claude-opus-4-5"));
}

// -----------------------------------------------------------------------
// Rendering
// -----------------------------------------------------------------------

#[test]
fn tokens_fragment_renders_usage_and_percent() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let config = write_config(
        home.path(),
        "show: [token-usage, token-percent]\ncells:\n  - { name: tokens, row: 3, col: 0 }\n",
    );

    ccline(home.path())
        .arg("--no-color")
        .env("CCLINE_CONFIG", &config)
        .write_stdin(session_json(work.path()))
        .assert()
        .success()
        .stdout(predicate::str::contains("55.0K/200K (27.5%)"));
}

#[test]
fn model_defaults_to_claude() {
    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), "show: [model]\n");

    ccline(home.path())
        .arg("--no-color")
        .env("CCLINE_CONFIG", &config)
        .write_stdin("{}")
        .assert()
        .success()
        .stdout("Claude\n");
}

#[test]
fn no_color_output_has_no_ansi() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let output = ccline(home.path())
        .arg("--no-color")
        .write_stdin(session_json(work.path()))
        .output()
        .expect("failed to run");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.is_empty());
    assert!(
        !stdout.contains('\x1b'),
        "output must contain no ANSI escapes with --no-color: {:?}",
        stdout
    );
}

#[test]
fn no_color_env_var_has_no_ansi() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let output = ccline(home.path())
        .env("NO_COLOR", "1")
        .write_stdin(session_json(work.path()))
        .output()
        .expect("failed to run");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains('\x1b'), "unexpected ANSI: {:?}", stdout);
}

#[test]
fn rows_render_as_separate_lines() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let config = write_config(home.path(), "show: [model, version]\n");

    let output = ccline(home.path())
        .arg("--no-color")
        .env("CCLINE_CONFIG", &config)
        .write_stdin(session_json(work.path()))
        .output()
        .expect("failed to run");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "got {:?}", lines);
    assert!(lines[0].starts_with("claude-opus-4-5"));
    assert!(lines[1].starts_with("v2.0.14"));
}

#[test]
fn single_line_env_collapses_rows() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let config = write_config(home.path(), "show: [model, version]\n");

    ccline(home.path())
        .arg("--no-color")
        .env("CCLINE_CONFIG", &config)
        .env("CCLINE_SINGLE_LINE", "1")
        .write_stdin(session_json(work.path()))
        .assert()
        .success()
        .stdout("claude-opus-4-5 | v2.0.14        \n");
}

#[test]
fn default_layout_shows_token_percent() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    ccline(home.path())
        .arg("--no-color")
        .write_stdin(session_json(work.path()))
        .assert()
        .success()
        .stdout(predicate::str::contains("[55.0K/200K (27.5%)]"));
}

#[test]
fn null_model_fields_default_to_claude() {
    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), "show: [model]\n");

    ccline(home.path())
        .arg("--no-color")
        .env("CCLINE_CONFIG", &config)
        .write_stdin(r#"{"model":{"id":null,"display_name":null},"cwd":null}"#)
        .assert()
        .success()
        .stdout("Claude\n");
}

#[test]
fn project_config_overrides_global() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    std::fs::create_dir_all(home.path().join(".claude")).unwrap();
    std::fs::write(
        home.path().join(".claude/statusline.yaml"),
        "show: [model, version]\nsingle_line: true\n",
    )
    .unwrap();
    std::fs::create_dir_all(work.path().join(".claude")).unwrap();
    std::fs::write(work.path().join(".claude/statusline.yaml"), "show: [version]\n").unwrap();

    ccline(home.path())
        .arg("--no-color")
        .write_stdin(session_json(work.path()))
        .assert()
        .success()
        .stdout("v2.0.14\n");
}

#[test]
fn broken_config_is_warned_and_skipped() {
    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), "show: [model\n");

    ccline(home.path())
        .arg("--no-color")
        .env("CCLINE_CONFIG", &config)
        .write_stdin("{}")
        .assert()
        .success()
        .stdout(predicate::str::contains("Claude"))
        .stderr(predicate::str::contains("yaml parse error"));
}

// -----------------------------------------------------------------------
// Git
// -----------------------------------------------------------------------

#[test]
fn fresh_repository_shows_empty_branch() {
    if !git_available() {
        eprintln!("git not installed, skipping");
        return;
    }
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    git(repo.path(), &["init", "-q"]);
    let config = write_config(home.path(), "show: [git-branch, git-status, git-remote]\n");

    ccline(home.path())
        .arg("--no-color")
        .env("CCLINE_CONFIG", &config)
        .write_stdin(session_json(repo.path()))
        .assert()
        .success()
        .stdout("(empty)\n");
}

#[test]
fn repository_status_counts_changes() {
    if !git_available() {
        eprintln!("git not installed, skipping");
        return;
    }
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    git(repo.path(), &["-c", "init.defaultBranch=main", "init", "-q"]);
    std::fs::write(repo.path().join("tracked.txt"), "one\n").unwrap();
    git(repo.path(), &["add", "tracked.txt"]);
    git(repo.path(), &["commit", "-q", "-m", "initial"]);
    std::fs::write(repo.path().join("tracked.txt"), "two\n").unwrap();
    git(repo.path(), &["add", "tracked.txt"]);
    std::fs::write(repo.path().join("new-a.txt"), "a").unwrap();
    std::fs::write(repo.path().join("new-b.txt"), "b").unwrap();
    let config = write_config(home.path(), "show: [git-branch, git-status, git-remote]\n");

    ccline(home.path())
        .arg("--no-color")
        .env("CCLINE_CONFIG", &config)
        .write_stdin(session_json(repo.path()))
        .assert()
        .success()
        .stdout("main +3 ~1\n");
}

#[test]
fn outside_repository_has_no_git_fragment() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let config = write_config(home.path(), "show: [model, git-branch, git-status]\n");

    ccline(home.path())
        .arg("--no-color")
        .env("CCLINE_CONFIG", &config)
        .write_stdin(session_json(work.path()))
        .assert()
        .success()
        .stdout("claude-opus-4-5\n");
}

// -----------------------------------------------------------------------
// Init
// -----------------------------------------------------------------------

#[test]
fn init_writes_global_config_once() {
    let home = TempDir::new().unwrap();
    ccline(home.path())
        .arg("init")
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote"));
    let written = home.path().join(".claude/statusline.yaml");
    assert!(written.is_file());

    ccline(home.path())
        .arg("init")
        .assert()
        .success()
        .stderr(predicate::str::contains("already exists"));

    ccline(home.path())
        .args(["init", "--force"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote"));
}

#[test]
fn init_project_writes_under_current_dir() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    ccline(home.path())
        .args(["init", "--project"])
        .current_dir(project.path())
        .assert()
        .success();
    assert!(project.path().join(".claude/statusline.yaml").is_file());
}
