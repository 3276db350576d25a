//! Integration tests for top-level CLI behavior.

use std::io::Write;
use std::process::Command;

fn run_specsync(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_specsync");
    Command::new(bin).args(args).output().expect("failed to run specsync binary")
}

fn write_minimal_config(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("specsync.yml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "github:\n  owner: acme\n  repo: demo\n").unwrap();
    path
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let output = run_specsync(&["nonsense"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn sync_without_name_or_all_fails() {
    let dir = std::env::temp_dir().join("specsync_cli_sync_missing_target");
    std::fs::create_dir_all(&dir).unwrap();
    let config_path = write_minimal_config(&dir);

    let output = run_specsync(&["--config", config_path.to_str().unwrap(), "sync"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("spec name") || stderr.contains("--all"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn sync_with_missing_config_file_fails() {
    let output = run_specsync(&["--config", "/nonexistent/specsync.yml", "sync", "--all"]);
    assert!(!output.status.success());
}

#[test]
fn status_on_empty_tree_reports_no_specs() {
    let dir = std::env::temp_dir().join("specsync_cli_status_empty");
    std::fs::create_dir_all(&dir).unwrap();
    let config_path = dir.join("specsync.yml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(file, "specs_root: nope\ngithub:\n  owner: acme\n  repo: demo\n").unwrap();

    let output = run_specsync(&["--config", config_path.to_str().unwrap(), "status"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No specs found"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn status_on_missing_spec_name_fails() {
    let dir = std::env::temp_dir().join("specsync_cli_status_missing_name");
    std::fs::create_dir_all(&dir).unwrap();
    let config_path = write_minimal_config(&dir);

    let output =
        run_specsync(&["--config", config_path.to_str().unwrap(), "status", "does-not-exist"]);
    assert!(!output.status.success());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn help_exits_successfully() {
    let output = run_specsync(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sync"));
    assert!(stdout.contains("status"));
}
