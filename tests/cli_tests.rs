#![cfg(feature = "cli_api")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    for var in [
        "ESTIMATE_TOOL_DB",
        "ESTIMATE_TOOL_CATALOG",
        "ESTIMATE_TOOL_SAMPLES",
        "ESTIMATE_TOOL_CREW_ROUNDING",
    ] {
        cmd.env_remove(var);
    }
    cmd.write_stdin(script.to_string()).assert()
}

#[test]
fn cli_lists_the_catalog() {
    run_cli("catalog\nquit\n")
        .success()
        .stdout(str_contains("Brickwork"))
        .stdout(str_contains("Roof Tiling"));
}

#[test]
fn cli_compresses_to_the_time_frame() {
    run_cli("frame 5\nadd 10 2 Brickwork\nadd 20 1 Flooring\ncompute\nquit\n")
        .success()
        .stdout(str_contains("Added Brickwork."))
        .stdout(str_contains("compressed=2"))
        .stdout(str_contains("peak_crew=5"));
}

#[test]
fn cli_reports_validation_errors() {
    run_cli("add -4 2 Brickwork\ncompute\nquit\n")
        .success()
        .stdout(str_contains("Error: element 'Brickwork' has invalid quantity"));
}

#[test]
fn cli_warns_once_when_progress_overruns() {
    let assert = run_cli(
        "frame 5\nadd 10 2 Brickwork\nadd 20 1 Flooring\ncommit\nprogress 2 Brickwork\nprogress 3 Brickwork\nstatus\nquit\n",
    )
    .success()
    .stdout(str_contains("Committed estimate 1."));
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    let warnings = output
        .matches("Warning: installation of Brickwork has exceeded")
        .count();
    assert_eq!(warnings, 1, "expected a single overrun warning:\n{output}");
    assert!(output.contains("(overrun)"));
}

#[test]
fn cli_progress_requires_a_commit() {
    run_cli("progress 3 Brickwork\nquit\n")
        .success()
        .stdout(str_contains("No committed estimate."));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().replace('\\', "\\\\");
    let script = format!(
        "name Garden Wall\nadd 12 2 Brickwork\ncompute\nsave json {path}\nclear\nadd 3 1 Windows\ncompute\nload json {path}\nquit\n"
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Estimate saved to"));
    let after_reload = output
        .split("Estimate loaded from")
        .last()
        .unwrap_or_default();
    assert!(
        after_reload.contains("Brickwork"),
        "reloaded estimate should contain Brickwork:\n{after_reload}"
    );
    assert!(
        !after_reload.contains("Windows"),
        "reloaded estimate should not contain Windows:\n{after_reload}"
    );
}

#[test]
fn cli_sets_the_country() {
    run_cli("show\ncountry Ireland\nshow\nquit\n")
        .success()
        .stdout(str_contains("Country      : UK"))
        .stdout(str_contains("Country      : Ireland"));
}
