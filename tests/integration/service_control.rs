#[path = "common/mod.rs"]
mod common;

use std::fs;

use common::{FakeHost, SAMPLE_UNIT};
use predicates::str::contains;

#[test]
fn stop_then_start_matches_restart() {
    let host = FakeHost::new();
    host.write_config(false);

    host.tradectl().arg("stop").assert().success();
    host.tradectl().arg("start").assert().success();
    host.tradectl().arg("restart").assert().success();

    assert_eq!(
        host.calls(),
        vec![
            "systemctl --user stop tradecopy.service",
            "systemctl --user start tradecopy.service",
            "systemctl --user restart tradecopy.service",
        ]
    );
}

#[test]
fn stop_failure_is_reported() {
    let host = FakeHost::new();
    host.write_config(false);
    host.fail_on(&[("stop", 5)]);

    host.tradectl()
        .arg("stop")
        .assert()
        .failure()
        .stderr(contains("Step 'stop' failed"))
        .stderr(contains("Some(5)"));
}

#[test]
fn status_passes_exit_code_through() {
    let host = FakeHost::new();
    host.write_config(false);
    host.fail_on(&[("status", 3)]);

    host.tradectl().arg("status").assert().code(3);
    assert_eq!(
        host.calls(),
        vec!["systemctl --user status tradecopy.service --no-pager"]
    );
}

#[test]
fn status_json_reports_properties() {
    let host = FakeHost::new();
    host.write_config(false);

    let output = host
        .tradectl()
        .arg("status")
        .arg("--json")
        .output()
        .expect("failed to run status");
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status output is JSON");
    assert_eq!(json["id"], "tradecopy.service");
    assert_eq!(json["active_state"], "active");
    assert_eq!(json["main_pid"], 4242);
    assert_eq!(json["unit_file_state"], "enabled");
    assert_eq!(json["linger"], false);
}

#[test]
fn logs_query_the_journal() {
    let host = FakeHost::new();
    host.write_config(false);

    host.tradectl()
        .arg("logs")
        .arg("-n")
        .arg("5")
        .arg("--follow")
        .assert()
        .success()
        .stdout(contains("copied signal"));

    assert_eq!(
        host.calls(),
        vec!["journalctl --user -u tradecopy.service -n 5 --no-pager -f"]
    );
}

#[test]
fn enable_registers_then_starts() {
    let host = FakeHost::new();
    host.write_config(false);

    host.tradectl().arg("enable").assert().success();
    assert_eq!(
        host.calls(),
        vec![
            "systemctl --user enable tradecopy.service",
            "systemctl --user start tradecopy.service",
        ]
    );
}

#[test]
fn uninstall_removes_unit_and_reloads() {
    let host = FakeHost::new();
    host.write_config(false);
    host.write_source(SAMPLE_UNIT);
    host.tradectl().arg("install").assert().success();
    assert!(host.installed_path().exists());

    host.tradectl()
        .arg("uninstall")
        .assert()
        .success()
        .stdout(contains("removed"));

    assert!(!host.installed_path().exists());
    assert_eq!(
        host.calls(),
        vec![
            "systemctl --user stop tradecopy.service",
            "systemctl --user disable tradecopy.service",
            "systemctl --user daemon-reload",
        ]
    );
}

#[test]
fn missing_service_manager_fails_to_spawn() {
    let host = FakeHost::new();
    host.write_config(false);
    fs::remove_file(host.bin_dir().join("systemctl")).unwrap();

    host.tradectl()
        .arg("reload")
        .assert()
        .code(1)
        .stderr(contains("Failed to run '"))
        .stderr(contains("systemctl"));
    assert!(host.calls().is_empty());
}

#[test]
fn dry_run_status_json_keeps_stdout_empty() {
    let host = FakeHost::new();
    host.write_config(false);

    let output = host
        .tradectl()
        .arg("--dry-run")
        .arg("status")
        .arg("--json")
        .output()
        .expect("failed to run status");
    assert!(output.status.success());

    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("would run:"), "stderr: {stderr}");
    assert!(stderr.contains("show tradecopy.service"), "stderr: {stderr}");
    assert!(host.calls().is_empty());
}

#[test]
fn dry_run_uninstall_keeps_unit_and_reports_nothing_removed() {
    let host = FakeHost::new();
    host.write_config(false);
    host.write_source(SAMPLE_UNIT);
    host.tradectl().arg("install").assert().success();

    let output = host
        .tradectl()
        .arg("--dry-run")
        .arg("uninstall")
        .output()
        .expect("failed to run uninstall");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("removed"), "stdout: {stdout}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("would remove"), "stderr: {stderr}");
    assert!(host.installed_path().exists());
    assert!(host.calls().is_empty());
}
