#[path = "common/mod.rs"]
mod common;

use std::fs;

use assert_cmd::Command;
use common::{FakeHost, SAMPLE_UNIT};
use predicates::str::contains;
use tempfile::tempdir;

#[test]
fn install_twice_leaves_identical_copy() {
    let host = FakeHost::new();
    host.write_config(false);
    host.write_source(SAMPLE_UNIT);

    host.tradectl()
        .arg("install")
        .assert()
        .success()
        .stdout(contains("installed"));

    host.tradectl()
        .arg("install")
        .assert()
        .success()
        .stdout(contains("unchanged"));

    assert_eq!(
        fs::read_to_string(host.installed_path()).unwrap(),
        SAMPLE_UNIT
    );
    assert!(host.calls().is_empty(), "install must not call the manager");
}

#[test]
fn install_after_edit_updates_copy() {
    let host = FakeHost::new();
    host.write_config(false);
    host.write_source(SAMPLE_UNIT);
    host.tradectl().arg("install").assert().success();

    let edited = SAMPLE_UNIT.replace("Restart=always", "Restart=on-failure");
    host.write_source(&edited);

    host.tradectl()
        .arg("install")
        .assert()
        .success()
        .stdout(contains("updated"));
    assert_eq!(fs::read_to_string(host.installed_path()).unwrap(), edited);
}

#[test]
fn install_fails_without_source() {
    let host = FakeHost::new();
    host.write_config(false);

    host.tradectl()
        .arg("install")
        .assert()
        .failure()
        .stderr(contains("Unit source file not found"));
    assert!(!host.installed_path().exists());
}

#[test]
fn install_renders_template_when_no_source() {
    let host = FakeHost::new();
    host.write_config_with(
        false,
        "  template:\n    description: Trade copy bot\n    exec_start: /usr/bin/python3 main.py\n",
    );

    host.tradectl().arg("install").assert().success();

    let installed = fs::read_to_string(host.installed_path()).unwrap();
    assert!(installed.contains("Description=Trade copy bot"));
    assert!(installed.contains("ExecStart=/usr/bin/python3 main.py"));
    assert!(installed.contains("WantedBy=default.target"));
}

#[test]
fn dry_run_install_does_not_write() {
    let host = FakeHost::new();
    host.write_config(false);
    host.write_source(SAMPLE_UNIT);

    host.tradectl()
        .arg("--dry-run")
        .arg("install")
        .assert()
        .success()
        .stderr(contains("would install"));
    assert!(!host.installed_path().exists());
}

#[test]
fn install_into_unwritable_destination_fails() {
    let host = FakeHost::new();
    host.write_config(false);
    host.write_source(SAMPLE_UNIT);
    let blocker = host.root().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    host.set_install_dir(&blocker.join("units"));

    host.tradectl()
        .arg("install")
        .assert()
        .code(1)
        .stderr(contains("Failed to install unit file to"));
    assert!(blocker.is_file());
}

#[test]
fn default_unit_dir_is_under_home_config() {
    let temp = tempdir().expect("failed to create tempdir");
    let home = temp.path().join("home");
    let project = temp.path().join("project");
    fs::create_dir_all(&home).unwrap();
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("tradecopy.service"), SAMPLE_UNIT).unwrap();

    Command::new(assert_cmd::cargo::cargo_bin!("tradectl"))
        .current_dir(&project)
        .env("HOME", &home)
        .env_remove("XDG_CONFIG_HOME")
        .arg("install")
        .assert()
        .success();

    let installed = home.join(".config/systemd/user/tradecopy.service");
    assert_eq!(fs::read_to_string(installed).unwrap(), SAMPLE_UNIT);
}
