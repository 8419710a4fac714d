#![allow(dead_code)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use assert_cmd::Command;
use tempfile::{TempDir, tempdir};

/// Stand-in for systemctl/journalctl/loginctl that records each call.
///
/// Every fake appends `<program> <args>` to a shared log. A verb registered
/// with [`FakeHost::fail_on`] makes the fake exit with the given code, and
/// `loginctl enable-linger <user>` drops a marker into the linger directory
/// the way logind does.
pub struct FakeHost {
    temp: TempDir,
}

impl FakeHost {
    pub fn new() -> Self {
        let host = Self {
            temp: tempdir().expect("failed to create tempdir"),
        };
        fs::create_dir_all(host.bin_dir()).expect("failed to create bin dir");
        fs::create_dir_all(host.linger_dir()).expect("failed to create linger dir");
        host.write_fakes(&[]);
        host
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root().join("bin")
    }

    pub fn unit_dir(&self) -> PathBuf {
        self.root().join("units")
    }

    pub fn linger_dir(&self) -> PathBuf {
        self.root().join("linger")
    }

    pub fn log_path(&self) -> PathBuf {
        self.root().join("calls.log")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("tradectl.yaml")
    }

    pub fn source_path(&self) -> PathBuf {
        self.root().join("tradecopy.service")
    }

    pub fn installed_path(&self) -> PathBuf {
        self.unit_dir().join("tradecopy.service")
    }

    /// Re-creates the fakes so that any argument equal to a listed verb exits
    /// with the paired code.
    pub fn fail_on(&self, failures: &[(&str, i32)]) {
        self.write_fakes(failures);
    }

    fn write_fakes(&self, failures: &[(&str, i32)]) {
        let log = self.log_path();
        let mut checks = String::new();
        for (verb, code) in failures {
            checks.push_str(&format!(
                "  if [ \"$arg\" = \"{verb}\" ]; then exit {code}; fi\n"
            ));
        }

        let systemctl = format!(
            r#"#!/bin/sh
echo "systemctl $*" >> "{log}"
for arg in "$@"; do
{checks}  if [ "$arg" = "show" ]; then
    printf 'Id=tradecopy.service\nLoadState=loaded\nActiveState=active\nSubState=running\nMainPID=4242\nUnitFileState=enabled\n'
  fi
done
exit 0
"#,
            log = log.display(),
        );

        let journalctl = format!(
            r#"#!/bin/sh
echo "journalctl $*" >> "{log}"
echo "tradecopy[4242]: copied signal"
exit 0
"#,
            log = log.display(),
        );

        let loginctl = format!(
            r#"#!/bin/sh
echo "loginctl $*" >> "{log}"
for arg in "$@"; do
{checks}  :
done
if [ "$1" = "enable-linger" ]; then
  touch "{linger}/$2"
fi
exit 0
"#,
            log = log.display(),
            linger = self.linger_dir().display(),
        );

        for (name, body) in [
            ("systemctl", systemctl),
            ("journalctl", journalctl),
            ("loginctl", loginctl),
        ] {
            let path = self.bin_dir().join(name);
            fs::write(&path, body).expect("failed to write fake tool");
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .expect("failed to chmod fake tool");
        }
    }

    /// Writes a config pointing every tool and directory into this host.
    pub fn write_config(&self, linger_enabled: bool) {
        self.write_config_with(linger_enabled, "");
    }

    /// Like [`FakeHost::write_config`], with extra YAML appended under `unit:`.
    pub fn write_config_with(&self, linger_enabled: bool, unit_extra: &str) {
        let bin = self.bin_dir();
        let config = format!(
            r#"unit:
  name: tradecopy
{unit_extra}install_dir: {units}
linger:
  enabled: {linger_enabled}
  state_dir: {linger}
tools:
  systemctl: {bin}/systemctl
  journalctl: {bin}/journalctl
  loginctl: {bin}/loginctl
  escalate: ""
"#,
            units = self.unit_dir().display(),
            linger = self.linger_dir().display(),
            bin = bin.display(),
        );
        fs::write(self.config_path(), config).expect("failed to write config");
    }

    /// Points `install_dir` in the written config at `dir`.
    pub fn set_install_dir(&self, dir: &Path) {
        let config = fs::read_to_string(self.config_path()).expect("failed to read config");
        let config = config.replace(
            &format!("install_dir: {}", self.unit_dir().display()),
            &format!("install_dir: {}", dir.display()),
        );
        fs::write(self.config_path(), config).expect("failed to write config");
    }

    pub fn write_source(&self, content: &str) {
        fs::write(self.source_path(), content).expect("failed to write unit source");
    }

    /// Recorded calls, one per line.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .map(|content| content.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// A `tradectl` command already pointed at this host's config.
    pub fn tradectl(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tradectl"));
        cmd.current_dir(self.root())
            .env("RUST_LOG", "info")
            .arg("--config")
            .arg(self.config_path());
        cmd
    }
}

pub const SAMPLE_UNIT: &str = "[Unit]
Description=Trade copy bot

[Service]
WorkingDirectory=/opt/tradecopy
ExecStart=/usr/bin/python3 main.py
Restart=always

[Install]
WantedBy=default.target
";
