//! CLI integration tests
//!
//! Every run replays captured tool output through the hidden `--replay`
//! flag, so the binary never touches the real network stack.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

const PORTS: &str = "
Hardware Port: Ethernet
Device: en0
Ethernet Address: a4:83:e7:12:34:56
";

const IFCONFIG_ACTIVE: &str = "en0: flags=8863<UP,BROADCAST,SMART,RUNNING,SIMPLEX,MULTICAST> mtu 1500
\tether a4:83:e7:12:34:56
\tinet 192.168.1.23 netmask 0xffffff00 broadcast 192.168.1.255
\tmedia: autoselect (1000baseT <full-duplex>)
\tstatus: active
";

const IFCONFIG_INACTIVE: &str = "en0: flags=8863<UP,BROADCAST,SMART,RUNNING,SIMPLEX,MULTICAST> mtu 1500
\tether a4:83:e7:12:34:56
\tmedia: autoselect
\tstatus: inactive
";

const ROUTES: &str = "Routing tables

Internet:
Destination        Gateway            Flags           Netif Expire
default            192.168.1.1        UGScg             en0
127                127.0.0.1          UCS               lo0
";

const PING_CLEAN: &str = "PING 192.168.1.1 (192.168.1.1): 56 data bytes

--- 192.168.1.1 ping statistics ---
10 packets transmitted, 10 packets received, 0.0% packet loss
round-trip min/avg/max/stddev = 1.802/2.345/3.101/0.412 ms
";

const PING_LOSSY: &str = "PING 192.168.1.1 (192.168.1.1): 56 data bytes

--- 192.168.1.1 ping statistics ---
10 packets transmitted, 3 packets received, 70.0% packet loss
round-trip min/avg/max/stddev = 100.000/150.000/200.000/25.000 ms
";

/// A scratch directory holding the replay capture; also used as the
/// working directory so no stray `.env` is picked up
struct Fixture {
    dir: TempDir,
    capture: PathBuf,
}

impl Fixture {
    fn new(ifconfig: &str, ping: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let capture = dir.path().join("capture.json");
        let outputs = json!({
            "networksetup -listallhardwareports": { "stdout": PORTS, "exit_code": 0 },
            "ifconfig en0": { "stdout": ifconfig, "exit_code": 0 },
            "netstat -rn": { "stdout": ROUTES, "exit_code": 0 },
            "ping -c 10 192.168.1.1": { "stdout": ping, "exit_code": 0 },
        });
        fs::write(&capture, serde_json::to_string_pretty(&outputs).unwrap()).unwrap();
        Self { dir, capture }
    }

    fn healthy() -> Self {
        Self::new(IFCONFIG_ACTIVE, PING_CLEAN)
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("netanalyzer").unwrap();
        cmd.current_dir(self.dir.path())
            .env_remove("NA_MODE")
            .env_remove("NA_PING_COUNT")
            .env_remove("NA_RUN_TIMEOUT")
            .env("NO_COLOR", "1")
            .arg("--replay")
            .arg(&self.capture);
        cmd
    }
}

fn parse_stdout(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_offline_json_report() {
    let fixture = Fixture::healthy();
    let output = fixture
        .cmd()
        .args(["--mode", "offline", "-i", "en0", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report = parse_stdout(&output);
    assert_eq!(report["mode"], "offline");
    assert_eq!(report["record"]["name"], "en0");
    assert_eq!(report["record"]["hardware_port"], "Ethernet");
    assert_eq!(report["record"]["is_active"], true);
    assert_eq!(report["record"]["latency"]["packets_received"], 10);
    assert_eq!(report["assessment"]["score"], 100);
    assert!(report.get("interruption").is_none());
}

#[test]
fn test_default_route_interface_is_used() {
    let fixture = Fixture::healthy();
    let output = fixture.cmd().args(["--mode", "offline", "--json"]).output().unwrap();

    assert!(output.status.success());
    assert_eq!(parse_stdout(&output)["record"]["name"], "en0");
}

#[test]
fn test_text_report() {
    Fixture::healthy()
        .cmd()
        .args(["--mode", "offline", "-i", "en0", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Network Analysis: en0"))
        .stdout(predicate::str::contains("192.168.1.23"))
        .stdout(predicate::str::contains("Health Assessment"))
        .stdout(predicate::str::contains("No issues found."));
}

#[test]
fn test_verbose_report_includes_routes() {
    Fixture::healthy()
        .cmd()
        .args(["--mode", "offline", "-i", "en0", "--no-color", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Routes (1):"))
        .stdout(predicate::str::contains("UGScg"));
}

#[test]
fn test_degraded_connection_is_graded() {
    let fixture = Fixture::new(IFCONFIG_INACTIVE, PING_LOSSY);
    let output = fixture
        .cmd()
        .args(["--mode", "offline", "-i", "en0", "--json"])
        .output()
        .unwrap();

    // Without --strict a poor grade is still a successful run
    assert!(output.status.success());
    let report = parse_stdout(&output);
    assert_eq!(report["assessment"]["category"], "critical");
    assert_eq!(report["assessment"]["score"], 15);
}

#[test]
fn test_strict_fails_on_critical() {
    Fixture::new(IFCONFIG_INACTIVE, PING_LOSSY)
        .cmd()
        .args(["--mode", "offline", "-i", "en0", "--strict", "--no-color"])
        .assert()
        .code(4)
        .stdout(predicate::str::contains("CRITICAL"));
}

#[test]
fn test_strict_passes_on_healthy() {
    Fixture::healthy()
        .cmd()
        .args(["--mode", "offline", "-i", "en0", "--strict", "--json"])
        .assert()
        .success();
}

#[test]
fn test_unknown_interface_exits_with_config_error() {
    Fixture::healthy()
        .cmd()
        .args(["--mode", "offline", "-i", "en9", "--no-color"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("en9"));
}

#[test]
fn test_invalid_interface_name_is_rejected() {
    Fixture::healthy()
        .cmd()
        .args(["--mode", "offline", "-i", "en0;reboot"])
        .assert()
        .code(1);
}

#[test]
fn test_offline_with_iperf3_is_rejected() {
    Fixture::healthy()
        .cmd()
        .args(["--mode", "offline", "--iperf3", "10.0.0.5"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--mode offline"));
}

#[test]
fn test_missing_replay_file() {
    Command::cargo_bin("netanalyzer")
        .unwrap()
        .args(["--replay", "/nonexistent/capture.json", "--mode", "offline"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Replay file not found"));
}

#[test]
fn test_env_file_sets_mode() {
    let fixture = Fixture::healthy();
    fs::write(fixture.dir.path().join(".env"), "NA_MODE=offline\n").unwrap();

    let output = fixture.cmd().args(["-i", "en0", "--json"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(parse_stdout(&output)["mode"], "offline");
}

#[test]
fn test_invalid_env_value_is_config_error() {
    Fixture::healthy()
        .cmd()
        .env("NA_PING_COUNT", "many")
        .args(["--mode", "offline", "-i", "en0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("NA_PING_COUNT"));
}

#[test]
fn test_env_help() {
    Command::cargo_bin("netanalyzer")
        .unwrap()
        .arg("--env-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("NA_MODE"))
        .stdout(predicate::str::contains("Configuration Priority"));
}

#[test]
fn test_version_and_help() {
    Command::cargo_bin("netanalyzer")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("netanalyzer"));

    Command::cargo_bin("netanalyzer")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--interface"))
        .stdout(predicate::str::contains("--replay").not());
}
