//! CLI tests for the nlvrf command.
//!
//! These tests exercise argument parsing and configuration handling, and
//! stop before any kernel state would be changed.

use assert_cmd::Command;
use predicates::prelude::*;

fn nlvrf_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_nlvrf"))
}

mod global_flags {
    use super::*;

    #[test]
    fn test_help() {
        nlvrf_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("VRF membership tool"))
            .stdout(predicate::str::contains("--netns"))
            .stdout(predicate::str::contains("--json"));
    }

    #[test]
    fn test_version() {
        nlvrf_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("nlvrf"));
    }

    #[test]
    fn test_invalid_subcommand() {
        nlvrf_cmd()
            .arg("invalid_command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn test_missing_netns_is_reported() {
        nlvrf_cmd()
            .args(["--netns", "/nonexistent/netns", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("namespace not found"));
    }
}

mod add_command {
    use super::*;

    #[test]
    fn test_add_help() {
        nlvrf_cmd()
            .args(["add", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--ifname"))
            .stdout(predicate::str::contains("--vrf"))
            .stdout(predicate::str::contains("--table"))
            .stdout(predicate::str::contains("--config"));
    }

    #[test]
    fn test_add_requires_ifname() {
        nlvrf_cmd()
            .args(["add", "--vrf", "blue"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("required"));
    }

    #[test]
    fn test_add_requires_vrf_name() {
        nlvrf_cmd()
            .args(["add", "--ifname", "eth0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "configuration is expected to have a valid vrf name",
            ));
    }

    #[test]
    fn test_add_rejects_non_numeric_table() {
        nlvrf_cmd()
            .args(["add", "--ifname", "eth0", "--vrf", "blue", "--table", "main"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid value"));
    }

    #[test]
    fn test_add_rejects_duplicated_keys() {
        nlvrf_cmd()
            .args(["add", "--ifname", "eth0", "--config", "-"])
            .write_stdin(r#"{"vrfname":"blue","table":1,"table":2}"#)
            .assert()
            .failure()
            .stderr(predicate::str::contains(r#"duplicated key "table" is not allowed"#));
    }

    #[test]
    fn test_add_vrf_flag_completes_config() {
        nlvrf_cmd()
            .args(["add", "--ifname", "eth0", "--vrf", "blue", "--config", "-"])
            .args(["--netns", "/nonexistent/netns"])
            .write_stdin(r#"{"name":"net","type":"vrf"}"#)
            .assert()
            .failure()
            .stderr(predicate::str::contains("namespace not found"));
    }

    #[test]
    fn test_add_reports_missing_config_file() {
        nlvrf_cmd()
            .args(["add", "--ifname", "eth0", "--config", "/nonexistent/nlvrf.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("I/O error"));
    }
}

mod del_command {
    use super::*;

    #[test]
    fn test_del_requires_ifname() {
        nlvrf_cmd()
            .arg("del")
            .assert()
            .failure()
            .stderr(predicate::str::contains("required"));
    }

    #[test]
    fn test_del_is_best_effort() {
        nlvrf_cmd()
            .args(["--netns", "/nonexistent/netns", "del", "--ifname", "eth0"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }
}

mod check_command {
    use super::*;

    #[test]
    fn test_check_help() {
        nlvrf_cmd()
            .args(["check", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--ifname"));
    }

    #[test]
    fn test_check_requires_vrf_name() {
        nlvrf_cmd()
            .args(["check", "--ifname", "eth0", "--config", "-"])
            .write_stdin(r#"{"name":"net","type":"vrf"}"#)
            .assert()
            .failure()
            .stderr(predicate::str::contains("valid vrf name"));
    }
}

mod show_command {
    use super::*;

    #[test]
    fn test_show_alias() {
        nlvrf_cmd()
            .args(["ls", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Show VRF devices"));
    }
}
