#![allow(deprecated)]

mod common;

use assert_cmd::cargo;
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{BufRead, BufReader};
use std::process::Stdio;
use std::time::Duration;

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(cargo::cargo_bin!("http-control"));
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--host"))
        .stdout(predicate::str::contains("HTTP_CONTROL_PORT"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(cargo::cargo_bin!("http-control"));
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_rejects_bad_port_argument() {
    let mut cmd = Command::new(cargo::cargo_bin!("http-control"));
    cmd.arg("--port").arg("not-a-port");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--port"));
}

#[test]
fn test_cli_rejects_bad_port_environment() {
    let mut cmd = Command::new(cargo::cargo_bin!("http-control"));
    cmd.env("HTTP_CONTROL_PORT", "eighty").arg("-q");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("HTTP_CONTROL_PORT"))
        .stderr(predicate::str::contains("eighty"));
}

#[test]
fn test_demo_exits_when_running_unticked() {
    let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_http-control"))
        .args(["-q", "--port", "0", "--poll-ms", "20"])
        .env_remove("HTTP_CONTROL_PORT")
        .env_remove("HTTP_CONTROL_HOST")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn demo");

    let stdout = child.stdout.take().unwrap();
    let mut lines = BufReader::new(stdout).lines();

    let url = lines
        .by_ref()
        .map_while(|line| line.ok())
        .find_map(|line| line.strip_prefix("Serving on ").map(str::to_string))
        .expect("demo should print its address");

    // msg is registered right after start; give the demo a moment.
    std::thread::sleep(Duration::from_millis(100));

    let response = common::client()
        .post(&url)
        .form(&[("msg", "goodbye")])
        .send()
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);

    let rest: Vec<String> = lines.map_while(|line| line.ok()).collect();
    let status = child.wait().unwrap();

    assert!(status.success());
    assert!(rest.iter().any(|line| line == "msg: goodbye"), "{:?}", rest);
    assert_eq!(rest.last().map(String::as_str), Some("Stopped"));
}
