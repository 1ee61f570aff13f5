//! End-to-end CLI tests for the retriever binary.
//!
//! Each test runs the binary in its own temp working directory with an
//! isolated `XDG_CONFIG_HOME`.

#![allow(deprecated)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::fixtures::project_tarball;
use support::socket_guard::start_mock_server_or_skip;

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        mock_server
    }};
}

/// Binary command rooted in `work` with no user config or `RUST_LOG` leaking in.
fn retriever_cmd(work: &Path, config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("retriever").unwrap();
    cmd.current_dir(work)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("RUST_LOG")
        .env_remove("NO_COLOR");
    cmd
}

fn write_config(config_home: &Path, contents: &str) {
    let dir = config_home.join("retriever");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

async fn mount_body(server: &MockServer, path_str: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("retriever").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--url"))
        .stdout(predicate::str::contains("--extract"));
}

#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("retriever").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("retriever"));
}

#[test]
fn test_binary_missing_url_is_usage_error() {
    let mut cmd = Command::cargo_bin("retriever").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--url"));
}

#[test]
fn test_binary_malformed_url_exits_one() {
    let work = TempDir::new().unwrap();
    let config_home = TempDir::new().unwrap();

    retriever_cmd(work.path(), config_home.path())
        .args(["-u", "not a url"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[Error] URL could not be parsed"));
}

#[test]
fn test_binary_invalid_config_exits_one() {
    let work = TempDir::new().unwrap();
    let config_home = TempDir::new().unwrap();
    write_config(config_home.path(), "max_redirects = 500\n");

    retriever_cmd(work.path(), config_home.path())
        .args(["-u", "http://127.0.0.1:9/never-fetched"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config.toml"))
        .stderr(predicate::str::contains("max_redirects"));
}

#[tokio::test]
async fn test_binary_downloads_index_html() {
    let server = require_mock_server!();
    mount_body(&server, "/", b"<html>home</html>".to_vec()).await;
    let work = TempDir::new().unwrap();
    let config_home = TempDir::new().unwrap();

    retriever_cmd(work.path(), config_home.path())
        .args(["-u", &server.uri()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved index.html (17 bytes)"));

    assert_eq!(
        std::fs::read(work.path().join("index.html")).unwrap(),
        b"<html>home</html>"
    );
}

#[tokio::test]
async fn test_binary_extracts_redirected_release() {
    let server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/owner/ExampleProject/archive/v0.1.tar.gz"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/codeload/v0.1"))
        .mount(&server)
        .await;
    mount_body(&server, "/codeload/v0.1", project_tarball()).await;
    let work = TempDir::new().unwrap();
    let config_home = TempDir::new().unwrap();

    retriever_cmd(work.path(), config_home.path())
        .args([
            "-u",
            &format!("{}/owner/ExampleProject/archive/v0.1.tar.gz", server.uri()),
            "--extract",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved v0.1.tar.gz"))
        .stdout(predicate::str::contains("after 1 redirect"))
        .stdout(predicate::str::contains("Extracted ExampleProject-0.1"));

    assert!(work.path().join("ExampleProject-0.1/README.md").exists());
    assert!(!work.path().join("v0.1.tar.gz").exists());
}

#[tokio::test]
async fn test_binary_partial_exit_when_extraction_fails() {
    let server = require_mock_server!();
    mount_body(&server, "/page.html", b"<html></html>".to_vec()).await;
    let work = TempDir::new().unwrap();
    let config_home = TempDir::new().unwrap();

    retriever_cmd(work.path(), config_home.path())
        .args(["-u", &format!("{}/page.html", server.uri()), "--UZ"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Saved page.html"))
        .stderr(predicate::str::contains(
            "[Error] Downloaded file is not a supported archive",
        ));

    assert!(work.path().join("page.html").exists());
}

#[tokio::test]
async fn test_binary_http_404_exits_one() {
    let server = require_mock_server!();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let work = TempDir::new().unwrap();
    let config_home = TempDir::new().unwrap();

    retriever_cmd(work.path(), config_home.path())
        .args(["-u", &format!("{}/missing.tar.gz", server.uri())])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[Error] Server refused the download"))
        .stderr(predicate::str::contains("404"));

    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_binary_config_redirect_bound_applies_and_cli_overrides_it() {
    let server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&server)
        .await;
    mount_body(&server, "/new", b"moved".to_vec()).await;
    let work = TempDir::new().unwrap();
    let config_home = TempDir::new().unwrap();
    write_config(config_home.path(), "max_redirects = 0\n");
    let url = format!("{}/old", server.uri());

    retriever_cmd(work.path(), config_home.path())
        .args(["-u", &url])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Redirects did not reach a final resource"));

    retriever_cmd(work.path(), config_home.path())
        .args(["-u", &url, "--max-redirects", "1"])
        .assert()
        .success();
    assert_eq!(std::fs::read(work.path().join("old")).unwrap(), b"moved");
}

#[tokio::test]
async fn test_binary_quiet_suppresses_status_lines() {
    let server = require_mock_server!();
    mount_body(&server, "/file.txt", b"data".to_vec()).await;
    let work = TempDir::new().unwrap();
    let config_home = TempDir::new().unwrap();

    retriever_cmd(work.path(), config_home.path())
        .args(["-q", "-u", &format!("{}/file.txt", server.uri())])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(work.path().join("file.txt").exists());
}
