use assert_cmd::Command;
use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT_PATH: &str = "/api/v1/organizations/org-1/projects/project-1";

/// Command running in an empty directory with no ambient credentials
fn vulnera_scan(workdir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vulnera-scan"));
    cmd.current_dir(workdir.path())
        .env_remove("VULNERA_SCAN_API_TOKEN")
        .env_remove("VULNERA_CI")
        .env_remove("ENV")
        .env("RUST_LOG", "off");
    for proxy in ["HTTP_PROXY", "HTTPS_PROXY", "ALL_PROXY", "http_proxy", "https_proxy", "all_proxy"] {
        cmd.env_remove(proxy);
    }
    cmd
}

fn scan_body(status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "scan-1",
        "projectId": "project-1",
        "organizationId": "org-1",
        "status": status
    })
}

#[test]
fn test_cli_help() {
    let workdir = TempDir::new().unwrap();
    vulnera_scan(&workdir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Vulnera Scan uploads a build artifact to the Vulnera analysis service",
        ));
}

#[test]
fn test_cli_version() {
    let workdir = TempDir::new().unwrap();
    vulnera_scan(&workdir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vulnera-scan 0.1.0"));
}

#[test]
fn test_scan_help() {
    let workdir = TempDir::new().unwrap();
    vulnera_scan(&workdir)
        .args(["scan", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--sarif-output"))
        .stdout(predicate::str::contains("--fail-on-findings"));
}

#[test]
fn test_scan_missing_artifact_is_config_error() {
    let workdir = TempDir::new().unwrap();
    vulnera_scan(&workdir)
        .args(["scan", "does-not-exist.jar"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Artifact does not exist"));
}

#[test]
fn test_ci_mode_without_token_is_auth_error() {
    let workdir = TempDir::new().unwrap();
    std::fs::write(workdir.path().join("app.jar"), b"jar").unwrap();

    vulnera_scan(&workdir)
        .args([
            "--ci",
            "--organization-id",
            "org-1",
            "--project-id",
            "project-1",
            "scan",
            "app.jar",
        ])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("VULNERA_SCAN_API_TOKEN"));
}

#[test]
fn test_status_without_organization_is_config_error() {
    let workdir = TempDir::new().unwrap();
    vulnera_scan(&workdir)
        .args(["status", "scan-1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--organization-id"));
}

#[test]
fn test_invalid_config_file_is_config_error() {
    let workdir = TempDir::new().unwrap();
    let config = workdir.path().join("scan.toml");
    std::fs::write(&config, "[polling]\ntimeout_seconds = 0\n").unwrap();

    vulnera_scan(&workdir)
        .arg("--config")
        .arg(&config)
        .args(["status", "scan-1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("timeout_seconds"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scan_against_service_writes_outputs() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{}/code-artifacts", PROJECT_PATH)))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": "artifact-1" })),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/scans", PROJECT_PATH)))
        .respond_with(ResponseTemplate::new(201).set_body_json(scan_body("WAITING")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/scans/scan-1", PROJECT_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(scan_body("COMPLETED")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/scans/scan-1/summary", PROJECT_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "totalFindings": 2,
            "high": 2
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/scans/scan-1/sarif", PROJECT_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"runs\":[]}"))
        .mount(&mock_server)
        .await;

    let workdir = TempDir::new().unwrap();
    std::fs::write(workdir.path().join("app.jar"), b"jar").unwrap();

    let mut cmd = vulnera_scan(&workdir);
    cmd.env("VULNERA_SCAN__SERVICE__BASE_URL", mock_server.uri())
        .env("VULNERA_SCAN_API_TOKEN", "test-token")
        .args([
            "--format",
            "json",
            "--organization-id",
            "org-1",
            "--project-id",
            "project-1",
            "scan",
            "app.jar",
            "--poll-interval",
            "0",
            "--sarif-output",
            "report.sarif",
            "--results-output",
            "results.json",
            "--fail-on-findings",
        ]);

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();

    output
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"totalFindings\": 2"));

    let sarif = std::fs::read_to_string(workdir.path().join("report.sarif")).unwrap();
    assert_eq!(sarif, "{\"runs\":[]}");

    let results: serde_json::Value =
        serde_json::from_slice(&std::fs::read(workdir.path().join("results.json")).unwrap())
            .unwrap();
    assert_eq!(results["high"], 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_prints_scan_state() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/scans/scan-1", PROJECT_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(scan_body("RUNNING")))
        .mount(&mock_server)
        .await;

    let workdir = TempDir::new().unwrap();
    let mut cmd = vulnera_scan(&workdir);
    cmd.env("VULNERA_SCAN__SERVICE__BASE_URL", mock_server.uri())
        .args([
            "--organization-id",
            "org-1",
            "--project-id",
            "project-1",
            "status",
            "scan-1",
        ]);

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("RUNNING"));
}
