use std::process::{Command, Output};

use httpmock::prelude::*;
use serde_json::{Value, json};

const ENV_VARS: &[&str] = &[
    "RUST_LOG",
    "GTASKQUEUE_PROJECT",
    "GTASKQUEUE_LOCATION",
    "GTASKQUEUE_QUEUE",
    "GTASKQUEUE_API_HOST",
    "GTASKQUEUE_SERVICE_VERSION",
    "GTASKQUEUE_SERVICE_ACCOUNT_FILE",
    "GTASKQUEUE_ACCESS_TOKEN",
    "GTASKQUEUE_USE_DEVELOPER_KEY",
    "GTASKQUEUE_DEVELOPER_KEY_FILE",
    "GTASKQUEUE_DUMP_REQUEST",
    "GTASKQUEUE_HTTP_TIMEOUT_SECS",
    "GTASKQUEUE_LOG",
    "GTASKQUEUE_LOG_FORMAT",
];

fn gtaskqueue(args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_gtaskqueue"));
    for var in ENV_VARS {
        command.env_remove(var);
    }
    command.args(args).output().expect("spawn gtaskqueue")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn lease_without_lease_secs_is_a_usage_error() {
    let output = gtaskqueue(&["leasetask", "--access-token", "tok"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("lease_secs must be specified"));
    assert!(output.stdout.is_empty());
}

#[test]
fn zero_lease_secs_is_a_usage_error() {
    let output = gtaskqueue(&["leasetask", "--lease-secs", "0", "--access-token", "tok"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn blank_project_is_a_usage_error() {
    let output = gtaskqueue(&["listtasks", "--project-name", "", "--access-token", "tok"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--project-name"));
}

#[test]
fn missing_task_name_is_rejected_by_the_parser() {
    let output = gtaskqueue(&["gettask"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--task-name"));
}

#[test]
fn missing_service_account_file_is_a_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("service_account.json");
    let output = gtaskqueue(&[
        "listtasks",
        "--service-account-file",
        missing.to_str().expect("utf-8 path"),
    ]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("service_account.json"));
}

#[test]
fn listtasks_prints_sorted_json() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v2beta2/projects/acme/locations/us-central1/queues/pull/tasks")
            .query_param("responseView", "BASIC")
            .query_param("pageSize", "2")
            .header("authorization", "Bearer tok");
        then.status(200).json_body(json!({
            "tasks": [{
                "view": "BASIC",
                "name": "projects/acme/locations/us-central1/queues/pull/tasks/t1",
                "createTime": "2024-01-01T00:00:00Z"
            }],
            "nextPageToken": "next"
        }));
    });

    let output = gtaskqueue(&[
        "listtasks",
        "--api-host",
        &server.base_url(),
        "--access-token",
        "tok",
        "--project-name",
        "acme",
        "--taskqueue-name",
        "pull",
        "--page-size",
        "2",
        "--response-view",
        "basic",
    ]);

    mock.assert();
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    let parsed: Value = serde_json::from_str(&stdout).expect("stdout is JSON");
    assert_eq!(parsed["nextPageToken"], "next");

    let create = stdout.find("\"createTime\"").expect("createTime key");
    let name = stdout.find("\"name\"").expect("name key");
    let view = stdout.find("\"view\"").expect("view key");
    assert!(create < name && name < view, "keys are not sorted: {stdout}");
    assert!(stdout.contains("\n  \"nextPageToken\""));
}

#[test]
fn leasetask_elides_large_payloads() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v2beta2/projects/default/locations/us-central1/queues/myqueue/tasks:lease")
            .json_body(json!({
                "maxTasks": 2,
                "leaseDuration": "30s",
                "responseView": "FULL"
            }));
        then.status(200).json_body(json!({
            "tasks": [{
                "name": "projects/default/locations/us-central1/queues/myqueue/tasks/t1",
                "pullMessage": { "payload": "0123456789" }
            }]
        }));
    });

    let output = gtaskqueue(&[
        "leasetask",
        "--api-host",
        &server.base_url(),
        "--access-token",
        "tok",
        "--lease-secs",
        "30",
        "--num-tasks",
        "2",
        "--payload-size-to-display",
        "4",
    ]);

    mock.assert();
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let parsed: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(
        parsed["tasks"][0]["pullMessage"]["payload"],
        "0123(6 more bytes)"
    );
}

#[test]
fn api_errors_exit_with_failure_code() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/v2beta2/projects/default/locations/us-central1/queues/myqueue/tasks/gone");
        then.status(404).json_body(json!({
            "error": { "code": 404, "message": "Task does not exist.", "status": "NOT_FOUND" }
        }));
    });

    let output = gtaskqueue(&[
        "gettask",
        "--api-host",
        &server.base_url(),
        "--access-token",
        "tok",
        "--task-name",
        "gone",
    ]);

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("Task does not exist."));
    assert!(output.stdout.is_empty());
}
