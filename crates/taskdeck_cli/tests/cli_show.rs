use mockito::Matcher;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("taskdeck-{nanos}-{file_name}"))
}

fn run_taskdeck(server_url: &str, args: &[&str]) -> Output {
    let exe = env!("CARGO_BIN_EXE_taskdeck");
    Command::new(exe)
        .args(args)
        .env("TASKDECK_API_URL", server_url)
        .env("TASKDECK_CACHE_PATH", temp_path("show-cache.json"))
        .env("TASKDECK_CONFIG_PATH", temp_path("no-config.json"))
        .output()
        .expect("failed to run taskdeck")
}

fn record_body() -> &'static str {
    r#"{
        "no": 7, "task": "Publish recap", "platform": "Instagram", "format": "Video",
        "assignedTo": "Social Media", "dueDate": "2026-08-20", "dateLeft": 3,
        "inProgress": "In Progress", "reference": "https://example.com/brief",
        "result": "", "notes": ""
    }"#
}

#[test]
fn show_prints_the_full_record() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("action".into(), "getTask".into()),
            Matcher::UrlEncoded("id".into(), "7".into()),
        ]))
        .with_body(record_body())
        .expect(1)
        .create();

    let output = run_taskdeck(&server.url(), &["show", "7"]);

    mock.assert();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Task #7"));
    assert!(stdout.contains("Publish recap"));
    assert!(stdout.contains("Social Media"));
    assert!(stdout.contains("3d left"));
    assert!(stdout.contains("https://example.com/brief"));
    // empty fields render as a dash
    assert!(stdout.contains("Result:      -"));
}

#[test]
fn show_json_emits_the_record_with_its_status() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/")
        .match_query(Matcher::UrlEncoded("action".into(), "getTask".into()))
        .with_body(record_body())
        .create();

    let output = run_taskdeck(&server.url(), &["--json", "show", "7"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    assert_eq!(parsed["no"], 7);
    assert_eq!(parsed["assignedTo"], "Social Media");
    assert_eq!(parsed["status"], "3d left");
}

#[test]
fn show_fails_when_the_record_is_missing() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/")
        .match_query(Matcher::UrlEncoded("action".into(), "getTask".into()))
        .with_body(r#"{"error": "Task not found"}"#)
        .create();

    let output = run_taskdeck(&server.url(), &["show", "99"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Task not found"));
}
