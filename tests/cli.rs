use assert_cmd::assert::OutputAssertExt;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn planwell() -> Command {
    let mut cmd = Command::cargo_bin("planwell").unwrap();
    cmd.env_remove("GEMINI_API_KEY")
        .env_remove("PLANWELL_PROVIDER")
        .env_remove("PLANWELL_COMPLETION_URL")
        .env_remove("PLANWELL_SEARCH_URL");
    cmd
}

#[test]
fn test_cli_help() {
    planwell()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: planwell [OPTIONS] <COMMAND>"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("--provider <PROVIDER>"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn test_cli_serve_help() {
    planwell()
        .arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: planwell serve"))
        .stdout(predicate::str::contains("--port <PORT>"))
        .stdout(predicate::str::contains("--templates <TEMPLATES>"));
}

#[test]
fn test_cli_plan_requires_a_goal() {
    planwell()
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<GOALS>..."));
}

#[test]
fn test_cli_no_command() {
    planwell()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: planwell [OPTIONS] <COMMAND>"));
}

#[test]
fn test_missing_credential_blocks_planning() {
    // Run from an empty dir so no .env is picked up
    let dir = TempDir::new().unwrap();
    planwell()
        .current_dir(dir.path())
        .args(["plan", "learn Rust"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_plan_prints_plans_and_progress_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gemma3:12b",
            "response": "🎯 GOAL ANALYSIS: get moving",
            "done": true
        })))
        .expect(2)
        .mount(&server)
        .await;

    let uri = server.uri();
    let dir = TempDir::new().unwrap();
    let dir_path = dir.path().to_path_buf();
    let output = tokio::task::spawn_blocking(move || {
        planwell()
            .current_dir(dir_path)
            .args(["--provider", "ollama", "--completion-url", uri.as_str(), "--research", "false"])
            .args(["plan", "Plan my fitness journey", "Prepare for my final exams"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("📚 Student's Goal: Plan my fitness journey"))
        .stdout(predicate::str::contains("🎯 GOAL ANALYSIS: get moving"))
        .stdout(predicate::str::contains("Total goals we've worked on: 2"))
        .stdout(predicate::str::contains("Most recent goal: Prepare for my final exams"));
}
