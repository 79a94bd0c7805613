use std::path::Path;
use std::process::Command;

use rationale_qc::models::Report;
use serde_json::json;
use tempfile::tempdir;

fn write_json(path: &Path, value: serde_json::Value) {
    std::fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn write_fixtures(dir: &Path) {
    write_json(
        &dir.join("responses.json"),
        json!([
            {"question_id": "q1", "worker_id": "w1", "is_faithful": true, "is_relevant": true,
             "faithfulness": "mentions toxins and balance", "relevance": "on topic"},
            {"question_id": "q1", "worker_id": "w2", "is_faithful": true, "is_relevant": true,
             "faithfulness": "removes toxins, balances electrolytes", "relevance": "on topic"},
            {"question_id": "q1", "worker_id": "w3", "is_faithful": false, "is_relevant": false,
             "faithfulness": "unrelated comment", "relevance": "no idea"},
            {"question_id": "q2", "worker_id": "w1", "is_faithful": true, "is_relevant": true,
             "faithfulness": "cites the source", "relevance": "direct answer"},
            {"question_id": "q2", "worker_id": "w2", "is_faithful": true, "is_relevant": true,
             "faithfulness": "cites the source", "relevance": "direct answer"},
        ]),
    );
    write_json(
        &dir.join("questions.json"),
        json!([
            {"id": "q1", "query": "What do kidneys do?", "response": "Filter blood."},
            {"id": "q2", "query": "Capital of France?", "response": "Paris."},
        ]),
    );
    write_json(
        &dir.join("dataset.json"),
        json!([
            {"query": "What do kidneys do?", "response": "Filter blood.", "faithfulness": 1, "relevancy": 1},
            {"query": "Capital of France?", "response": "Paris.", "faithfulness": 0, "relevancy": 1},
        ]),
    );
}

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rationale-qc"));
    cmd.current_dir(dir)
        .env_remove("RATIONALE_QC_QUESTIONS")
        .env_remove("RATIONALE_QC_DATASET")
        .arg("--quiet");
    cmd
}

#[test]
fn writes_json_report() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());
    let out_path = dir.path().join("report.json");

    let status = cli(dir.path())
        .args(["--responses", "responses.json", "--format", "json"])
        .arg("--output")
        .arg(&out_path)
        .status()
        .unwrap();
    assert!(status.success());

    let raw = std::fs::read_to_string(&out_path).unwrap();
    let report: Report = serde_json::from_str(&raw).unwrap();
    assert_eq!(report.metadata.responses, 5);
    assert_eq!(report.items.len(), 2);
    assert_eq!(report.items[0].question_id, "q1");
    assert_eq!(report.items[0].faithfulness.retained_workers, vec!["w1", "w2"]);
    assert_eq!(report.summary.faithful, 2);
    assert_eq!(report.summary.compared, 0);
}

#[test]
fn writes_markdown_report_with_reference() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    let status = cli(dir.path())
        .args([
            "--responses",
            "responses.json",
            "--questions",
            "questions.json",
            "--dataset",
            "dataset.json",
            "--output",
            "report.md",
        ])
        .status()
        .unwrap();
    assert!(status.success());

    let markdown = std::fs::read_to_string(dir.path().join("report.md")).unwrap();
    assert!(markdown.contains("What do kidneys do?"));
    assert!(markdown.contains("mentions toxins and balance"));
}

#[test]
fn min_agreement_gate_exits_with_two() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    // q2 is labelled unfaithful in the dataset, so faithfulness agreement is 0.5.
    let status = cli(dir.path())
        .args([
            "--responses",
            "responses.json",
            "--questions",
            "questions.json",
            "--dataset",
            "dataset.json",
            "--output",
            "report.json",
            "--format",
            "json",
            "--min-agreement",
            "0.9",
        ])
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(2));

    let status = cli(dir.path())
        .args([
            "--responses",
            "responses.json",
            "--questions",
            "questions.json",
            "--dataset",
            "dataset.json",
            "--output",
            "report.json",
            "--format",
            "json",
            "--min-agreement",
            "0.5",
        ])
        .status()
        .unwrap();
    assert!(status.success());
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    let output = cli(dir.path())
        .args(["--responses", "responses.json", "--dry-run", "--output", "report.md"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("q1  3 workers"));
    assert!(!dir.path().join("report.md").exists());
}

#[test]
fn missing_responses_fails() {
    let dir = tempdir().unwrap();
    let status = cli(dir.path()).status().unwrap();
    assert_eq!(status.code(), Some(1));
}
