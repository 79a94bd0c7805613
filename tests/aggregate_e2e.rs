use rationale_qc::catalog::Catalog;
use rationale_qc::cli::OutputFormat;
use rationale_qc::ingest::{self, IngestStats};
use rationale_qc::models::Report;
use rationale_qc::report::{build_item, build_report, write_report};
use rationale_qc::{aggregate, JudgmentInput, WorkerJudgment};
use serde_json::json;
use std::time::Duration;
use tempfile::tempdir;

fn record(
    question: &str,
    worker: &str,
    faithful: bool,
    f: &str,
    relevant: bool,
    r: &str,
) -> serde_json::Value {
    json!({
        "question_id": question,
        "worker_id": worker,
        "time": "2024-12-02T09:30:00+00:00",
        "is_faithful": faithful,
        "is_relevant": relevant,
        "faithfulness": f,
        "relevance": r,
    })
}

#[test]
fn kidney_example_end_to_end() {
    let workers = vec![
        WorkerJudgment::new(1.0, "mentions toxins and balance", 1.0, "answers the question").unwrap(),
        WorkerJudgment::new(1.0, "removes toxins, balances electrolytes", 1.0, "answers the question").unwrap(),
        WorkerJudgment::new(0.0, "unrelated comment", 0.0, "no").unwrap(),
    ];

    let item = aggregate(&workers);
    assert_eq!(item.consensus(), (1.0, 1.0));
    assert_eq!(
        item.faithfulness.retained_rationales,
        vec!["mentions toxins and balance", "removes toxins, balances electrolytes"]
    );
    assert_eq!(item.relevancy.retained, vec![0, 1]);
}

#[test]
fn invalid_scores_are_rejected_before_aggregation() {
    assert!(JudgmentInput::new(0.7, "maybe").is_err());
    assert!(WorkerJudgment::new(1.0, "ok", 3.0, "ok").is_err());
}

#[test]
fn exports_to_report() {
    let dir = tempdir().unwrap();
    let exports = dir.path().join("exports");
    std::fs::create_dir(&exports).unwrap();

    std::fs::write(
        exports.join("batch-1.json"),
        serde_json::to_string(&json!([
            record("q1", "w1", true, "mentions toxins and balance", true, "on topic"),
            record("q1", "w2", true, "removes toxins, balances electrolytes", true, "on topic"),
            record("q2", "w1", true, "same rationale", false, "off topic"),
        ]))
        .unwrap(),
    )
    .unwrap();
    std::fs::write(
        exports.join("batch-2.json"),
        serde_json::to_string(&json!([
            record("q1", "w3", false, "unrelated comment", false, "no idea"),
            record("q2", "w2", false, "same rationale", false, "off topic"),
            record("q3", "w3", true, "lonely worker", true, "lonely worker"),
        ]))
        .unwrap(),
    )
    .unwrap();

    let responses = ingest::load_responses(&exports).unwrap();
    let stats = IngestStats::from_responses(&responses);
    assert_eq!(stats.responses, 6);
    assert_eq!(stats.workers, 3);

    let groups = ingest::group_by_question(responses).unwrap();
    let ids: Vec<_> = groups.iter().map(|g| g.question_id.as_str()).collect();
    assert_eq!(ids, vec!["q1", "q2", "q3"]);

    let questions = serde_json::from_value(json!([
        {"id": "q1", "query": "What do kidneys do?", "response": "Filter blood."},
        {"id": "q2", "query": "Capital of France?", "response": "Paris."},
        {"id": "q3", "query": "Boiling point?", "response": "100C."},
    ]))
    .unwrap();
    let dataset = serde_json::from_value(json!([
        {"query": "What do kidneys do?", "response": "Filter blood.", "faithfulness": 1, "relevancy": 1},
        {"query": "Capital of France?", "response": "Paris.", "faithfulness": "1", "relevancy": "0"},
        {"query": "Boiling point?", "response": "100C.", "faithfulness": 1.0, "relevancy": 1.0},
    ]))
    .unwrap();
    let catalog = Catalog::new(questions, dataset);

    let items: Vec<_> = groups
        .iter()
        .map(|g| build_item(g, Some(&catalog)).unwrap())
        .collect();

    // q1: the toxin rationales corroborate each other, the third is dropped.
    assert_eq!(items[0].faithfulness.consensus, 1.0);
    assert_eq!(items[0].faithfulness.retained_workers, vec!["w1", "w2"]);
    // q2: identical rationales from two workers are both kept; 1 vs 0 ties to 0.
    assert_eq!(items[1].faithfulness.retained_workers, vec!["w1", "w2"]);
    assert_eq!(items[1].faithfulness.consensus, 0.0);
    assert_eq!(items[1].relevancy.consensus, 0.0);
    // q3: a single worker has nobody to corroborate them.
    assert!(items[2].faithfulness.is_discarded());
    assert_eq!(items[2].faithfulness.consensus, 0.0);

    let report = build_report("exports", &stats, items, Duration::from_millis(5));
    assert_eq!(report.summary.items, 3);
    assert_eq!(report.summary.compared, 3);
    assert_eq!(report.summary.faithfulness_discarded, 1);
    // Faithfulness matches only on q1; relevancy matches on q1 and q2.
    assert!((report.summary.faithfulness_agreement - 1.0 / 3.0).abs() < 1e-12);
    assert!((report.summary.relevancy_agreement - 2.0 / 3.0).abs() < 1e-12);

    let out = dir.path().join("report.json");
    write_report(&report, &out, OutputFormat::Json, true).unwrap();
    let parsed: Report = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed.items.len(), 3);
    assert_eq!(parsed.items[0].query.as_deref(), Some("What do kidneys do?"));
    assert!(parsed.metadata.first_submission.is_some());
}
