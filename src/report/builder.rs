//! Assembling reports from grouped responses.

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::ingest::{IngestStats, QuestionGroup};
use crate::models::{ItemReport, Report, ReportMetadata, ReportSummary};
use crate::quality::aggregate;
use chrono::Utc;
use std::time::Duration;

/// Aggregate one question and, when a catalog is given, attach its text
/// and reference labels.
pub fn build_item(
    group: &QuestionGroup,
    catalog: Option<&Catalog>,
) -> Result<ItemReport, CatalogError> {
    let aggregate = aggregate(&group.judgments());
    let mut item = ItemReport::new(group.question_id.clone(), &group.worker_ids(), &aggregate);

    if let Some(catalog) = catalog {
        if let Some(question) = catalog.question(&group.question_id) {
            item.query = Some(question.query.clone());
            item.response = Some(question.response.clone());
        }
        item.apply_reference(catalog.reference_for(&group.question_id)?);
    }

    Ok(item)
}

pub fn build_report(
    source: &str,
    stats: &IngestStats,
    items: Vec<ItemReport>,
    duration: Duration,
) -> Report {
    let summary = ReportSummary::from_items(&items);
    Report {
        metadata: ReportMetadata {
            source: source.to_string(),
            generated_at: Utc::now(),
            items: items.len(),
            responses: stats.responses,
            workers: stats.workers,
            first_submission: stats.first_submission,
            last_submission: stats.last_submission,
            duration_seconds: duration.as_secs_f64(),
        },
        items,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Question, ReferenceEntry};
    use crate::models::WorkerResponse;
    use serde_json::json;

    fn response(worker: &str, faithful: bool, rationale: &str) -> WorkerResponse {
        WorkerResponse {
            id: None,
            question_id: "q1".to_string(),
            worker_id: worker.to_string(),
            time: None,
            is_faithful: faithful,
            is_relevant: true,
            faithfulness: rationale.to_string(),
            relevance: "answers the question".to_string(),
            comments: None,
        }
    }

    fn group() -> QuestionGroup {
        QuestionGroup {
            question_id: "q1".to_string(),
            responses: vec![
                response("w1", true, "mentions toxins and balance"),
                response("w2", true, "removes toxins, balances electrolytes"),
                response("w3", false, "unrelated comment"),
            ],
        }
    }

    #[test]
    fn test_build_item_without_catalog() {
        let item = build_item(&group(), None).unwrap();
        assert_eq!(item.workers, 3);
        assert_eq!(item.faithfulness.consensus, 1.0);
        assert_eq!(item.faithfulness.retained_workers, vec!["w1", "w2"]);
        assert_eq!(item.relevancy.consensus, 1.0);
        assert_eq!(item.relevancy.retained_workers.len(), 3);
        assert!(item.reference.is_none());
        assert!(item.query.is_none());
    }

    #[test]
    fn test_build_item_with_catalog() {
        let catalog = Catalog::new(
            vec![Question {
                id: "q1".to_string(),
                query: "What do kidneys do?".to_string(),
                response: "Filter blood.".to_string(),
                context1: None,
                context2: None,
            }],
            vec![ReferenceEntry {
                query: "What do kidneys do?".to_string(),
                response: "Filter blood.".to_string(),
                faithfulness: json!(1),
                relevancy: json!(0),
            }],
        );

        let item = build_item(&group(), Some(&catalog)).unwrap();
        assert_eq!(item.query.as_deref(), Some("What do kidneys do?"));
        assert_eq!(item.faithfulness.agrees_with_reference, Some(true));
        assert_eq!(item.relevancy.agrees_with_reference, Some(false));
    }

    #[test]
    fn test_build_item_unknown_question() {
        let catalog = Catalog::new(vec![], vec![]);
        assert!(build_item(&group(), Some(&catalog)).is_err());
    }

    #[test]
    fn test_build_report() {
        let g = group();
        let stats = IngestStats::from_responses(&g.responses);
        let items = vec![build_item(&g, None).unwrap()];
        let report = build_report("responses.json", &stats, items, Duration::from_millis(250));

        assert_eq!(report.metadata.items, 1);
        assert_eq!(report.metadata.responses, 3);
        assert_eq!(report.metadata.workers, 3);
        assert_eq!(report.metadata.duration_seconds, 0.25);
        assert_eq!(report.summary.faithful, 1);
        assert_eq!(report.summary.compared, 0);
    }
}
