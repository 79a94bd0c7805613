//! Consensus labels from filtered judgments.

use super::filter::filter_by_threshold;
use crate::error::ValidationError;
use crate::models::{AggregationResult, ItemAggregate, JudgmentInput, Metric, WorkerJudgment};
use tracing::{debug, trace};

/// `1.0` when strictly more than half of `scores` are `1.0`, else `0.0`.
///
/// Ties and the empty sequence resolve to `0.0`.
pub fn majority_vote(scores: &[f64]) -> f64 {
    let positives = scores.iter().filter(|&&s| s == 1.0).count();
    if positives * 2 > scores.len() {
        1.0
    } else {
        0.0
    }
}

/// Filters one metric's judgments and votes over the survivors.
pub fn aggregate_metric(inputs: &[JudgmentInput]) -> AggregationResult {
    let filtered = filter_by_threshold(inputs);
    let consensus = majority_vote(&filtered.scores);
    trace!(rationales = ?filtered.rationales, "retained rationales");

    AggregationResult {
        consensus,
        threshold: filtered.threshold,
        retained: filtered.indices,
        retained_rationales: filtered.rationales,
    }
}

/// Aggregates both metrics of one item.
///
/// Each worker contributes one judgment per metric; the two metric sets are
/// filtered and voted on independently.
pub fn aggregate(judgments: &[WorkerJudgment]) -> ItemAggregate {
    let project = |metric: Metric| -> Vec<JudgmentInput> {
        judgments.iter().map(|j| j.metric(metric).clone()).collect()
    };
    let faithfulness = project(Metric::Faithfulness);
    let relevancy = project(Metric::Relevancy);

    ItemAggregate {
        faithfulness: aggregate_logged(Metric::Faithfulness, &faithfulness),
        relevancy: aggregate_logged(Metric::Relevancy, &relevancy),
    }
}

/// Aggregates pre-split metric sets, which must come from the same workers.
pub fn aggregate_sets(
    faithfulness: &[JudgmentInput],
    relevancy: &[JudgmentInput],
) -> Result<ItemAggregate, ValidationError> {
    if faithfulness.len() != relevancy.len() {
        return Err(ValidationError::CardinalityMismatch {
            faithfulness: faithfulness.len(),
            relevancy: relevancy.len(),
        });
    }
    Ok(ItemAggregate {
        faithfulness: aggregate_logged(Metric::Faithfulness, faithfulness),
        relevancy: aggregate_logged(Metric::Relevancy, relevancy),
    })
}

fn aggregate_logged(metric: Metric, inputs: &[JudgmentInput]) -> AggregationResult {
    let result = aggregate_metric(inputs);
    debug!(
        %metric,
        workers = inputs.len(),
        threshold = result.threshold,
        retained = result.retained.len(),
        consensus = result.consensus,
        "aggregated metric"
    );
    result
}
