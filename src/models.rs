//! Data models for judgment aggregation.
//!
//! This module contains the judgment types consumed by the aggregation
//! core, the raw crowd-export record they are built from, and the report
//! structures the results are written into.

use crate::error::ValidationError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The two binary quality metrics judged per response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Does the response agree with its source context.
    Faithfulness,
    /// Is the response relevant to the query.
    Relevancy,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Faithfulness => write!(f, "Faithfulness"),
            Metric::Relevancy => write!(f, "Relevancy"),
        }
    }
}

/// One worker's label and rationale for one item and one metric.
///
/// Scores are restricted to `0.0` and `1.0`; construct through
/// [`JudgmentInput::new`] or [`JudgmentInput::from_label`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JudgmentInput {
    score: f64,
    rationale: String,
}

impl JudgmentInput {
    /// Validates `score` and builds a judgment.
    pub fn new(score: f64, rationale: impl Into<String>) -> Result<Self, ValidationError> {
        if score != 0.0 && score != 1.0 {
            return Err(ValidationError::ScoreOutOfDomain(score));
        }
        Ok(Self {
            score,
            rationale: rationale.into(),
        })
    }

    /// Builds a judgment from a boolean label.
    pub fn from_label(label: bool, rationale: impl Into<String>) -> Self {
        Self {
            score: if label { 1.0 } else { 0.0 },
            rationale: rationale.into(),
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }
}

/// Everything one worker submitted for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerJudgment {
    pub faithfulness: JudgmentInput,
    pub relevancy: JudgmentInput,
}

impl WorkerJudgment {
    /// Builds a worker judgment from raw scores, validating both.
    pub fn new(
        faithful_score: f64,
        faithful_rationale: impl Into<String>,
        relevant_score: f64,
        relevant_rationale: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            faithfulness: JudgmentInput::new(faithful_score, faithful_rationale)?,
            relevancy: JudgmentInput::new(relevant_score, relevant_rationale)?,
        })
    }

    /// Returns this worker's judgment for `metric`.
    pub fn metric(&self, metric: Metric) -> &JudgmentInput {
        match metric {
            Metric::Faithfulness => &self.faithfulness,
            Metric::Relevancy => &self.relevancy,
        }
    }
}

/// Outcome of aggregating one item set for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Majority label over the retained judgments.
    pub consensus: f64,
    /// Peak pairwise rationale similarity for the item.
    pub threshold: f64,
    /// Original positions of the retained judgments, ascending.
    pub retained: Vec<usize>,
    /// Rationales of the retained judgments, aligned with `retained`.
    pub retained_rationales: Vec<String>,
}

impl AggregationResult {
    /// True when no judgment was corroborated.
    pub fn is_discarded(&self) -> bool {
        self.retained.is_empty()
    }
}

/// Aggregated result for both metrics of one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAggregate {
    pub faithfulness: AggregationResult,
    pub relevancy: AggregationResult,
}

impl ItemAggregate {
    /// The `(faithfulness, relevancy)` consensus labels.
    pub fn consensus(&self) -> (f64, f64) {
        (self.faithfulness.consensus, self.relevancy.consensus)
    }
}

/// A single crowd-worker submission as exported by the collection service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResponse {
    /// Submission id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Item this submission judges.
    pub question_id: String,
    pub worker_id: String,
    /// Submission time. Values without an offset are read as UTC.
    #[serde(
        default,
        deserialize_with = "deserialize_submission_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<DateTime<Utc>>,
    pub is_faithful: bool,
    pub is_relevant: bool,
    /// Faithfulness rationale.
    pub faithfulness: String,
    /// Relevancy rationale.
    pub relevance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl WorkerResponse {
    /// Projects the submission onto the two metric judgments.
    pub fn to_judgment(&self) -> WorkerJudgment {
        WorkerJudgment {
            faithfulness: JudgmentInput::from_label(self.is_faithful, self.faithfulness.as_str()),
            relevancy: JudgmentInput::from_label(self.is_relevant, self.relevance.as_str()),
        }
    }
}

/// Parses an RFC 3339 timestamp, or an ISO 8601 one without offset as UTC.
pub fn parse_submission_time(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(time) => Ok(time.with_timezone(&Utc)),
        Err(_) => value.parse::<NaiveDateTime>().map(|naive| naive.and_utc()),
    }
}

fn deserialize_submission_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_submission_time(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

/// Measured labels for an item from the reference dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLabels {
    pub faithfulness: f64,
    pub relevancy: f64,
}

/// One metric's outcome as written to the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricOutcome {
    pub consensus: f64,
    pub threshold: f64,
    /// Workers whose judgment was retained.
    pub retained_workers: Vec<String>,
    pub retained_rationales: Vec<String>,
    /// Whether the consensus matches the reference label, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agrees_with_reference: Option<bool>,
}

impl MetricOutcome {
    /// Resolves retained positions to worker ids.
    pub fn from_result(result: &AggregationResult, worker_ids: &[String]) -> Self {
        Self {
            consensus: result.consensus,
            threshold: result.threshold,
            retained_workers: result
                .retained
                .iter()
                .filter_map(|&idx| worker_ids.get(idx).cloned())
                .collect(),
            retained_rationales: result.retained_rationales.clone(),
            agrees_with_reference: None,
        }
    }

    pub fn is_discarded(&self) -> bool {
        self.retained_rationales.is_empty()
    }
}

/// Labels agree when their integer parts match.
pub fn labels_agree(consensus: f64, measured: f64) -> bool {
    consensus.trunc() == measured.trunc()
}

/// Per-item section of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemReport {
    pub question_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Number of workers who judged the item.
    pub workers: usize,
    pub faithfulness: MetricOutcome,
    pub relevancy: MetricOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceLabels>,
}

impl ItemReport {
    /// Creates an item report from an aggregate and the item's worker ids,
    /// in submission order.
    pub fn new(question_id: String, worker_ids: &[String], aggregate: &ItemAggregate) -> Self {
        Self {
            question_id,
            query: None,
            response: None,
            workers: worker_ids.len(),
            faithfulness: MetricOutcome::from_result(&aggregate.faithfulness, worker_ids),
            relevancy: MetricOutcome::from_result(&aggregate.relevancy, worker_ids),
            reference: None,
        }
    }

    /// Attaches reference labels and records agreement for both metrics.
    pub fn apply_reference(&mut self, reference: ReferenceLabels) {
        self.faithfulness.agrees_with_reference = Some(labels_agree(
            self.faithfulness.consensus,
            reference.faithfulness,
        ));
        self.relevancy.agrees_with_reference =
            Some(labels_agree(self.relevancy.consensus, reference.relevancy));
        self.reference = Some(reference);
    }

    pub fn outcome(&self, metric: Metric) -> &MetricOutcome {
        match metric {
            Metric::Faithfulness => &self.faithfulness,
            Metric::Relevancy => &self.relevancy,
        }
    }
}

/// Summary statistics over all items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of items.
    pub items: usize,
    /// Items whose faithfulness consensus is 1.
    pub faithful: usize,
    /// Items whose relevancy consensus is 1.
    pub relevant: usize,
    /// Items where no faithfulness judgment was corroborated.
    pub faithfulness_discarded: usize,
    /// Items where no relevancy judgment was corroborated.
    pub relevancy_discarded: usize,
    /// Items that had reference labels.
    pub compared: usize,
    /// Share of compared items whose faithfulness consensus matched.
    pub faithfulness_agreement: f64,
    /// Share of compared items whose relevancy consensus matched.
    pub relevancy_agreement: f64,
}

impl ReportSummary {
    /// Creates a summary from item reports.
    pub fn from_items(items: &[ItemReport]) -> Self {
        let mut summary = Self {
            items: items.len(),
            ..Self::default()
        };
        let mut faithfulness_hits = 0usize;
        let mut relevancy_hits = 0usize;

        for item in items {
            if item.faithfulness.consensus == 1.0 {
                summary.faithful += 1;
            }
            if item.relevancy.consensus == 1.0 {
                summary.relevant += 1;
            }
            if item.faithfulness.is_discarded() {
                summary.faithfulness_discarded += 1;
            }
            if item.relevancy.is_discarded() {
                summary.relevancy_discarded += 1;
            }
            if item.reference.is_some() {
                summary.compared += 1;
                if item.faithfulness.agrees_with_reference == Some(true) {
                    faithfulness_hits += 1;
                }
                if item.relevancy.agrees_with_reference == Some(true) {
                    relevancy_hits += 1;
                }
            }
        }

        if summary.compared > 0 {
            summary.faithfulness_agreement = faithfulness_hits as f64 / summary.compared as f64;
            summary.relevancy_agreement = relevancy_hits as f64 / summary.compared as f64;
        }

        summary
    }

    /// Lowest per-metric agreement, or `None` when nothing was compared.
    pub fn lowest_agreement(&self) -> Option<f64> {
        (self.compared > 0).then(|| self.faithfulness_agreement.min(self.relevancy_agreement))
    }
}

/// Metadata about the aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the responses were read from.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub items: usize,
    pub responses: usize,
    /// Number of distinct workers.
    pub workers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_submission: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_submission: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
}

/// The complete aggregation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub items: Vec<ItemReport>,
    pub summary: ReportSummary,
}
