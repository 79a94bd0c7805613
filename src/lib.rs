//! rationale-qc
//!
//! Aggregates noisy crowd-worker judgments on question-answering outputs
//! into one faithfulness label and one relevancy label per question.
//! A judgment only counts when its free-text rationale is corroborated by
//! another worker's: per question, the rationales at the highest pairwise
//! similarity survive, and the surviving labels are majority-voted.
//!
//! The [`quality`] module is the pure aggregation core. The remaining
//! modules read crowd exports, join reference labels and write reports
//! around it.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod quality;
pub mod report;

pub use error::{CatalogError, IngestError, ValidationError};
pub use models::{AggregationResult, ItemAggregate, JudgmentInput, Metric, WorkerJudgment};
pub use quality::{
    aggregate, aggregate_sets, filter_by_threshold, majority_vote, select_threshold, similarity,
};
