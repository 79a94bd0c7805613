//! Rationale-based quality control.
//!
//! Pure functions only: no I/O, no configuration, no shared state. Safe to
//! call concurrently for different items.

pub mod aggregator;
pub mod filter;
pub mod similarity;

pub use aggregator::{aggregate, aggregate_metric, aggregate_sets, majority_vote};
pub use filter::{filter_by_threshold, select_threshold, FilteredJudgments};
pub use similarity::similarity;
