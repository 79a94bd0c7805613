//! Error types.
//!
//! The aggregation core is total over validated input; everything that can
//! go wrong happens at the boundary where raw records become judgments, or
//! in the collaborators that read exports and reference data.

use std::path::PathBuf;
use thiserror::Error;

/// Rejection of a malformed judgment before it reaches the aggregator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Score is not one of the two label values.
    #[error("score must be 0.0 or 1.0, got {0}")]
    ScoreOutOfDomain(f64),

    /// A response record carried no question id.
    #[error("response {record} has an empty question_id")]
    MissingQuestionId { record: usize },

    /// Faithfulness and relevancy sets of one item disagree on worker count.
    #[error("metric sets differ in size: {faithfulness} faithfulness vs {relevancy} relevancy judgments")]
    CardinalityMismatch {
        faithfulness: usize,
        relevancy: usize,
    },
}

/// Errors from reading crowd-worker response exports.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Directory input contained no `.json` exports.
    #[error("no response files found under {0}")]
    NoResponses(PathBuf),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Errors from loading the question catalog or the reference dataset.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// Transport failure or timeout while fetching the catalog.
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("catalog endpoint {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("question {0} is not in the catalog")]
    UnknownQuestion(String),

    /// Zero or several dataset entries share the question's query and response.
    #[error("expected exactly one reference entry for question {question_id}, found {matches}")]
    AmbiguousReference { question_id: String, matches: usize },

    #[error("reference label {0:?} is not numeric")]
    InvalidLabel(String),
}
