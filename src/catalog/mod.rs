//! Question catalog and reference labels.
//!
//! The catalog is the list of questions served to workers (id, query,
//! response, contexts). The reference dataset holds the measured labels
//! for each query/response pair. An item's reference is found by looking
//! up its question, then the single dataset entry with the same query and
//! response.

use crate::error::CatalogError;
use crate::models::ReferenceLabels;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// A question as served by the collection service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub query: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context2: Option<String>,
}

/// A reference dataset entry with measured labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub query: String,
    pub response: String,
    /// Measured faithfulness; a number, numeric string or boolean.
    pub faithfulness: Value,
    /// Measured relevancy; a number, numeric string or boolean.
    pub relevancy: Value,
}

impl ReferenceEntry {
    pub fn labels(&self) -> Result<ReferenceLabels, CatalogError> {
        Ok(ReferenceLabels {
            faithfulness: label_value(&self.faithfulness)?,
            relevancy: label_value(&self.relevancy)?,
        })
    }
}

fn label_value(value: &Value) -> Result<f64, CatalogError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| CatalogError::InvalidLabel(value.to_string())),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| CatalogError::InvalidLabel(s.clone())),
        other => Err(CatalogError::InvalidLabel(other.to_string())),
    }
}

/// Where to read the question list from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionSource {
    Url(String),
    File(PathBuf),
}

impl QuestionSource {
    /// `http://` and `https://` values are URLs; anything else is a path.
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            QuestionSource::Url(value.to_string())
        } else {
            QuestionSource::File(PathBuf::from(value))
        }
    }
}

/// Load the question list.
pub async fn load_questions(
    source: &QuestionSource,
    timeout: Duration,
    show_progress: bool,
) -> Result<Vec<Question>, CatalogError> {
    match source {
        QuestionSource::File(path) => read_json(path).await,
        QuestionSource::Url(url) => fetch_questions(url, timeout, show_progress).await,
    }
}

/// Load the reference dataset.
pub async fn load_dataset(path: &Path) -> Result<Vec<ReferenceEntry>, CatalogError> {
    read_json(path).await
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
        origin: path.display().to_string(),
        source,
    })
}

async fn fetch_questions(
    url: &str,
    timeout: Duration,
    show_progress: bool,
) -> Result<Vec<Question>, CatalogError> {
    info!("Fetching question catalog from {}", url);

    let spinner = show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Fetching questions from {url}"));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let result = request_questions(url, timeout).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    result
}

async fn request_questions(url: &str, timeout: Duration) -> Result<Vec<Question>, CatalogError> {
    let request_error = |message: String| CatalogError::Request {
        url: url.to_string(),
        message,
    };

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| request_error(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            request_error(format!("timed out after {}s", timeout.as_secs()))
        } else if e.is_connect() {
            request_error("connection failed".to_string())
        } else {
            request_error(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(CatalogError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| request_error(e.to_string()))?;
    serde_json::from_str(&body).map_err(|source| CatalogError::Parse {
        origin: url.to_string(),
        source,
    })
}

/// Questions indexed by id, joined with the reference dataset.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    questions: HashMap<String, Question>,
    dataset: Vec<ReferenceEntry>,
}

impl Catalog {
    pub fn new(questions: Vec<Question>, dataset: Vec<ReferenceEntry>) -> Self {
        debug!(
            "Catalog with {} questions and {} reference entries",
            questions.len(),
            dataset.len()
        );
        Self {
            questions: questions.into_iter().map(|q| (q.id.clone(), q)).collect(),
            dataset,
        }
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.get(id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Measured labels for a question.
    ///
    /// Fails when the question is unknown or when its query/response pair
    /// does not match exactly one dataset entry.
    pub fn reference_for(&self, question_id: &str) -> Result<ReferenceLabels, CatalogError> {
        let question = self
            .question(question_id)
            .ok_or_else(|| CatalogError::UnknownQuestion(question_id.to_string()))?;

        let matches: Vec<&ReferenceEntry> = self
            .dataset
            .iter()
            .filter(|e| e.query == question.query && e.response == question.response)
            .collect();

        match matches.as_slice() {
            [entry] => entry.labels(),
            _ => Err(CatalogError::AmbiguousReference {
                question_id: question_id.to_string(),
                matches: matches.len(),
            }),
        }
    }
}
