//! Loading and grouping crowd-worker response exports.
//!
//! An export is a JSON array of [`WorkerResponse`] records. Input may be a
//! single export file or a directory of them.

use crate::error::{IngestError, ValidationError};
use crate::models::{WorkerJudgment, WorkerResponse};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// All responses for one question, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionGroup {
    pub question_id: String,
    pub responses: Vec<WorkerResponse>,
}

impl QuestionGroup {
    /// Per-worker judgments, positionally aligned with `responses`.
    pub fn judgments(&self) -> Vec<WorkerJudgment> {
        self.responses.iter().map(WorkerResponse::to_judgment).collect()
    }

    /// Worker ids, positionally aligned with `responses`.
    pub fn worker_ids(&self) -> Vec<String> {
        self.responses.iter().map(|r| r.worker_id.clone()).collect()
    }

    pub fn worker_count(&self) -> usize {
        self.responses.len()
    }
}

/// Statistics over a loaded response set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestStats {
    pub responses: usize,
    pub workers: usize,
    pub first_submission: Option<DateTime<Utc>>,
    pub last_submission: Option<DateTime<Utc>>,
}

impl IngestStats {
    pub fn from_responses(responses: &[WorkerResponse]) -> Self {
        let workers: HashSet<&str> = responses.iter().map(|r| r.worker_id.as_str()).collect();
        let times = responses.iter().filter_map(|r| r.time);
        let first_submission = times.clone().min();
        let last_submission = times.max();

        Self {
            responses: responses.len(),
            workers: workers.len(),
            first_submission,
            last_submission,
        }
    }
}

/// Load responses from an export file or a directory of exports.
///
/// Directories are walked recursively; `.json` files are read in sorted
/// path order so the worker order within a question is reproducible.
pub fn load_responses(path: &Path) -> Result<Vec<WorkerResponse>, IngestError> {
    if !path.is_dir() {
        return read_export(path);
    }

    let files = export_files(path)?;
    if files.is_empty() {
        return Err(IngestError::NoResponses(path.to_path_buf()));
    }

    let mut responses = Vec::new();
    for file in &files {
        let batch = read_export(file)?;
        debug!("Read {} responses from {}", batch.len(), file.display());
        responses.extend(batch);
    }

    info!(
        "Loaded {} responses from {} files",
        responses.len(),
        files.len()
    );
    Ok(responses)
}

fn export_files(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| IngestError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        if entry.file_type().is_file() && is_json && !hidden {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn read_export(path: &Path) -> Result<Vec<WorkerResponse>, IngestError> {
    let content = fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| IngestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Group responses by question id.
///
/// Questions appear in order of first submission; workers keep their
/// relative order within a question.
pub fn group_by_question(
    responses: Vec<WorkerResponse>,
) -> Result<Vec<QuestionGroup>, ValidationError> {
    let mut groups: Vec<QuestionGroup> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (record, response) in responses.into_iter().enumerate() {
        if response.question_id.trim().is_empty() {
            return Err(ValidationError::MissingQuestionId { record });
        }
        match positions.get(&response.question_id) {
            Some(&idx) => groups[idx].responses.push(response),
            None => {
                positions.insert(response.question_id.clone(), groups.len());
                groups.push(QuestionGroup {
                    question_id: response.question_id.clone(),
                    responses: vec![response],
                });
            }
        }
    }

    for group in &groups {
        if group.worker_count() < 2 {
            warn!(
                "Question {} has {} response(s); it cannot be corroborated and will be discarded",
                group.question_id,
                group.worker_count()
            );
        }
    }

    Ok(groups)
}
