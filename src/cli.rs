//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// rationale-qc - corroborated consensus labels from crowd judgments
///
/// Groups crowd-worker judgments on RAG answers by question, keeps only
/// judgments whose rationale is corroborated by another worker, and
/// majority-votes faithfulness and relevancy labels per question.
///
/// Examples:
///   rationale-qc --responses data/prolific-responses.json
///   rationale-qc --responses exports/ --format json --output results.json
///   rationale-qc --responses data/responses.json --questions https://host/questions --dataset data/dataset.json
///   rationale-qc --responses data/responses.json --dry-run
///   rationale-qc --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Response export file, or a directory of `.json` exports
    #[arg(short, long, value_name = "PATH")]
    pub responses: Option<PathBuf>,

    /// Question catalog: a JSON file or an http(s) URL serving the question list
    #[arg(long, value_name = "FILE|URL", env = "RATIONALE_QC_QUESTIONS")]
    pub questions: Option<String>,

    /// Reference dataset with measured labels
    ///
    /// Used together with --questions to score consensus against reference labels.
    #[arg(long, value_name = "FILE", env = "RATIONALE_QC_DATASET")]
    pub dataset: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .rationale-qc.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Timeout in seconds for fetching the question catalog
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Leave retained rationales out of the Markdown report
    #[arg(long)]
    pub no_rationales: bool,

    /// Fail if agreement with reference labels drops below this rate
    ///
    /// Useful for CI pipelines. Exit code 2 when either metric's agreement
    /// is below the rate. Value between 0.0 and 1.0.
    #[arg(long, value_name = "RATE")]
    pub min_agreement: Option<f64>,

    /// Dry run: load and group responses without aggregating
    ///
    /// Shows how many workers judged each question and exits.
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .rationale-qc.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(rate) = self.min_agreement {
            if !(0.0..=1.0).contains(&rate) {
                return Err("Minimum agreement must be between 0.0 and 1.0".to_string());
            }
        }

        if let Some(ref questions) = self.questions {
            if questions.trim().is_empty() {
                return Err("Question catalog source must not be empty".to_string());
            }
        }

        if let Some(ref responses) = self.responses {
            if !responses.exists() {
                return Err(format!(
                    "Responses path does not exist: {}",
                    responses.display()
                ));
            }
        }

        if let Some(ref dataset) = self.dataset {
            if !dataset.is_file() {
                return Err(format!("Dataset file does not exist: {}", dataset.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
