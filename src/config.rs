//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.rationale-qc.toml` files. The aggregation itself takes no
//! configuration; these settings only drive the batch run around it.

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".rationale-qc.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input locations.
    #[serde(default)]
    pub input: InputConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "rationale_qc_report.md".to_string()
}

/// Where responses, questions and reference labels come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Response export file or directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<String>,

    /// Question catalog file or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<String>,

    /// Reference dataset file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,

    /// Catalog fetch timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            responses: None,
            questions: None,
            dataset: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Include retained rationales in Markdown reports.
    #[serde(default = "default_true")]
    pub include_rationales: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            include_rationales: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref responses) = args.responses {
            self.input.responses = Some(responses.display().to_string());
        }
        if let Some(ref questions) = args.questions {
            self.input.questions = Some(questions.clone());
        }
        if let Some(ref dataset) = args.dataset {
            self.input.dataset = Some(dataset.display().to_string());
        }
        if let Some(timeout) = args.timeout {
            self.input.timeout_seconds = timeout;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }

        // Flags always override
        if args.no_rationales {
            self.report.include_rationales = false;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "rationale_qc_report.md");
        assert_eq!(config.input.timeout_seconds, 30);
        assert!(config.input.questions.is_none());
        assert_eq!(config.report.format, OutputFormat::Markdown);
        assert!(config.report.include_rationales);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "results.json"

[input]
responses = "data/prolific-responses.json"
questions = "https://example.org/questions"
dataset = "data/dataset.json"

[report]
format = "json"
include_rationales = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "results.json");
        assert_eq!(
            config.input.responses.as_deref(),
            Some("data/prolific-responses.json")
        );
        assert_eq!(
            config.input.questions.as_deref(),
            Some("https://example.org/questions")
        );
        assert_eq!(config.input.timeout_seconds, 30);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert!(!config.report.include_rationales);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[input]\ntimeout_seconds = 5\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.input.timeout_seconds, 5);
        assert_eq!(config.general.output, "rationale_qc_report.md");
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[input\n").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config: Config = toml::from_str(
            r#"
[input]
questions = "questions.json"
timeout_seconds = 10

[report]
format = "json"
"#,
        )
        .unwrap();

        let args = Args::try_parse_from([
            "rationale-qc",
            "--dataset",
            "dataset.json",
            "--output",
            "out.md",
            "--format",
            "markdown",
            "--no-rationales",
        ])
        .unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.input.questions.as_deref(), Some("questions.json"));
        assert_eq!(config.input.dataset.as_deref(), Some("dataset.json"));
        assert_eq!(config.input.timeout_seconds, 10);
        assert_eq!(config.general.output, "out.md");
        assert_eq!(config.report.format, OutputFormat::Markdown);
        assert!(!config.report.include_rationales);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[input]"));
        assert!(toml_str.contains("[report]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.input.timeout_seconds, 30);
    }
}
