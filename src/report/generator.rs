//! Markdown and JSON report generation.
//!
//! This module renders aggregation results into a Markdown document or
//! a pretty-printed JSON file.

use crate::cli::OutputFormat;
use crate::models::{ItemReport, Metric, MetricOutcome, Report, ReportMetadata, ReportSummary};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, include_rationales: bool) -> String {
    let mut output = String::new();

    output.push_str("# Rationale QC Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_items_section(&report.items, include_rationales));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Responses:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Questions:** {}\n", metadata.items));
    section.push_str(&format!("- **Responses Read:** {}\n", metadata.responses));
    section.push_str(&format!("- **Distinct Workers:** {}\n", metadata.workers));
    if let (Some(first), Some(last)) = (metadata.first_submission, metadata.last_submission) {
        section.push_str(&format!(
            "- **Collection Window:** {} to {}\n",
            first.format("%Y-%m-%d %H:%M"),
            last.format("%Y-%m-%d %H:%M")
        ));
    }
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_summary_section(summary: &ReportSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Metric | Consensus 1 | Consensus 0 | Discarded |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n",
        Metric::Faithfulness,
        summary.faithful,
        summary.items - summary.faithful,
        summary.faithfulness_discarded
    ));
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        Metric::Relevancy,
        summary.relevant,
        summary.items - summary.relevant,
        summary.relevancy_discarded
    ));

    if summary.compared > 0 {
        section.push_str("### Agreement with Reference Labels\n\n");
        section.push_str(&format!(
            "Compared {} of {} questions.\n\n",
            summary.compared, summary.items
        ));
        section.push_str("| Metric | Agreement |\n");
        section.push_str("|:---|:---:|\n");
        section.push_str(&format!(
            "| {} | {:.1}% |\n",
            Metric::Faithfulness,
            summary.faithfulness_agreement * 100.0
        ));
        section.push_str(&format!(
            "| {} | {:.1}% |\n\n",
            Metric::Relevancy,
            summary.relevancy_agreement * 100.0
        ));
    }

    section
}

fn generate_items_section(items: &[ItemReport], include_rationales: bool) -> String {
    let mut section = String::new();

    section.push_str("## Questions\n\n");

    if items.is_empty() {
        section.push_str("No questions were aggregated.\n\n");
        return section;
    }

    for item in items {
        section.push_str(&generate_item_block(item, include_rationales));
    }

    section
}

fn generate_item_block(item: &ItemReport, include_rationales: bool) -> String {
    let mut block = String::new();

    block.push_str(&format!("### `{}`\n\n", item.question_id));
    if let Some(ref query) = item.query {
        block.push_str(&format!("**Query:** {}\n\n", query));
    }
    if let Some(ref response) = item.response {
        block.push_str(&format!("**Response:** {}\n\n", response));
    }
    block.push_str(&format!("*Workers: {}*\n\n", item.workers));

    block.push_str("| Metric | Consensus | Threshold | Retained | Reference |\n");
    block.push_str("|:---|:---:|:---:|:---:|:---:|\n");
    for metric in [Metric::Faithfulness, Metric::Relevancy] {
        let outcome = item.outcome(metric);
        let reference = item.reference.map(|r| match metric {
            Metric::Faithfulness => r.faithfulness,
            Metric::Relevancy => r.relevancy,
        });
        block.push_str(&format!(
            "| {} | {} | {:.3} | {}/{} | {} |\n",
            metric,
            outcome.consensus,
            outcome.threshold,
            outcome.retained_workers.len(),
            item.workers,
            reference_cell(outcome, reference)
        ));
    }
    block.push('\n');

    if include_rationales {
        for metric in [Metric::Faithfulness, Metric::Relevancy] {
            let outcome = item.outcome(metric);
            if outcome.is_discarded() {
                continue;
            }
            block.push_str(&format!("**{} rationales:**\n\n", metric));
            for (worker, rationale) in outcome
                .retained_workers
                .iter()
                .zip(&outcome.retained_rationales)
            {
                block.push_str(&format!("> `{}`: {}\n>\n", worker, rationale));
            }
            block.push('\n');
        }
    }

    block.push_str("---\n\n");

    block
}

fn reference_cell(outcome: &MetricOutcome, reference: Option<f64>) -> String {
    match (reference, outcome.agrees_with_reference) {
        (Some(value), Some(true)) => format!("{} ✓", value),
        (Some(value), _) => format!("{} ✗", value),
        (None, _) => "-".to_string(),
    }
}

fn generate_footer() -> String {
    "*Report generated by rationale-qc*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Render the report in `format` and write it to `path`.
pub fn write_report(
    report: &Report,
    path: &Path,
    format: OutputFormat,
    include_rationales: bool,
) -> Result<()> {
    let content = match format {
        OutputFormat::Json => generate_json_report(report)?,
        OutputFormat::Markdown => generate_markdown_report(report, include_rationales),
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
