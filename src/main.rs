//! rationale-qc - corroborated consensus labels from crowd judgments
//!
//! Reads crowd-worker response exports, aggregates each question's
//! judgments and writes a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success (agreement at or above --min-agreement, or no gate set)
//!   1 - Runtime error (unreadable input, catalog failure, bad config, etc.)
//!   2 - Agreement with reference labels below --min-agreement

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rationale_qc::catalog::{self, Catalog, QuestionSource};
use rationale_qc::cli::Args;
use rationale_qc::config::{Config, DEFAULT_CONFIG_FILE};
use rationale_qc::ingest::{self, IngestStats, QuestionGroup};
use rationale_qc::report;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("rationale-qc v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Aggregation failed: {:#}", e);
            eprintln!("\nError: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .rationale-qc.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the aggregation workflow. Returns exit code (0 or 2).
async fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let Some(responses_path) = config.input.responses.clone() else {
        bail!("No responses given; pass --responses or set [input].responses in the config");
    };
    let responses_path = PathBuf::from(responses_path);

    // Step 1: Load and group responses
    let responses = ingest::load_responses(&responses_path)
        .with_context(|| format!("Failed to load responses from {}", responses_path.display()))?;
    let stats = IngestStats::from_responses(&responses);
    let groups = ingest::group_by_question(responses).context("Invalid response record")?;
    info!(
        "Grouped {} responses from {} workers into {} questions",
        stats.responses,
        stats.workers,
        groups.len()
    );

    if args.dry_run {
        return Ok(handle_dry_run(&groups));
    }

    // Step 2: Reference data
    let catalog = load_catalog(&config, args.quiet).await?;

    // Step 3: Aggregate
    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(groups.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} questions")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    };

    let mut items = Vec::with_capacity(groups.len());
    for group in &groups {
        let item = report::build_item(group, catalog.as_ref())
            .with_context(|| format!("Failed to resolve question {}", group.question_id))?;
        items.push(item);
        progress.inc(1);
    }
    progress.finish_and_clear();

    // Step 4: Write the report
    let report = report::build_report(
        &responses_path.display().to_string(),
        &stats,
        items,
        start_time.elapsed(),
    );
    let output = PathBuf::from(&config.general.output);
    report::write_report(
        &report,
        &output,
        config.report.format,
        config.report.include_rationales,
    )?;

    let summary = &report.summary;
    if !args.quiet {
        println!("Questions: {}", summary.items);
        println!(
            "  Faithful: {} | Discarded: {}",
            summary.faithful, summary.faithfulness_discarded
        );
        println!(
            "  Relevant: {} | Discarded: {}",
            summary.relevant, summary.relevancy_discarded
        );
        if summary.compared > 0 {
            println!(
                "  Agreement over {} questions: faithfulness {:.1}%, relevancy {:.1}%",
                summary.compared,
                summary.faithfulness_agreement * 100.0,
                summary.relevancy_agreement * 100.0
            );
        }
        println!("Report saved to: {}", output.display());
    }

    // Check --min-agreement gate
    if let Some(min_rate) = args.min_agreement {
        match summary.lowest_agreement() {
            Some(lowest) if lowest < min_rate => {
                eprintln!(
                    "Agreement {:.3} is below --min-agreement {:.3}. Failing (exit code 2).",
                    lowest, min_rate
                );
                return Ok(2);
            }
            Some(_) => {}
            None => warn!("--min-agreement set but no reference labels were compared"),
        }
    }

    Ok(0)
}

/// Handle --dry-run: print the grouping and exit.
fn handle_dry_run(groups: &[QuestionGroup]) -> i32 {
    println!("Dry run: {} questions (no aggregation)\n", groups.len());
    for group in groups {
        println!("  {}  {} workers", group.question_id, group.worker_count());
    }
    0
}

/// Load the question catalog and reference dataset when both are configured.
async fn load_catalog(config: &Config, quiet: bool) -> Result<Option<Catalog>> {
    let (questions, dataset) = match (&config.input.questions, &config.input.dataset) {
        (Some(questions), Some(dataset)) => (questions, dataset),
        (None, None) => return Ok(None),
        _ => {
            warn!("Reference evaluation needs both a question catalog and a dataset; skipping");
            return Ok(None);
        }
    };

    let source = QuestionSource::parse(questions);
    let timeout = Duration::from_secs(config.input.timeout_seconds);
    let questions = catalog::load_questions(&source, timeout, !quiet)
        .await
        .context("Failed to load question catalog")?;
    let dataset = catalog::load_dataset(Path::new(dataset))
        .await
        .context("Failed to load reference dataset")?;

    info!(
        "Loaded {} questions and {} reference entries",
        questions.len(),
        dataset.len()
    );
    Ok(Some(Catalog::new(questions, dataset)))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
