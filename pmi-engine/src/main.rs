//! PMI Engine - command-line entry point
//!
//! Reads a JSON case file, runs the requested analysis and writes the JSON
//! result to stdout or to `--output`. Logs go to stderr or the configured
//! log file so stdout stays machine-readable.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use pmi_common::config::LoggingConfig;
use pmi_common::human_time::{format_interval, format_pmi};
use pmi_engine::case::{run_case, AnalysisMode, CaseFile, CaseReport, RunOptions};
use pmi_engine::{export, EngineConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for pmi-engine
#[derive(Parser, Debug)]
#[command(name = "pmi-engine")]
#[command(about = "Postmortem interval estimation from insect development evidence")]
#[command(version)]
struct Args {
    /// JSON case file to analyze
    #[arg(required_unless_present = "print_default_config")]
    case_file: Option<PathBuf>,

    /// Configuration file (overrides PMI_CONFIG and platform defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Analysis to run (defaults to the case file's mode)
    #[arg(short, long, value_enum)]
    mode: Option<AnalysisMode>,

    /// Seed for reproducible Monte Carlo runs
    #[arg(long)]
    seed: Option<u64>,

    /// Write the result here instead of stdout (`.json` appended when missing)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the Monte Carlo stage of the validation report
    #[arg(long)]
    no_monte_carlo: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        let toml = toml::to_string_pretty(&EngineConfig::default())
            .context("Failed to render default configuration")?;
        print!("{}", toml);
        return Ok(());
    }

    let config =
        EngineConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging)?;

    info!("Starting pmi-engine v{}", env!("CARGO_PKG_VERSION"));

    let case_path = args.case_file.context("No case file given")?;
    let case = CaseFile::load(&case_path)
        .with_context(|| format!("Failed to read case file {}", case_path.display()))?;

    let options = RunOptions {
        mode: args.mode,
        seed: args.seed,
        skip_monte_carlo: args.no_monte_carlo,
    };
    let report = run_case(&config, &case, options).context("Analysis failed")?;
    log_summary(&report);

    match args.output {
        Some(path) => {
            let written = export::export_json(&report, &path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Result written to {}", written.display());
        }
        None => {
            println!(
                "{}",
                export::to_json_string(&report).context("Failed to serialize result")?
            );
        }
    }

    Ok(())
}

/// Install the fmt subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

fn log_summary(report: &CaseReport) {
    match report {
        CaseReport::Methods(result) => {
            info!(
                "Consensus PMI {} ({}) from {} method(s), agreement {:?}",
                format_pmi(result.consensus.pmi_days),
                format_interval(result.consensus.confidence_low, result.consensus.confidence_high),
                result.estimates.len(),
                result.agreement.level
            );
        }
        CaseReport::Validation(report) => {
            let interval = report.uncertainty_analysis.confidence_95;
            info!(
                "PMI {} with 95% interval {}, validation score {:.1}",
                format_pmi(report.uncertainty_analysis.base_pmi),
                format_interval(interval.low, interval.high),
                report.overall_validation_score
            );
        }
        CaseReport::Specimens(result) => {
            info!(
                "Consensus PMI {} ({}) from {} specimen(s), overall quality {}",
                format_pmi(result.consensus.pmi_days),
                format_interval(result.consensus.confidence_low, result.consensus.confidence_high),
                result.specimen_results.len(),
                result.overall_quality
            );
        }
    }
}
