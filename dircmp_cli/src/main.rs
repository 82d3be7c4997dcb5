use anyhow::Context;
use clap::Parser;
use dircmp_common::{load_config, AppConfig, CompareOptions, MismatchKind, Outcome};
use dircmp_core::ComparisonEngine;
use serde::Serialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Exit status for usage, configuration and report failures
const EXIT_ERROR: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "dircmp")]
#[command(author = "dircmp Contributors")]
#[command(version)]
#[command(about = "Verify that two directory trees are equivalent", long_about = None)]
struct Cli {
    /// Left directory path
    left: PathBuf,

    /// Right directory path
    right: PathBuf,

    /// Trace every comparison step to standard output
    #[arg(short = 'd', long)]
    debug: bool,

    /// Follow symbolic links on the left side
    #[arg(short = 'f', long)]
    follow_symlinks: bool,

    /// Read the right side with the same link policy as the left side
    #[arg(long)]
    symmetric: bool,

    /// Require matching entry names, not only matching entry counts
    #[arg(long)]
    strict_names: bool,

    /// Compare modification times to the nanosecond
    #[arg(long)]
    exact_mtime: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Configuration file (defaults to dircmp.toml in the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.json);

    let code = match run(&cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            error!("{:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(code);
}

fn init_tracing(debug: bool, json: bool) {
    let default_filter = if debug { "debug" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Traces go to stdout unless stdout carries the JSON report
    let (writer, ansi) = if debug && !json {
        (BoxMakeWriter::new(std::io::stdout), std::io::stdout().is_terminal())
    } else {
        (BoxMakeWriter::new(std::io::stderr), std::io::stderr().is_terminal())
    };

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_env_filter(filter)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<Outcome> {
    let loaded = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = loaded.path.as_ref().filter(|_| loaded.exists) {
        debug!("Loaded configuration from {}", path.display());
    }

    let config = apply_flags(cli, loaded.config);
    let options = CompareOptions::from(&config);
    debug!("Options: {:?}", options);

    let engine = ComparisonEngine::new(options);
    let outcome = engine.compare_trees(&cli.left, &cli.right);

    if cli.json {
        let report = build_json_report(&cli.left, &cli.right, &outcome);
        let output = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
        println!("{output}");
    }

    Ok(outcome)
}

/// Command-line flags can only switch options on
fn apply_flags(cli: &Cli, mut config: AppConfig) -> AppConfig {
    config.follow_symlinks |= cli.follow_symlinks;
    config.symmetric_links |= cli.symmetric;
    config.strict_names |= cli.strict_names;
    config.exact_mtime |= cli.exact_mtime;
    config
}

#[derive(Serialize)]
struct JsonReport {
    left: String,
    right: String,
    result: &'static str,
    exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    mismatch: Option<JsonMismatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
}

#[derive(Serialize)]
struct JsonMismatch {
    left: String,
    right: String,
    reason: String,
    detail: MismatchKind,
}

#[derive(Serialize)]
struct JsonError {
    path: String,
    operation: &'static str,
    message: String,
}

fn build_json_report(left: &Path, right: &Path, outcome: &Outcome) -> JsonReport {
    let mut report = JsonReport {
        left: left.to_string_lossy().to_string(),
        right: right.to_string_lossy().to_string(),
        result: outcome.label(),
        exit_code: outcome.exit_code(),
        mismatch: None,
        error: None,
    };

    match outcome {
        Outcome::Equivalent => {}
        Outcome::NotEquivalent(mismatch) => {
            report.mismatch = Some(JsonMismatch {
                left: mismatch.left.to_string_lossy().to_string(),
                right: mismatch.right.to_string_lossy().to_string(),
                reason: mismatch.kind.to_string(),
                detail: mismatch.kind.clone(),
            });
        }
        Outcome::InspectionError(err) => {
            report.error = Some(JsonError {
                path: err.path.to_string_lossy().to_string(),
                operation: err.op.as_str(),
                message: err.source.to_string(),
            });
        }
    }

    report
}
