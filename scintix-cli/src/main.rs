//! scintix CLI
//!
//! Runs JSON-lines event records through the detector response and prints
//! the run summary, histogram statistics and seed-save requests.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand};
use log::{info, LevelFilter};

use scintix_analysis::{run_events, run_events_parallel, HistogramBooking, RunOutput};
use scintix_core::units::{KEV, NS};
use scintix_core::{AntiCoincidenceRule, EventRecord, ResponseConfig};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] scintix_core::Error),

    #[error("Analysis error: {0}")]
    Analysis(#[from] scintix_analysis::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path}:{line}: invalid event record: {source}")]
    Record {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
}

/// Detector response processor for scintillator simulations.
#[derive(Parser)]
#[command(name = "scintix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process JSON-lines event records
    Run {
        /// Input file(s), one event record per line
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Response configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Histogram booking (JSON)
        #[arg(long)]
        histograms: Option<PathBuf>,

        /// Process events on all cores
        #[arg(short, long)]
        parallel: bool,

        /// Coincidence time window (ns)
        #[arg(long)]
        time_window_ns: Option<f64>,

        /// Target energy threshold (keV)
        #[arg(long)]
        threshold1_kev: Option<f64>,

        /// Detector energy threshold (keV)
        #[arg(long)]
        threshold2_kev: Option<f64>,

        /// Minimum photons for a photon detector to count as fired
        #[arg(long)]
        pmt_threshold: Option<u32>,

        /// Request a seed save for events detecting at most this many photons
        #[arg(long)]
        save_threshold: Option<u64>,

        /// Use the target threshold for the detector-only selection
        #[arg(long)]
        symmetric: bool,

        /// Print one JSON summary per event
        #[arg(long)]
        summaries: bool,
    },

    /// Print the default response configuration
    Config,

    /// Print the default histogram booking
    Booking,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Reads every non-blank line of `path` as an event record.
fn read_records(path: &Path) -> Result<Vec<EventRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| CliError::Record {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

fn print_report(output: &RunOutput) {
    match output.run_summary() {
        Some(summary) => println!("{summary}"),
        None => println!("No events processed"),
    }

    println!();
    println!(
        "{:<3} | {:<42} | {:>8} | {:>12} | {:>12} | {:>9} | {:>9}",
        "ch", "Title", "Entries", "Mean", "RMS", "Under", "Over"
    );
    println!("{:-<112}", "");
    for (channel, h1) in output.histograms.iter() {
        let fmt_stat = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.6}"));
        println!(
            "{:<3} | {:<42} | {:>8} | {:>12} | {:>12} | {:>9.3} | {:>9.3}",
            channel.index(),
            h1.title(),
            h1.entries(),
            fmt_stat(h1.mean()),
            fmt_stat(h1.rms()),
            h1.underflow(),
            h1.overflow()
        );
    }

    if !output.save_requests.is_empty() {
        println!();
        for request in &output.save_requests {
            println!("Seed save requested for event {}", request.event_id);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            input,
            config,
            histograms,
            parallel,
            time_window_ns,
            threshold1_kev,
            threshold2_kev,
            pmt_threshold,
            save_threshold,
            symmetric,
            summaries,
        } => {
            let mut response = match &config {
                Some(path) => ResponseConfig::from_file(path)?,
                None => ResponseConfig::new(),
            };
            if let Some(window) = time_window_ns {
                response = response.with_time_window(window * NS);
            }
            if threshold1_kev.is_some() || threshold2_kev.is_some() {
                let t1 = threshold1_kev.map_or(response.threshold1, |t| t * KEV);
                let t2 = threshold2_kev.map_or(response.threshold2, |t| t * KEV);
                response = response.with_thresholds(t1, t2);
            }
            if let Some(threshold) = pmt_threshold {
                response = response.with_pmt_threshold(threshold);
            }
            if let Some(threshold) = save_threshold {
                response = response.with_save_threshold(threshold);
            }
            if symmetric {
                response = response.with_anti_coincidence_rule(AntiCoincidenceRule::Symmetric);
            }
            if cli.verbose > 0 {
                response = response.with_verbose(cli.verbose);
            }

            let booking = match &histograms {
                Some(path) => HistogramBooking::from_file(path)?,
                None => HistogramBooking::default(),
            };

            let start = Instant::now();
            let mut records = Vec::new();
            for path in &input {
                let file_records = read_records(path)?;
                info!("{}: {} events", path.display(), file_records.len());
                records.extend(file_records);
            }

            let output = if parallel {
                run_events_parallel(records, &response, &booking)?
            } else {
                run_events(records, &response, &booking)?
            };

            if summaries {
                for summary in &output.summaries {
                    println!("{}", serde_json::to_string(summary)?);
                }
                println!();
            }

            print_report(&output);
            println!();
            println!(
                "Processed {} file(s) in {:.2}s",
                input.len(),
                start.elapsed().as_secs_f64()
            );
        }

        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&ResponseConfig::default())?);
        }

        Commands::Booking => {
            println!(
                "{}",
                serde_json::to_string_pretty(&HistogramBooking::default())?
            );
        }
    }

    Ok(())
}
