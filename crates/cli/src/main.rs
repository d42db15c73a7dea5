//! Cached memory controller CLI.
//!
//! This binary replays request traces through the controller model. It performs:
//! 1. **Run:** Load configuration, replay a trace against the reference banked memory, and
//!    print the statistics report (text or JSON).
//! 2. **Defaults:** Print the default configuration as JSON, as a starting point for edits.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use memsched_core::config::{Config, KeyValueConfig};
use memsched_core::sim::simulator::{RunSummary, Simulator};
use memsched_core::sim::trace::TraceReader;
use memsched_core::stats::ControllerStats;

#[derive(Parser, Debug)]
#[command(
    name = "memsched",
    author,
    version,
    about = "Cached FR-FCFS memory controller model",
    long_about = "Replay a request trace through an FR-FCFS memory controller with a byte-addressable front-end cache.\n\nLogging is controlled with RUST_LOG (e.g. RUST_LOG=debug).\n\nExamples:\n  memsched run --trace traces/stream.trc\n  memsched run --trace traces/stream.trc --config cfg.json --set CacheEviction=Random --json\n  memsched defaults > cfg.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace and print controller statistics.
    Run {
        /// Request trace (`<cycle> <R|W|RP|WP> <address> [hex data]` per line).
        #[arg(short, long)]
        trace: PathBuf,

        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// `Key Value` configuration file applied on top of the JSON configuration.
        #[arg(long)]
        params: Option<PathBuf>,

        /// Individual `Key=Value` overrides, applied last.
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Stop after this many cycles even if requests are outstanding.
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the default configuration as JSON.
    Defaults,
}

/// JSON report: replay totals plus the controller statistics under their report names.
#[derive(Serialize, Debug)]
struct Report {
    summary: RunSummary,
    stats: serde_json::Value,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            trace,
            config,
            params,
            set,
            max_cycles,
            json,
        } => cmd_run(&trace, config, params, &set, max_cycles, json),
        Commands::Defaults => cmd_defaults(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Builds the configuration from the JSON file, the key/value file, and the `--set` overrides.
fn load_config(
    path: Option<PathBuf>,
    params: Option<PathBuf>,
    overrides: &[String],
) -> Result<Config, Box<dyn Error>> {
    let mut config = match path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut source = match params {
        Some(path) => KeyValueConfig::parse(&std::fs::read_to_string(path)?)?,
        None => KeyValueConfig::new(),
    };
    for assignment in overrides {
        source.parse_assignment(assignment)?;
    }
    if !source.is_empty() {
        config.controller.set_config(&source)?;
    }
    config.validate()?;
    Ok(config)
}

/// Replays `trace` and prints the report.
fn cmd_run(
    trace: &Path,
    config: Option<PathBuf>,
    params: Option<PathBuf>,
    overrides: &[String],
    max_cycles: Option<u64>,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let config = load_config(config, params, overrides)?;
    let records = TraceReader::open(trace, config.controller.cache_line_bytes)?.read_all()?;
    info!("loaded {} requests from {}", records.len(), trace.display());

    let mut sim = Simulator::from_config(&config);
    let summary = sim.replay(records, max_cycles)?;
    let stats = *sim.controller.stats();

    if json {
        print_json(summary, &stats)?;
    } else {
        println!(
            "[*] {} cycles, {} requests accepted, {} completed, {} rejections{}",
            summary.cycles,
            summary.accepted,
            summary.completed,
            summary.rejections,
            if summary.truncated {
                " (stopped at cycle limit)"
            } else {
                ""
            }
        );
        stats.print();
    }
    Ok(())
}

fn print_json(summary: RunSummary, stats: &ControllerStats) -> Result<(), Box<dyn Error>> {
    let report = Report {
        summary,
        stats: stats.to_value(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_defaults() -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(&Config::default())?);
    Ok(())
}
