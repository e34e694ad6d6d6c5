//! CLI entry point for the SLCSP tool.
//!
//! Provides subcommands for computing benchmark rates for a list of
//! zipcodes, exporting the per-area rates, and listing ambiguous zipcodes.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use slcsp::{
    output::{print_pretty, to_json, write_area_rates, write_output, write_output_file, write_stats_file},
    parser::{load_plans, load_targets, load_zips},
    pipeline::{
        InsufficientRatesPolicy, assign_areas_to_zipcodes, assign_rates_to_zipcodes,
        create_area_rates_with, find_ambiguous_zipcodes, run_pipeline,
    },
    types::AreaRates,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "slcsp")]
#[command(about = "Second lowest cost Silver plan rates by zipcode", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the benchmark rate for every target zipcode
    Run {
        /// Plans table (plan_id, metal_level, rate, rate_area)
        #[arg(long, default_value = "plans.csv")]
        plans: String,

        /// Zipcode to rate area table
        #[arg(long, default_value = "zips.csv")]
        zips: String,

        /// Target zipcodes (zipcode, rate)
        #[arg(long, default_value = "slcsp.csv")]
        target: String,

        /// File to write results to (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Csv)]
        format: Format,

        /// Optional: write run statistics as JSON to this file
        #[arg(long)]
        stats: Option<String>,

        /// Leave out rate areas with fewer than two distinct Silver rates
        /// instead of failing
        #[arg(long, default_value_t = false)]
        skip_insufficient: bool,
    },
    /// Export the second lowest Silver rate of each rate area
    AreaRates {
        /// Plans table (plan_id, metal_level, rate, rate_area)
        #[arg(long, default_value = "plans.csv")]
        plans: String,

        /// File to write the rate_area,rate table to (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Leave out rate areas with fewer than two distinct Silver rates
        /// instead of failing
        #[arg(long, default_value_t = false)]
        skip_insufficient: bool,
    },
    /// List target zipcodes that map to more than one rate area
    Ambiguous {
        /// Zipcode to rate area table
        #[arg(long, default_value = "zips.csv")]
        zips: String,

        /// Target zipcodes (zipcode, rate)
        #[arg(long, default_value = "slcsp.csv")]
        target: String,
    },
}

fn policy(skip_insufficient: bool) -> InsufficientRatesPolicy {
    if skip_insufficient {
        InsufficientRatesPolicy::Skip
    } else {
        InsufficientRatesPolicy::Fail
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/slcsp.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("slcsp.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            plans,
            zips,
            target,
            output,
            format,
            stats,
            skip_insufficient,
        } => {
            let plans = load_plans(&plans).with_context(|| format!("reading plans from {plans}"))?;
            let zips = load_zips(&zips).with_context(|| format!("reading zips from {zips}"))?;
            let targets =
                load_targets(&target).with_context(|| format!("reading targets from {target}"))?;

            let result = run_pipeline(&plans, &zips, &targets, policy(skip_insufficient))?;
            print_pretty(&result.records);

            match (format, output) {
                (Format::Csv, Some(path)) => write_output_file(&path, &result.records)
                    .with_context(|| format!("writing results to {path}"))?,
                (Format::Csv, None) => write_output(std::io::stdout().lock(), &result.records)?,
                (Format::Json, Some(path)) => std::fs::write(&path, to_json(&result.records)?)
                    .with_context(|| format!("writing results to {path}"))?,
                (Format::Json, None) => println!("{}", to_json(&result.records)?),
            }

            if let Some(path) = stats {
                write_stats_file(&path, &result.stats)
                    .with_context(|| format!("writing run statistics to {path}"))?;
            }

            let s = &result.stats;
            info!(
                target_zips = s.target_zips,
                rated = s.rated_zips,
                ambiguous = s.ambiguous_zips,
                unrated = s.unrated_zips,
                unmatched = s.unmatched_zips,
                coverage_pct = s.coverage_pct(),
                "Run complete"
            );
        }
        Commands::AreaRates {
            plans,
            output,
            skip_insufficient,
        } => {
            let plans = load_plans(&plans).with_context(|| format!("reading plans from {plans}"))?;
            let summary = create_area_rates_with(&plans, policy(skip_insufficient))?;

            export_area_rates(&summary.rates, output.as_deref())?;
        }
        Commands::Ambiguous { zips, target } => {
            let zips = load_zips(&zips).with_context(|| format!("reading zips from {zips}"))?;
            let targets =
                load_targets(&target).with_context(|| format!("reading targets from {target}"))?;

            // rates play no part in ambiguity, so join against an empty table
            let zip_areas = assign_areas_to_zipcodes(&targets, &zips);
            let rows = assign_rates_to_zipcodes(&zip_areas, &AreaRates::new());

            let ambiguous = find_ambiguous_zipcodes(&rows);
            info!(count = ambiguous.len(), "Ambiguous zipcodes found");
            for zipcode in ambiguous {
                println!("{zipcode}");
            }
        }
    }

    Ok(())
}

/// Writes the area rate table to a file, or to stdout when no path is given.
#[tracing::instrument(skip(rates), fields(areas = rates.len()))]
fn export_area_rates(rates: &AreaRates, path: Option<&str>) -> Result<()> {
    match path {
        Some(path) => {
            let mut buf = Vec::new();
            write_area_rates(&mut buf, rates)?;
            std::fs::write(path, buf).with_context(|| format!("writing area rates to {path}"))?;
        }
        None => write_area_rates(std::io::stdout().lock(), rates)?,
    }
    Ok(())
}
