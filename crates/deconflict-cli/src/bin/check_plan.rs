//! Check one primary mission from a JSON plan file.
//!
//! Usage:
//!   cargo run -p deconflict-cli --bin check_plan -- mission.json --json

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use deconflict_cli::plan_file::PlanFile;
use deconflict_cli::{init_tracing, Config};
use deconflict_core::{DeconflictionService, DEFAULT_SAMPLE_INTERVAL_S};

/// Fallback buffer when neither the file nor the flags give one.
const DEFAULT_SAFETY_BUFFER_M: f64 = 10.0;

#[derive(Parser, Debug)]
#[command(author, version, about = "Check a planned mission against registered drones")]
struct Args {
    /// Plan file: {"primary": {...}, "others": [...], "safety_buffer_m": 20}
    plan: PathBuf,

    /// Safety buffer in meters (overrides the file)
    #[arg(long)]
    safety_buffer: Option<f64>,

    /// Sampling resolution in milliseconds
    #[arg(long)]
    sample_interval_ms: Option<f64>,

    /// Print the full report as JSON instead of a summary
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Conflicts listed in the summary
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Check registered drones concurrently
    #[arg(long, default_value_t = false)]
    concurrent: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(false)?;

    let plan = PlanFile::load(&args.plan)?;
    let file_buffer = plan.safety_buffer_m.unwrap_or(DEFAULT_SAFETY_BUFFER_M);
    let config = Config::from_env().with_overrides(args.safety_buffer, args.sample_interval_ms);
    let service_config = config.deconfliction(file_buffer);

    if service_config.sample_interval_s != DEFAULT_SAMPLE_INTERVAL_S {
        tracing::info!(interval_s = service_config.sample_interval_s, "Custom sample interval");
    }

    let (primary, others) = plan.into_trajectories()?;
    let service = DeconflictionService::with_config(service_config)?;
    for other in others {
        service.register_trajectory(other);
    }

    let report = if args.concurrent {
        service.check_mission_safety_concurrent(Arc::new(primary)).await?
    } else {
        service.check_mission_safety(&primary)?
    };

    if args.json {
        println!("{}", report.to_json_pretty().context("serializing report")?);
    } else {
        print!("{}", report.summary(args.limit));
    }

    Ok(if report.is_clear() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
