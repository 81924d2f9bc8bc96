//! Deconfliction CLI - scenario runner and plan checker.
//!
//! This crate provides the command line binaries:
//! - run_scenarios: runs the built-in scenario battery
//! - check_plan: checks a mission described in a JSON plan file

pub mod config;
pub mod output;
pub mod plan_file;
pub mod scenarios;

pub use config::Config;
pub use scenarios::{all_scenarios, Scenario, ScenarioOutcome};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber on stderr, leaving stdout to
/// reports. `RUST_LOG` still applies.
pub fn init_tracing(json: bool) -> anyhow::Result<()> {
    init_tracing_with(json, std::io::stderr)
}

/// Install the global tracing subscriber writing to `writer`.
pub fn init_tracing_with<W>(json: bool, writer: W) -> anyhow::Result<()>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("deconflict_core=info".parse()?);

    if json {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .with(filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .with(filter)
            .try_init()?;
    }
    Ok(())
}
