//! Console and JSON rendering of check results.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use deconflict_core::SafetyReport;

use crate::scenarios::{slug, ScenarioOutcome};

/// Conflicts listed per scenario on the console.
pub const CONSOLE_CONFLICT_LIMIT: usize = 3;

/// Console block for one scenario run.
pub fn render_outcome(outcome: &ScenarioOutcome) -> String {
    let mut out = format!("\n=== Testing {} ===\n", outcome.name);
    out.push_str(&outcome.report.summary(CONSOLE_CONFLICT_LIMIT));
    if !outcome.passed() {
        out.push_str(&format!(
            "UNEXPECTED: expected '{}', got '{}'\n",
            outcome.expected, outcome.report.status
        ));
    }
    out
}

/// Final tally line for a batch run.
pub fn render_tally(outcomes: &[ScenarioOutcome]) -> String {
    let passed = outcomes.iter().filter(|o| o.passed()).count();
    format!("\n{passed}/{} scenarios matched their expected status\n", outcomes.len())
}

/// Write `report` as pretty JSON to `<dir>/<slug(name)>.json`.
pub fn write_report(dir: &Path, name: &str, report: &SafetyReport) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("{}.json", slug(name)));
    let json = report.to_json_pretty().context("serializing report")?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
