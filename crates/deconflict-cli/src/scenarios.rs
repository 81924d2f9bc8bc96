//! Pre-defined mission scenarios for exercising the deconfliction service.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use deconflict_core::{
    DeconflictionService, MissionStatus, SafetyReport, Trajectory, Waypoint,
};

use crate::config::Config;

/// A named scenario: one primary mission and the drones already in the air.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub safety_buffer_m: f64,
    pub primary: Trajectory,
    pub others: Vec<Trajectory>,
    pub expected: MissionStatus,
}

/// Result of running one scenario.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub name: String,
    pub expected: MissionStatus,
    pub report: SafetyReport,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.report.status == self.expected
    }
}

impl Scenario {
    /// Fresh service for this scenario with every other drone registered.
    pub fn service(&self, config: &Config) -> Result<DeconflictionService> {
        let service = DeconflictionService::with_config(config.deconfliction(self.safety_buffer_m))
            .with_context(|| format!("scenario '{}' has an invalid configuration", self.name))?;
        for other in &self.others {
            service.register_trajectory(other.clone());
        }
        Ok(service)
    }

    pub fn run(&self, config: &Config) -> Result<ScenarioOutcome> {
        let report = self.service(config)?.check_mission_safety(&self.primary)?;
        Ok(self.outcome(report))
    }

    pub async fn run_concurrent(&self, config: &Config) -> Result<ScenarioOutcome> {
        let report = self
            .service(config)?
            .check_mission_safety_concurrent(Arc::new(self.primary.clone()))
            .await?;
        Ok(self.outcome(report))
    }

    fn outcome(&self, report: SafetyReport) -> ScenarioOutcome {
        ScenarioOutcome {
            name: self.name.clone(),
            expected: self.expected,
            report,
        }
    }
}

/// 2025-04-07 10:00:00 UTC, the shared mission start.
fn base_start() -> Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2025, 4, 7, 10, 0, 0)
        .single()
        .context("invalid scenario base time")
}

fn path(points: &[(f64, f64, f64)]) -> Vec<Waypoint> {
    points.iter().map(|&(x, y, z)| Waypoint::new(x, y, z)).collect()
}

fn diagonal(z: f64) -> Vec<Waypoint> {
    path(&[(0.0, 0.0, z), (100.0, 100.0, z), (200.0, 200.0, z)])
}

/// Every built-in scenario, in run order.
pub fn all_scenarios() -> Result<Vec<Scenario>> {
    Ok(vec![
        identical_paths()?,
        parallel_paths()?,
        crossing_paths()?,
        altitude_separation()?,
        temporal_separation()?,
        multiple_drones()?,
        brief_encounter()?,
        barely_within_safety()?,
        wide_parallel_paths()?,
        diagonal_crossing()?,
        vertical_stack()?,
    ])
}

/// Look up a scenario by name (case-insensitive, spaces or underscores).
pub fn find_scenario(name: &str) -> Result<Option<Scenario>> {
    let wanted = slug(name);
    Ok(all_scenarios()?.into_iter().find(|s| slug(&s.name) == wanted))
}

/// File-friendly form of a scenario name.
pub fn slug(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Two drones flying the same path at the same time.
pub fn identical_paths() -> Result<Scenario> {
    let start = base_start()?;
    let end = start + Duration::minutes(30);
    Ok(Scenario {
        name: "Identical Paths".to_string(),
        safety_buffer_m: 50.0,
        primary: Trajectory::new("primary", diagonal(100.0), start, end)?,
        others: vec![Trajectory::new("other", diagonal(100.0), start, end)?],
        expected: MissionStatus::ConflictDetected,
    })
}

/// Same heading, 20 m lateral offset, 30 m buffer.
pub fn parallel_paths() -> Result<Scenario> {
    let start = base_start()?;
    let end = start + Duration::minutes(30);
    Ok(Scenario {
        name: "Parallel Paths".to_string(),
        safety_buffer_m: 30.0,
        primary: Trajectory::new("primary", diagonal(100.0), start, end)?,
        others: vec![Trajectory::new(
            "other",
            path(&[(20.0, 0.0, 100.0), (120.0, 100.0, 100.0), (220.0, 200.0, 100.0)]),
            start,
            end,
        )?],
        expected: MissionStatus::ConflictDetected,
    })
}

/// East-bound and north-bound drones meeting at (100, 100).
pub fn crossing_paths() -> Result<Scenario> {
    let start = base_start()?;
    let end = start + Duration::minutes(30);
    Ok(Scenario {
        name: "Crossing Paths".to_string(),
        safety_buffer_m: 20.0,
        primary: Trajectory::new(
            "primary",
            path(&[(0.0, 100.0, 100.0), (100.0, 100.0, 100.0), (200.0, 100.0, 100.0)]),
            start,
            end,
        )?,
        others: vec![Trajectory::new(
            "other",
            path(&[(100.0, 0.0, 100.0), (100.0, 100.0, 100.0), (100.0, 200.0, 100.0)]),
            start,
            end,
        )?],
        expected: MissionStatus::ConflictDetected,
    })
}

/// Same ground track, 100 m apart vertically, 80 m buffer.
pub fn altitude_separation() -> Result<Scenario> {
    let start = base_start()?;
    let end = start + Duration::minutes(30);
    Ok(Scenario {
        name: "Altitude Separation".to_string(),
        safety_buffer_m: 80.0,
        primary: Trajectory::new("primary", diagonal(50.0), start, end)?,
        others: vec![Trajectory::new("other", diagonal(150.0), start, end)?],
        expected: MissionStatus::Clear,
    })
}

/// Same path flown in disjoint time windows.
pub fn temporal_separation() -> Result<Scenario> {
    let start = base_start()?;
    Ok(Scenario {
        name: "Temporal Separation".to_string(),
        safety_buffer_m: 20.0,
        primary: Trajectory::new("primary", diagonal(100.0), start, start + Duration::minutes(10))?,
        others: vec![Trajectory::new(
            "other",
            diagonal(100.0),
            start + Duration::minutes(20),
            start + Duration::minutes(30),
        )?],
        expected: MissionStatus::Clear,
    })
}

/// Two crossing drones and one far away.
pub fn multiple_drones() -> Result<Scenario> {
    let start = base_start()?;
    let end = start + Duration::minutes(30);
    Ok(Scenario {
        name: "Multiple Drones".to_string(),
        safety_buffer_m: 25.0,
        primary: Trajectory::new("primary", diagonal(100.0), start, end)?,
        others: vec![
            Trajectory::new(
                "drone1",
                path(&[(0.0, 200.0, 100.0), (100.0, 100.0, 100.0), (200.0, 0.0, 100.0)]),
                start,
                end,
            )?,
            Trajectory::new(
                "drone2",
                path(&[(200.0, 0.0, 100.0), (100.0, 100.0, 110.0), (0.0, 200.0, 100.0)]),
                start,
                end,
            )?,
            Trajectory::new(
                "drone3",
                path(&[(300.0, 300.0, 90.0), (350.0, 350.0, 90.0), (400.0, 400.0, 90.0)]),
                start,
                end,
            )?,
        ],
        expected: MissionStatus::ConflictDetected,
    })
}

/// A short crossing flight during the middle of the primary mission.
pub fn brief_encounter() -> Result<Scenario> {
    let start = base_start()?;
    Ok(Scenario {
        name: "Brief Encounter".to_string(),
        safety_buffer_m: 20.0,
        primary: Trajectory::new(
            "primary",
            path(&[(0.0, 0.0, 100.0), (100.0, 0.0, 100.0), (200.0, 0.0, 100.0)]),
            start,
            start + Duration::minutes(30),
        )?,
        others: vec![Trajectory::new(
            "other",
            path(&[(100.0, -100.0, 100.0), (100.0, 100.0, 100.0)]),
            start + Duration::minutes(10),
            start + Duration::minutes(20),
        )?],
        expected: MissionStatus::ConflictDetected,
    })
}

/// Parallel track 19 m away with a 20 m buffer.
pub fn barely_within_safety() -> Result<Scenario> {
    let start = base_start()?;
    let end = start + Duration::minutes(30);
    Ok(Scenario {
        name: "Barely Within Safety".to_string(),
        safety_buffer_m: 20.0,
        primary: Trajectory::new(
            "primary",
            path(&[(0.0, 0.0, 100.0), (100.0, 0.0, 100.0), (200.0, 0.0, 100.0)]),
            start,
            end,
        )?,
        others: vec![Trajectory::new(
            "other",
            path(&[(0.0, 19.0, 100.0), (100.0, 19.0, 100.0), (200.0, 19.0, 100.0)]),
            start,
            end,
        )?],
        expected: MissionStatus::ConflictDetected,
    })
}

/// Parallel track 30 m away with a 20 m buffer over ten minutes.
pub fn wide_parallel_paths() -> Result<Scenario> {
    let start = base_start()?;
    let end = start + Duration::minutes(10);
    Ok(Scenario {
        name: "Wide Parallel Paths".to_string(),
        safety_buffer_m: 20.0,
        primary: Trajectory::new("primary", path(&[(0.0, 0.0, 100.0), (100.0, 0.0, 100.0)]), start, end)?,
        others: vec![Trajectory::new(
            "other",
            path(&[(0.0, 30.0, 100.0), (100.0, 30.0, 100.0)]),
            start,
            end,
        )?],
        expected: MissionStatus::Clear,
    })
}

/// Diagonals crossing at (50, 50, 100) halfway through.
pub fn diagonal_crossing() -> Result<Scenario> {
    let start = base_start()?;
    let end = start + Duration::minutes(10);
    Ok(Scenario {
        name: "Diagonal Crossing".to_string(),
        safety_buffer_m: 20.0,
        primary: Trajectory::new(
            "primary",
            path(&[(0.0, 0.0, 100.0), (100.0, 100.0, 100.0)]),
            start,
            end,
        )?,
        others: vec![Trajectory::new(
            "other",
            path(&[(0.0, 100.0, 100.0), (100.0, 0.0, 100.0)]),
            start,
            end,
        )?],
        expected: MissionStatus::ConflictDetected,
    })
}

/// Same ground track 50 m apart vertically with a 20 m buffer.
pub fn vertical_stack() -> Result<Scenario> {
    let start = base_start()?;
    let end = start + Duration::minutes(10);
    Ok(Scenario {
        name: "Vertical Stack".to_string(),
        safety_buffer_m: 20.0,
        primary: Trajectory::new(
            "primary",
            path(&[(0.0, 0.0, 100.0), (100.0, 0.0, 100.0)]),
            start,
            end,
        )?,
        others: vec![Trajectory::new(
            "other",
            path(&[(0.0, 0.0, 150.0), (100.0, 0.0, 150.0)]),
            start,
            end,
        )?],
        expected: MissionStatus::Clear,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battery_has_unique_names() {
        let scenarios = all_scenarios().unwrap();
        assert_eq!(scenarios.len(), 11);
        let mut slugs: Vec<_> = scenarios.iter().map(|s| slug(&s.name)).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), scenarios.len());
    }

    #[test]
    fn lookup_ignores_case_and_separators() {
        let scenario = find_scenario("brief-ENCOUNTER").unwrap().unwrap();
        assert_eq!(scenario.name, "Brief Encounter");
        assert!(find_scenario("nope").unwrap().is_none());
    }

    #[test]
    fn multiple_drones_scenario_registers_three() {
        let scenario = multiple_drones().unwrap();
        let service = scenario.service(&Config::default()).unwrap();
        assert_eq!(service.registered_ids(), vec!["drone1", "drone2", "drone3"]);
    }
}
