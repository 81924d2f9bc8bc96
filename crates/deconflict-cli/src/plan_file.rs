//! JSON mission plan files for `check_plan`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use deconflict_core::{Trajectory, TrajectoryPlan};
use serde::{Deserialize, Serialize};

/// A primary mission plus the trajectories to check it against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanFile {
    pub primary: TrajectoryPlan,
    #[serde(default)]
    pub others: Vec<TrajectoryPlan>,
    /// Buffer to use when none is given on the command line
    #[serde(default)]
    pub safety_buffer_m: Option<f64>,
}

impl PlanFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Validate every plan into a trajectory.
    pub fn into_trajectories(self) -> Result<(Trajectory, Vec<Trajectory>)> {
        let primary = Trajectory::try_from(self.primary).context("primary trajectory rejected")?;
        let others = self
            .others
            .into_iter()
            .map(|plan| {
                let id = plan.drone_id.clone();
                Trajectory::try_from(plan).with_context(|| format!("trajectory '{id}' rejected"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((primary, others))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "safety_buffer_m": 20.0,
        "primary": {
            "drone_id": "primary",
            "waypoints": [{"x": 0, "y": 0, "z": 100}, {"x": 100, "y": 0, "z": 100}],
            "start_time": "2025-04-07T10:00:00Z",
            "end_time": "2025-04-07T10:10:00Z"
        },
        "others": [{
            "drone_id": "other",
            "waypoints": [
                {"x": 0, "y": 10, "z": 100, "time": "2025-04-07T10:00:00Z"},
                {"x": 100, "y": 10, "z": 100, "time": "2025-04-07T10:10:00Z"}
            ]
        }]
    }"#;

    #[test]
    fn parses_plans_and_derives_windows() {
        let plan = PlanFile::parse(SAMPLE).unwrap();
        assert_eq!(plan.safety_buffer_m, Some(20.0));

        let (primary, others) = plan.into_trajectories().unwrap();
        assert_eq!(primary.drone_id(), "primary");
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].start_time(), primary.start_time());
    }

    #[test]
    fn invalid_plan_names_the_drone() {
        let mut plan = PlanFile::parse(SAMPLE).unwrap();
        plan.others[0].waypoints.clear();
        let err = plan.into_trajectories().unwrap_err();
        assert!(format!("{err:#}").contains("trajectory 'other' rejected"));
    }
}
