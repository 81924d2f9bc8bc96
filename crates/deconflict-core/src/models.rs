//! Core data models for mission planning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point in the local Cartesian frame (meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Position) -> f64 {
        crate::spatial::euclidean_distance(*self, *other)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// A planned 3D waypoint, optionally pinned to an absolute time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// Scheduled arrival time; derived from the mission window when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
}

impl Waypoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, time: None }
    }

    /// Waypoint on the ground plane (z = 0).
    pub fn planar(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0)
    }

    /// Pin this waypoint to an absolute time.
    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y, self.z)
    }

    pub fn distance_to(&self, other: &Waypoint) -> f64 {
        self.position().distance_to(&other.position())
    }
}

/// How untimed waypoints are spread between timed anchors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingPolicy {
    /// Every segment gets the same share of the anchor span
    #[default]
    Uniform,
    /// Segment time proportional to segment length
    DistanceProportional,
}

/// Unvalidated trajectory as submitted by a caller.
///
/// Converted into a [`crate::Trajectory`] with `TryFrom`, which applies the
/// same checks as [`crate::Trajectory::with_policy`]. A missing window bound
/// is taken from the first/last waypoint time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryPlan {
    pub drone_id: String,
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timing: TimingPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_waypoint_sits_on_ground() {
        let wp = Waypoint::planar(3.0, 4.0);
        assert_eq!(wp.z, 0.0);
        assert!(wp.time.is_none());
        assert!((wp.distance_to(&Waypoint::new(0.0, 0.0, 0.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn waypoint_without_z_or_time_deserializes() {
        let wp: Waypoint = serde_json::from_str(r#"{"x": 1.0, "y": 2.0}"#).unwrap();
        assert_eq!(wp, Waypoint::planar(1.0, 2.0));
    }
}
