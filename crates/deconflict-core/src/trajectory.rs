//! Time-parameterized drone trajectories.
//!
//! A [`Trajectory`] turns an ordered waypoint list and a mission window into
//! a continuous position-over-time function. Motion between waypoints is
//! linear in both space and time.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::{DeconflictionError, Result};
use crate::models::{Position, TimingPolicy, TrajectoryPlan, Waypoint};
use crate::spatial::{lerp, path_length};

/// A validated, immutable flight plan for one drone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    drone_id: String,
    waypoints: Vec<Waypoint>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    timing: TimingPolicy,
    /// Resolved arrival time at each waypoint (non-decreasing)
    schedule: Vec<DateTime<Utc>>,
}

impl Trajectory {
    /// Build a trajectory whose untimed waypoints share the mission window
    /// evenly per segment.
    pub fn new(
        drone_id: impl Into<String>,
        waypoints: Vec<Waypoint>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Self> {
        Self::with_policy(drone_id, waypoints, start_time, end_time, TimingPolicy::Uniform)
    }

    /// Build a trajectory with an explicit timing policy.
    ///
    /// Timed waypoints act as anchors. An untimed first/last waypoint is
    /// anchored to `start_time`/`end_time`; untimed waypoints in between are
    /// spread across the neighbouring anchors according to `timing`.
    pub fn with_policy(
        drone_id: impl Into<String>,
        waypoints: Vec<Waypoint>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        timing: TimingPolicy,
    ) -> Result<Self> {
        let drone_id = drone_id.into();
        validate(&drone_id, &waypoints, start_time, end_time)?;
        let schedule = build_schedule(&waypoints, start_time, end_time, timing);

        Ok(Self {
            drone_id,
            waypoints,
            start_time,
            end_time,
            timing,
            schedule,
        })
    }

    /// Build a trajectory whose window is taken from the first and last
    /// waypoint times.
    pub fn from_timed_waypoints(drone_id: impl Into<String>, waypoints: Vec<Waypoint>) -> Result<Self> {
        Self::try_from(TrajectoryPlan {
            drone_id: drone_id.into(),
            waypoints,
            start_time: None,
            end_time: None,
            timing: TimingPolicy::Uniform,
        })
    }

    pub fn drone_id(&self) -> &str {
        &self.drone_id
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub fn timing(&self) -> TimingPolicy {
        self.timing
    }

    /// Arrival time at each waypoint, same order as [`Self::waypoints`].
    pub fn schedule(&self) -> &[DateTime<Utc>] {
        &self.schedule
    }

    /// Whether `time` lies inside the mission window (inclusive).
    pub fn covers(&self, time: DateTime<Utc>) -> bool {
        time >= self.start_time && time <= self.end_time
    }

    /// Intersection of both mission windows, `None` unless it has positive
    /// length.
    pub fn overlap(&self, other: &Trajectory) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.start_time.max(other.start_time);
        let end = self.end_time.min(other.end_time);
        (start < end).then_some((start, end))
    }

    /// Planned 3D path length through all waypoints.
    pub fn path_length(&self) -> f64 {
        let points: Vec<Position> = self.waypoints.iter().map(Waypoint::position).collect();
        path_length(&points)
    }

    /// Position of the drone at absolute time `time`.
    ///
    /// Fails with [`DeconflictionError::OutOfRange`] outside the mission
    /// window. The window bounds return the first/last waypoint exactly.
    pub fn position_at(&self, time: DateTime<Utc>) -> Result<Position> {
        if !self.covers(time) {
            return Err(DeconflictionError::OutOfRange {
                drone_id: self.drone_id.clone(),
                time,
                start: self.start_time,
                end: self.end_time,
            });
        }
        Ok(self.interpolate(time))
    }

    fn interpolate(&self, time: DateTime<Utc>) -> Position {
        let last = self.waypoints.len() - 1;

        // Hold at the ends of the schedule.
        if time >= self.schedule[last] {
            return self.waypoints[last].position();
        }
        if time <= self.schedule[0] {
            return self.waypoints[0].position();
        }

        // schedule[0] < time < schedule[last], so 1 <= next <= last.
        let next = self.schedule.partition_point(|&t| t <= time);
        let prev = next - 1;
        let (t0, t1) = (self.schedule[prev], self.schedule[next]);
        let ratio = span_nanos(time - t0) as f64 / span_nanos(t1 - t0) as f64;

        lerp(
            self.waypoints[prev].position(),
            self.waypoints[next].position(),
            ratio,
        )
    }
}

impl TryFrom<TrajectoryPlan> for Trajectory {
    type Error = DeconflictionError;

    fn try_from(plan: TrajectoryPlan) -> Result<Self> {
        let start = plan
            .start_time
            .or_else(|| plan.waypoints.first().and_then(|wp| wp.time));
        let end = plan
            .end_time
            .or_else(|| plan.waypoints.last().and_then(|wp| wp.time));

        match (start, end) {
            (Some(start), Some(end)) => {
                Self::with_policy(plan.drone_id, plan.waypoints, start, end, plan.timing)
            }
            _ if plan.waypoints.is_empty() => Err(DeconflictionError::invalid_trajectory(
                plan.drone_id,
                "trajectory needs at least one waypoint",
            )),
            _ => Err(DeconflictionError::invalid_trajectory(
                plan.drone_id,
                "mission window needs a start and end time, given directly or on the first/last waypoint",
            )),
        }
    }
}

/// Whole nanoseconds in `span`, saturating.
pub(crate) fn span_nanos(span: Duration) -> i64 {
    span.num_nanoseconds().unwrap_or(if span < Duration::zero() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// The instant `ratio` of the way from `start` to `end`, kept inside
/// `[start, end]`.
pub(crate) fn instant_at_ratio(start: DateTime<Utc>, end: DateTime<Utc>, ratio: f64) -> DateTime<Utc> {
    let nanos = (span_nanos(end - start) as f64 * ratio).round() as i64;
    (start + Duration::nanoseconds(nanos)).clamp(start, end)
}

fn validate(
    drone_id: &str,
    waypoints: &[Waypoint],
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<()> {
    let invalid = |reason: String| DeconflictionError::invalid_trajectory(drone_id, reason);

    if drone_id.trim().is_empty() {
        return Err(invalid("drone id must not be empty".to_string()));
    }
    if waypoints.is_empty() {
        return Err(invalid("trajectory needs at least one waypoint".to_string()));
    }
    if end_time < start_time {
        return Err(invalid(format!(
            "end time {end_time} precedes start time {start_time}"
        )));
    }
    if (end_time - start_time).num_nanoseconds().is_none() {
        return Err(invalid("mission window is too long to sample".to_string()));
    }

    let mut previous: Option<DateTime<Utc>> = None;
    for (idx, wp) in waypoints.iter().enumerate() {
        if !wp.position().is_finite() {
            return Err(invalid(format!("waypoint {idx} has non-finite coordinates")));
        }
        let Some(time) = wp.time else {
            continue;
        };
        if time < start_time || time > end_time {
            return Err(invalid(format!(
                "waypoint {idx} time {time} lies outside the mission window"
            )));
        }
        if let Some(prev) = previous {
            if time < prev {
                return Err(invalid(format!(
                    "waypoint {idx} time {time} precedes earlier waypoint time {prev}"
                )));
            }
        }
        previous = Some(time);
    }

    Ok(())
}

fn build_schedule(
    waypoints: &[Waypoint],
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    timing: TimingPolicy,
) -> Vec<DateTime<Utc>> {
    let last = waypoints.len() - 1;

    // Index 0 and `last` are always anchors.
    let mut anchors: Vec<(usize, DateTime<Utc>)> = Vec::new();
    for (idx, wp) in waypoints.iter().enumerate() {
        match wp.time {
            Some(time) => anchors.push((idx, time)),
            None if idx == 0 => anchors.push((idx, start_time)),
            None if idx == last => anchors.push((idx, end_time)),
            None => {}
        }
    }

    let mut schedule = vec![start_time; waypoints.len()];
    for &(idx, time) in &anchors {
        schedule[idx] = time;
    }

    for pair in anchors.windows(2) {
        let (from, from_time) = pair[0];
        let (to, to_time) = pair[1];
        if to - from < 2 {
            continue;
        }
        let ratios = cumulative_ratios(&waypoints[from..=to], timing);
        for offset in 1..(to - from) {
            schedule[from + offset] = instant_at_ratio(from_time, to_time, ratios[offset]);
        }
    }

    schedule
}

/// Fraction of the span reached at each point of `points` (first 0, last 1).
fn cumulative_ratios(points: &[Waypoint], timing: TimingPolicy) -> Vec<f64> {
    let segments = points.len().saturating_sub(1).max(1);

    match timing {
        TimingPolicy::Uniform => (0..points.len())
            .map(|k| k as f64 / segments as f64)
            .collect(),
        TimingPolicy::DistanceProportional => {
            let lengths: Vec<f64> = points
                .windows(2)
                .map(|pair| pair[0].distance_to(&pair[1]))
                .collect();
            let total: f64 = lengths.iter().sum();
            if total <= f64::EPSILON {
                return cumulative_ratios(points, TimingPolicy::Uniform);
            }

            let mut covered = 0.0;
            let mut ratios = Vec::with_capacity(points.len());
            ratios.push(0.0);
            for length in lengths {
                covered += length;
                ratios.push(covered / total);
            }
            ratios
        }
    }
}
