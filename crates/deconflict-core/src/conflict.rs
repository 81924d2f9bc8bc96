//! Conflict detection between a primary trajectory and one other drone.
//!
//! Both trajectories are sampled on a shared time grid over their overlap
//! window; every sample closer than the safety buffer becomes a
//! [`ConflictRecord`]. Sampling can miss an approach that falls strictly
//! between two grid instants; [`closest_approach`] reports the exact minimum
//! for the same window but does not change the verdict.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DeconflictionConfig;
use crate::error::Result;
use crate::models::Position;
use crate::report::PairSummary;
use crate::spatial::{closest_to_origin, relative};
use crate::trajectory::{instant_at_ratio, span_nanos, Trajectory};

/// One sampled instant where two drones were closer than the safety buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub time: DateTime<Utc>,
    /// Primary drone position at `time`
    pub location: Position,
    /// Other drone position at `time`
    pub other_position: Position,
    /// Separation at `time`, always below the safety buffer
    pub distance: f64,
    pub primary_drone_id: String,
    pub other_drone_id: String,
}

impl ConflictRecord {
    /// `(primary, other)` drone ids.
    pub fn drone_ids(&self) -> (&str, &str) {
        (&self.primary_drone_id, &self.other_drone_id)
    }
}

/// Exact minimum separation over an overlap window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosestApproach {
    pub time: DateTime<Utc>,
    pub distance: f64,
    pub primary_position: Position,
    pub other_position: Position,
}

/// Separation between two drones at one grid instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeparationSample {
    pub time: DateTime<Utc>,
    pub distance: f64,
}

/// Outcome of checking the primary against one overlapping trajectory.
#[derive(Debug, Clone)]
pub struct PairCheck {
    pub summary: PairSummary,
    pub conflicts: Vec<ConflictRecord>,
}

/// Sample instants `start, start + step, ...` up to and including `end`.
///
/// Instants are computed as `start + k * step` so they never drift. When the
/// window is not a whole number of steps, `end` is appended as a final,
/// shorter step.
pub fn sample_instants(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
) -> impl Iterator<Item = DateTime<Utc>> {
    let total = span_nanos(end - start).max(0);
    let step = span_nanos(step).max(1);
    let full_steps = total / step;
    let tail = (total % step != 0).then_some(end);

    (0..=full_steps)
        .map(move |k| start + Duration::nanoseconds(k * step))
        .chain(tail)
}

/// Separation curve between two trajectories on the check's sample grid.
///
/// Empty when the mission windows do not overlap.
pub fn separation_profile(
    primary: &Trajectory,
    other: &Trajectory,
    config: &DeconflictionConfig,
) -> Result<Vec<SeparationSample>> {
    config.validate()?;
    let Some((start, end)) = primary.overlap(other) else {
        return Ok(Vec::new());
    };

    let mut profile = Vec::new();
    for time in sample_instants(start, end, config.sample_step()) {
        let distance = primary.position_at(time)?.distance_to(&other.position_at(time)?);
        profile.push(SeparationSample { time, distance });
    }
    Ok(profile)
}

/// Sample the overlap window of `primary` and `other` and collect every
/// separation violation.
///
/// Returns `None` when the windows do not overlap (no conflict possible).
pub fn check_pair(
    primary: &Trajectory,
    other: &Trajectory,
    config: &DeconflictionConfig,
) -> Result<Option<PairCheck>> {
    config.validate()?;
    let Some((overlap_start, overlap_end)) = primary.overlap(other) else {
        tracing::debug!(
            primary = primary.drone_id(),
            other = other.drone_id(),
            "No temporal overlap, skipping"
        );
        return Ok(None);
    };

    let buffer = config.safety_buffer_m;
    let mut conflicts = Vec::new();
    let mut samples = 0usize;
    let mut min_sampled_distance = f64::INFINITY;

    for time in sample_instants(overlap_start, overlap_end, config.sample_step()) {
        let location = primary.position_at(time)?;
        let other_position = other.position_at(time)?;
        let distance = location.distance_to(&other_position);

        samples += 1;
        min_sampled_distance = min_sampled_distance.min(distance);

        // Strict: a separation of exactly the buffer is allowed.
        if distance < buffer {
            tracing::trace!(%time, distance, other = other.drone_id(), "Separation violated");
            conflicts.push(ConflictRecord {
                time,
                location,
                other_position,
                distance,
                primary_drone_id: primary.drone_id().to_string(),
                other_drone_id: other.drone_id().to_string(),
            });
        }
    }

    let closest = closest_approach(primary, other)?;

    tracing::debug!(
        primary = primary.drone_id(),
        other = other.drone_id(),
        %overlap_start,
        %overlap_end,
        samples,
        conflicts = conflicts.len(),
        "Pair checked"
    );

    Ok(Some(PairCheck {
        summary: PairSummary {
            other_drone_id: other.drone_id().to_string(),
            overlap_start,
            overlap_end,
            samples,
            conflict_count: conflicts.len(),
            min_sampled_distance,
            closest_approach: closest,
        },
        conflicts,
    }))
}

/// Exact closest approach of two trajectories over their overlap window.
///
/// Both paths are piecewise linear in time, so their difference is too. The
/// window is split at every waypoint time of either trajectory and the
/// minimum is solved per piece. The result is never farther apart than any
/// sampled instant. `None` when the windows do not overlap.
pub fn closest_approach(primary: &Trajectory, other: &Trajectory) -> Result<Option<ClosestApproach>> {
    let Some((start, end)) = primary.overlap(other) else {
        return Ok(None);
    };

    let mut breaks: Vec<DateTime<Utc>> = primary
        .schedule()
        .iter()
        .chain(other.schedule())
        .copied()
        .filter(|&t| t > start && t < end)
        .collect();
    breaks.push(start);
    breaks.push(end);
    breaks.sort_unstable();
    breaks.dedup();

    let mut best: Option<(DateTime<Utc>, f64)> = None;
    let mut consider = |time: DateTime<Utc>, distance: f64| {
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((time, distance));
        }
    };

    for piece in breaks.windows(2) {
        let (a, b) = (piece[0], piece[1]);
        // Values just after `a` are exact; the value just before `b` is
        // extrapolated from the midpoint so a jump at `b` is not mixed in.
        let mid = a + (b - a) / 2;
        let rel_a = relative(other.position_at(a)?, primary.position_at(a)?);
        let rel_mid = relative(other.position_at(mid)?, primary.position_at(mid)?);
        let rel_b = lerp_unclamped(rel_a, rel_mid, 2.0);

        let (ratio, distance) = closest_to_origin(rel_a, rel_b);
        consider(instant_at_ratio(a, b, ratio), distance);
    }

    let rel_end = relative(other.position_at(end)?, primary.position_at(end)?);
    consider(end, rel_end.distance_to(&Position::new(0.0, 0.0, 0.0)));

    let Some((time, distance)) = best else {
        return Ok(None);
    };

    Ok(Some(ClosestApproach {
        time,
        distance,
        primary_position: primary.position_at(time)?,
        other_position: other.position_at(time)?,
    }))
}

fn lerp_unclamped(a: Position, b: Position, ratio: f64) -> Position {
    Position::new(
        a.x + (b.x - a.x) * ratio,
        a.y + (b.y - a.y) * ratio,
        a.z + (b.z - a.z) * ratio,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeconflictionError;
    use crate::models::Waypoint;
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 7, 10, 0, 0).unwrap()
    }

    fn at_secs(secs: i64) -> DateTime<Utc> {
        base() + Duration::seconds(secs)
    }

    fn line(id: &str, from: (f64, f64, f64), to: (f64, f64, f64), start: i64, end: i64) -> Trajectory {
        Trajectory::new(
            id,
            vec![Waypoint::new(from.0, from.1, from.2), Waypoint::new(to.0, to.1, to.2)],
            at_secs(start),
            at_secs(end),
        )
        .unwrap()
    }

    #[test]
    fn invalid_config_is_rejected_before_sampling() {
        let a = line("A", (0.0, 0.0, 10.0), (100.0, 0.0, 10.0), 0, 10);
        let twin = line("B", (0.0, 0.0, 10.0), (100.0, 0.0, 10.0), 0, 10);

        for config in [
            DeconflictionConfig::new(f64::NAN),
            DeconflictionConfig::new(-5.0),
            DeconflictionConfig::new(20.0).with_sample_interval_secs(f64::NAN),
            DeconflictionConfig::new(20.0).with_sample_interval_secs(0.0),
        ] {
            assert!(matches!(
                check_pair(&a, &twin, &config),
                Err(DeconflictionError::InvalidConfig(_))
            ));
            assert!(matches!(
                separation_profile(&a, &twin, &config),
                Err(DeconflictionError::InvalidConfig(_))
            ));
        }

        let check = check_pair(&a, &twin, &DeconflictionConfig::new(20.0)).unwrap().unwrap();
        assert_eq!(check.conflicts.len(), 11);
    }

    #[test]
    fn grid_includes_both_ends() {
        let grid: Vec<_> = sample_instants(base(), at_secs(3), Duration::seconds(1)).collect();
        assert_eq!(grid, vec![base(), at_secs(1), at_secs(2), at_secs(3)]);
    }

    #[test]
    fn grid_clamps_short_final_step() {
        let grid: Vec<_> = sample_instants(base(), at_secs(5), Duration::seconds(2)).collect();
        assert_eq!(grid, vec![base(), at_secs(2), at_secs(4), at_secs(5)]);
    }

    #[test]
    fn grid_has_no_drift_for_fractional_steps() {
        let step = Duration::milliseconds(100);
        let grid: Vec<_> = sample_instants(base(), at_secs(60), step).collect();
        assert_eq!(grid.len(), 601);
        assert_eq!(grid[600], at_secs(60));
        assert_eq!(grid[350], base() + Duration::milliseconds(35_000));
    }

    #[test]
    fn pair_without_overlap_is_skipped() {
        let config = DeconflictionConfig::new(1_000.0);
        let a = line("A", (0.0, 0.0, 0.0), (1.0, 0.0, 0.0), 0, 60);
        let b = line("B", (0.0, 0.0, 0.0), (1.0, 0.0, 0.0), 60, 120);
        assert!(check_pair(&a, &b, &config).unwrap().is_none());
        assert!(closest_approach(&a, &b).unwrap().is_none());
        assert!(separation_profile(&a, &b, &config).unwrap().is_empty());
    }

    #[test]
    fn conflicts_carry_primary_location() {
        let config = DeconflictionConfig::new(20.0);
        let a = line("A", (0.0, 0.0, 100.0), (100.0, 100.0, 100.0), 0, 600);
        let b = line("B", (0.0, 100.0, 100.0), (100.0, 0.0, 100.0), 0, 600);

        let check = check_pair(&a, &b, &config).unwrap().unwrap();
        assert_eq!(check.summary.samples, 601);
        assert!(!check.conflicts.is_empty());

        let crossing = check.conflicts.iter().find(|c| c.time == at_secs(300)).unwrap();
        assert!(crossing.distance < 1e-9);
        assert!((crossing.location.x - 50.0).abs() < 1e-9);
        assert_eq!(crossing.drone_ids(), ("A", "B"));
        for conflict in &check.conflicts {
            assert!(conflict.distance < 20.0);
            assert_eq!(conflict.location, a.position_at(conflict.time).unwrap());
        }
    }

    #[test]
    fn coarse_sampling_misses_brief_crossing() {
        // Closest approach at t = 30 s; a 60 s grid only sees t = 0 and 60.
        let config = DeconflictionConfig::new(5.0).with_sample_interval_secs(60.0);
        let a = line("A", (0.0, 0.0, 0.0), (600.0, 0.0, 0.0), 0, 60);
        let b = line("B", (300.0, -300.0, 0.0), (300.0, 300.0, 0.0), 0, 60);

        let check = check_pair(&a, &b, &config).unwrap().unwrap();
        assert!(check.conflicts.is_empty());
        assert_eq!(check.summary.samples, 2);

        let cpa = check.summary.closest_approach.unwrap();
        assert!(cpa.distance < 1e-6);
        assert_eq!(cpa.time, at_secs(30));
    }

    #[test]
    fn closest_approach_never_exceeds_sampled_minimum() {
        let config = DeconflictionConfig::new(1.0).with_sample_interval_secs(7.0);
        let a = Trajectory::new(
            "A",
            vec![
                Waypoint::new(0.0, 0.0, 50.0),
                Waypoint::new(80.0, 20.0, 60.0),
                Waypoint::new(120.0, 90.0, 40.0),
            ],
            at_secs(0),
            at_secs(200),
        )
        .unwrap();
        let b = Trajectory::new(
            "B",
            vec![
                Waypoint::new(100.0, 0.0, 55.0),
                Waypoint::new(40.0, 60.0, 45.0),
                Waypoint::new(0.0, 30.0, 50.0),
                Waypoint::new(10.0, 10.0, 50.0),
            ],
            at_secs(25),
            at_secs(260),
        )
        .unwrap();

        let check = check_pair(&a, &b, &config).unwrap().unwrap();
        let cpa = check.summary.closest_approach.unwrap();
        assert!(cpa.distance <= check.summary.min_sampled_distance + 1e-9);
        assert!(cpa.time >= at_secs(25) && cpa.time <= at_secs(200));
    }

    #[test]
    fn profile_matches_check_grid() {
        let config = DeconflictionConfig::new(10.0).with_sample_interval_secs(4.0);
        let a = line("A", (0.0, 0.0, 0.0), (10.0, 0.0, 0.0), 0, 10);
        let b = line("B", (0.0, 3.0, 4.0), (10.0, 3.0, 4.0), 0, 10);

        let profile = separation_profile(&a, &b, &config).unwrap();
        let times: Vec<_> = profile.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![at_secs(0), at_secs(4), at_secs(8), at_secs(10)]);
        assert!(profile.iter().all(|s| (s.distance - 5.0).abs() < 1e-9));
    }
}
