//! Deconfliction service: registry of other drones' trajectories and the
//! mission safety check.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::task::JoinSet;

use crate::config::DeconflictionConfig;
use crate::conflict::{check_pair, separation_profile, PairCheck, SeparationSample};
use crate::error::{DeconflictionError, Result};
use crate::report::SafetyReport;
use crate::trajectory::Trajectory;

/// Sole authority for "other" trajectories during one session.
///
/// Registration takes the write lock. A check clones a snapshot of the
/// registry under the read lock and then runs without holding it, so a
/// check always sees the registry as of one instant.
pub struct DeconflictionService {
    config: DeconflictionConfig,
    registry: RwLock<HashMap<String, Arc<Trajectory>>>,
}

impl DeconflictionService {
    /// Create a service with the default sampling resolution.
    pub fn new(safety_buffer_m: f64) -> Result<Self> {
        Self::with_config(DeconflictionConfig::new(safety_buffer_m))
    }

    pub fn with_config(config: DeconflictionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &DeconflictionConfig {
        &self.config
    }

    pub fn safety_buffer_m(&self) -> f64 {
        self.config.safety_buffer_m
    }

    /// Register (or replace) a drone's trajectory.
    ///
    /// The last registration for a drone id wins; the replaced trajectory is
    /// returned.
    pub fn register_trajectory(&self, trajectory: impl Into<Arc<Trajectory>>) -> Option<Arc<Trajectory>> {
        let trajectory = trajectory.into();
        let drone_id = trajectory.drone_id().to_string();
        let previous = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(drone_id.clone(), trajectory);

        if previous.is_some() {
            tracing::debug!(drone_id = %drone_id, "Replaced registered trajectory");
        } else {
            tracing::debug!(drone_id = %drone_id, "Registered trajectory");
        }
        previous
    }

    /// Remove a drone from the registry.
    pub fn unregister_trajectory(&self, drone_id: &str) -> Option<Arc<Trajectory>> {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(drone_id)
    }

    pub fn get(&self, drone_id: &str) -> Option<Arc<Trajectory>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(drone_id)
            .cloned()
    }

    /// Registered drone ids, sorted.
    pub fn registered_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Registered trajectories other than the primary's own, sorted by id.
    fn snapshot_excluding(&self, primary_id: &str) -> Vec<Arc<Trajectory>> {
        let mut others: Vec<Arc<Trajectory>> = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|t| t.drone_id() != primary_id)
            .cloned()
            .collect();
        others.sort_by(|a, b| a.drone_id().cmp(b.drone_id()));
        others
    }

    /// Check a primary mission against every registered trajectory.
    ///
    /// A registered trajectory with the primary's own drone id is ignored.
    /// Either returns the complete verdict or fails; never a partial list.
    pub fn check_mission_safety(&self, primary: &Trajectory) -> Result<SafetyReport> {
        let others = self.snapshot_excluding(primary.drone_id());

        let mut checks = Vec::with_capacity(others.len());
        for other in &others {
            if let Some(check) = check_pair(primary, other, &self.config)? {
                checks.push(check);
            }
        }

        Ok(self.finish(primary, others.len(), checks))
    }

    /// Same as [`Self::check_mission_safety`], with one blocking task per
    /// registered trajectory. The report is identical.
    pub async fn check_mission_safety_concurrent(&self, primary: Arc<Trajectory>) -> Result<SafetyReport> {
        let others = self.snapshot_excluding(primary.drone_id());
        let considered = others.len();

        let mut tasks = JoinSet::new();
        for other in others {
            let primary = Arc::clone(&primary);
            let config = self.config.clone();
            tasks.spawn_blocking(move || check_pair(&primary, &other, &config));
        }

        let mut checks = Vec::with_capacity(considered);
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(|e| DeconflictionError::Join(e.to_string()))?;
            if let Some(check) = outcome? {
                checks.push(check);
            }
        }

        Ok(self.finish(&primary, considered, checks))
    }

    /// Distance-over-time between the primary and one registered drone on
    /// the check's sample grid. `None` if the drone is not registered.
    pub fn separation_profile(
        &self,
        primary: &Trajectory,
        other_drone_id: &str,
    ) -> Result<Option<Vec<SeparationSample>>> {
        let Some(other) = self.get(other_drone_id) else {
            return Ok(None);
        };
        separation_profile(primary, &other, &self.config).map(Some)
    }

    fn finish(&self, primary: &Trajectory, considered: usize, checks: Vec<PairCheck>) -> SafetyReport {
        let report =
            SafetyReport::from_pair_checks(primary.drone_id(), self.config.safety_buffer_m, checks);

        for pair in report.pairs.iter().filter(|p| p.conflict_count > 0) {
            tracing::warn!(
                primary = %report.primary_drone_id,
                other = %pair.other_drone_id,
                conflicts = pair.conflict_count,
                min_distance_m = pair.min_sampled_distance,
                "Separation conflict"
            );
        }
        tracing::info!(
            primary = %report.primary_drone_id,
            registered = considered,
            overlapping = report.pairs.len(),
            conflicts = report.conflicts.len(),
            status = %report.status,
            "Mission safety checked"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Waypoint;
    use crate::report::MissionStatus;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 7, 10, 0, 0).unwrap()
    }

    fn straight(id: &str, y: f64) -> Trajectory {
        Trajectory::new(
            id,
            vec![Waypoint::new(0.0, y, 100.0), Waypoint::new(100.0, y, 100.0)],
            base(),
            base() + Duration::minutes(10),
        )
        .unwrap()
    }

    #[test]
    fn rejects_invalid_buffer() {
        assert!(matches!(
            DeconflictionService::new(0.0),
            Err(DeconflictionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn re_registration_overwrites() {
        let service = DeconflictionService::new(20.0).unwrap();
        assert!(service.register_trajectory(straight("other", 5.0)).is_none());

        let replaced = service.register_trajectory(straight("other", 500.0)).unwrap();
        assert_eq!(replaced.waypoints()[0].y, 5.0);
        assert_eq!(service.len(), 1);

        // Only the latest plan is checked.
        let report = service.check_mission_safety(&straight("primary", 0.0)).unwrap();
        assert_eq!(report.status, MissionStatus::Clear);
    }

    #[test]
    fn primary_is_not_checked_against_itself() {
        let service = DeconflictionService::new(20.0).unwrap();
        service.register_trajectory(straight("primary", 0.0));

        let report = service.check_mission_safety(&straight("primary", 0.0)).unwrap();
        assert!(report.is_clear());
        assert!(report.pairs.is_empty());
    }

    #[test]
    fn registry_management() {
        let service = DeconflictionService::new(20.0).unwrap();
        assert!(service.is_empty());
        service.register_trajectory(straight("b", 0.0));
        service.register_trajectory(straight("a", 0.0));
        assert_eq!(service.registered_ids(), vec!["a".to_string(), "b".to_string()]);
        assert!(service.get("a").is_some());

        assert!(service.unregister_trajectory("a").is_some());
        assert!(service.unregister_trajectory("a").is_none());
        assert_eq!(service.len(), 1);

        service.clear();
        assert!(service.is_empty());
    }

    #[test]
    fn profile_for_unknown_drone_is_none() {
        let service = DeconflictionService::new(20.0).unwrap();
        assert!(service.separation_profile(&straight("p", 0.0), "ghost").unwrap().is_none());

        service.register_trajectory(straight("o", 30.0));
        let profile = service.separation_profile(&straight("p", 0.0), "o").unwrap().unwrap();
        assert_eq!(profile.len(), 601);
        assert!(profile.iter().all(|s| (s.distance - 30.0).abs() < 1e-9));
    }
}
