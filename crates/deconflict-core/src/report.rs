//! Mission safety verdicts returned to callers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::{ClosestApproach, ConflictRecord, PairCheck};

/// Overall verdict of a mission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionStatus {
    #[serde(rename = "clear")]
    Clear,
    #[serde(rename = "conflict detected")]
    ConflictDetected,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStatus::Clear => "clear",
            MissionStatus::ConflictDetected => "conflict detected",
        }
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-drone breakdown of a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSummary {
    pub other_drone_id: String,
    pub overlap_start: DateTime<Utc>,
    pub overlap_end: DateTime<Utc>,
    /// Number of sampled instants
    pub samples: usize,
    pub conflict_count: usize,
    pub min_sampled_distance: f64,
    /// Exact minimum separation in the overlap window (informational)
    pub closest_approach: Option<ClosestApproach>,
}

/// Result of checking one primary mission against the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub primary_drone_id: String,
    pub safety_buffer_m: f64,
    pub status: MissionStatus,
    /// Ordered by time, then by the other drone's id
    pub conflicts: Vec<ConflictRecord>,
    /// One entry per time-overlapping registered drone, ordered by id
    pub pairs: Vec<PairSummary>,
}

impl SafetyReport {
    /// Merge per-pair results into a single deterministic report.
    pub fn from_pair_checks(
        primary_drone_id: impl Into<String>,
        safety_buffer_m: f64,
        checks: Vec<PairCheck>,
    ) -> Self {
        let mut pairs = Vec::with_capacity(checks.len());
        let mut conflicts = Vec::new();
        for check in checks {
            pairs.push(check.summary);
            conflicts.extend(check.conflicts);
        }

        pairs.sort_by(|a, b| a.other_drone_id.cmp(&b.other_drone_id));
        conflicts.sort_by(|a, b| {
            a.time
                .cmp(&b.time)
                .then_with(|| a.other_drone_id.cmp(&b.other_drone_id))
        });

        let status = if conflicts.is_empty() {
            MissionStatus::Clear
        } else {
            MissionStatus::ConflictDetected
        };

        Self {
            primary_drone_id: primary_drone_id.into(),
            safety_buffer_m,
            status,
            conflicts,
            pairs,
        }
    }

    pub fn is_clear(&self) -> bool {
        self.status == MissionStatus::Clear
    }

    /// Conflicts involving the given other drone.
    pub fn conflicts_with<'a>(&'a self, drone_id: &'a str) -> impl Iterator<Item = &'a ConflictRecord> {
        self.conflicts
            .iter()
            .filter(move |c| c.other_drone_id == drone_id)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Console summary listing at most `limit` conflicts.
    pub fn summary(&self, limit: usize) -> String {
        let mut out = format!(
            "Mission safety status: {}\nNumber of conflicts: {}\nSafety buffer: {} meters\n",
            self.status,
            self.conflicts.len(),
            self.safety_buffer_m
        );

        for (i, conflict) in self.conflicts.iter().take(limit).enumerate() {
            out.push_str(&format!(
                "Conflict {}:\n  Time: {}\n  Location: {}\n  Distance: {:.2} m\n  Between: {} and {}\n",
                i + 1,
                conflict.time.format("%H:%M:%S"),
                conflict.location,
                conflict.distance,
                conflict.primary_drone_id,
                conflict.other_drone_id
            ));
        }

        let hidden = self.conflicts.len().saturating_sub(limit);
        if hidden > 0 {
            out.push_str(&format!("... {hidden} more\n"));
        }
        out
    }
}

impl fmt::Display for SafetyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary(self.conflicts.len()))
    }
}
