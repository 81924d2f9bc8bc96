//! Error types for trajectory construction and mission checks.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by the deconfliction core.
///
/// Trajectory problems surface at construction time. A check only fails
/// when a precondition is broken or a worker task dies; it never returns a
/// partial conflict list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeconflictionError {
    /// Trajectory rejected at construction (no waypoints, inverted window,
    /// out-of-order waypoint times, ...).
    #[error("invalid trajectory for drone '{drone_id}': {reason}")]
    InvalidTrajectory { drone_id: String, reason: String },

    /// Position requested outside the trajectory's mission window.
    #[error("time {time} is outside the mission window [{start}, {end}] of drone '{drone_id}'")]
    OutOfRange {
        drone_id: String,
        time: DateTime<Utc>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Service or sampling configuration rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A concurrent pair check panicked or was cancelled.
    #[error("pair check task failed: {0}")]
    Join(String),
}

impl DeconflictionError {
    pub fn invalid_trajectory(drone_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTrajectory {
            drone_id: drone_id.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, DeconflictionError>;
