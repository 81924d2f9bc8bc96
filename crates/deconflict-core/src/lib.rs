//! Spatial-temporal deconfliction for planned drone missions.
//!
//! Build a [`Trajectory`] per drone, register the other drones with a
//! [`DeconflictionService`], then check the primary mission to get a
//! [`SafetyReport`].

pub mod config;
pub mod conflict;
pub mod error;
pub mod models;
pub mod report;
pub mod service;
pub mod spatial;
pub mod trajectory;

pub use config::{DeconflictionConfig, DEFAULT_SAMPLE_INTERVAL_S};
pub use conflict::{
    check_pair, closest_approach, sample_instants, separation_profile, ClosestApproach,
    ConflictRecord, PairCheck, SeparationSample,
};
pub use error::{DeconflictionError, Result};
pub use models::{Position, TimingPolicy, TrajectoryPlan, Waypoint};
pub use report::{MissionStatus, PairSummary, SafetyReport};
pub use service::DeconflictionService;
pub use spatial::euclidean_distance;
pub use trajectory::Trajectory;
