//! Separation and sampling settings for a deconfliction session.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{DeconflictionError, Result};

/// Default sampling resolution in seconds.
pub const DEFAULT_SAMPLE_INTERVAL_S: f64 = 1.0;

/// Configuration for the deconfliction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeconflictionConfig {
    /// Minimum allowed 3D separation in meters
    pub safety_buffer_m: f64,
    /// Sampling resolution (Δt) in seconds. Smaller is more precise and slower.
    #[serde(default = "default_sample_interval")]
    pub sample_interval_s: f64,
}

fn default_sample_interval() -> f64 {
    DEFAULT_SAMPLE_INTERVAL_S
}

impl DeconflictionConfig {
    pub fn new(safety_buffer_m: f64) -> Self {
        Self {
            safety_buffer_m,
            sample_interval_s: DEFAULT_SAMPLE_INTERVAL_S,
        }
    }

    /// Override the sampling resolution.
    pub fn with_sample_interval_secs(mut self, seconds: f64) -> Self {
        self.sample_interval_s = seconds;
        self
    }

    pub fn with_safety_buffer(mut self, meters: f64) -> Self {
        self.safety_buffer_m = meters;
        self
    }

    /// Sampling step as a time span, at least one nanosecond.
    pub fn sample_step(&self) -> Duration {
        let nanos = (self.sample_interval_s * 1e9).round();
        Duration::nanoseconds((nanos as i64).max(1))
    }

    /// Check the configuration before it is used by a service.
    pub fn validate(&self) -> Result<()> {
        if !self.safety_buffer_m.is_finite() || self.safety_buffer_m <= 0.0 {
            return Err(DeconflictionError::invalid_config(format!(
                "safety buffer must be a positive distance, got {}",
                self.safety_buffer_m
            )));
        }
        if !self.sample_interval_s.is_finite() || self.sample_interval_s < 1e-9 {
            return Err(DeconflictionError::invalid_config(format!(
                "sample interval must be at least one nanosecond, got {}s",
                self.sample_interval_s
            )));
        }
        Ok(())
    }
}
