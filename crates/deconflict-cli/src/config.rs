//! Runner configuration from environment.

use std::env;

use deconflict_core::{DeconflictionConfig, DEFAULT_SAMPLE_INTERVAL_S};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Replaces every scenario's own buffer when set
    pub safety_buffer_override_m: Option<f64>,
    pub sample_interval_s: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            safety_buffer_override_m: None,
            sample_interval_s: DEFAULT_SAMPLE_INTERVAL_S,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            safety_buffer_override_m: env::var("DECONFLICT_SAFETY_BUFFER_M")
                .ok()
                .and_then(|s| s.parse().ok()),
            sample_interval_s: env::var("DECONFLICT_SAMPLE_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .map(|ms| ms / 1000.0)
                .unwrap_or(DEFAULT_SAMPLE_INTERVAL_S),
        }
    }

    /// Apply command line overrides on top of the environment.
    pub fn with_overrides(mut self, safety_buffer_m: Option<f64>, sample_interval_ms: Option<f64>) -> Self {
        if safety_buffer_m.is_some() {
            self.safety_buffer_override_m = safety_buffer_m;
        }
        if let Some(ms) = sample_interval_ms {
            self.sample_interval_s = ms / 1000.0;
        }
        self
    }

    /// Service configuration for a check whose own buffer is `default_buffer_m`.
    pub fn deconfliction(&self, default_buffer_m: f64) -> DeconflictionConfig {
        DeconflictionConfig::new(self.safety_buffer_override_m.unwrap_or(default_buffer_m))
            .with_sample_interval_secs(self.sample_interval_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_defaults() {
        let config = Config::default().with_overrides(Some(42.0), Some(250.0));
        let service_config = config.deconfliction(20.0);
        assert_eq!(service_config.safety_buffer_m, 42.0);
        assert_eq!(service_config.sample_interval_s, 0.25);
    }

    #[test]
    fn scenario_buffer_used_without_override() {
        let config = Config::default().with_overrides(None, None);
        assert_eq!(config.deconfliction(30.0).safety_buffer_m, 30.0);
        assert_eq!(config.deconfliction(30.0).sample_interval_s, DEFAULT_SAMPLE_INTERVAL_S);
    }
}
