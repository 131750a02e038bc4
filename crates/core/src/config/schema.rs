//! Configuration schema definitions

use crate::error::{ErrorCode, Result};
use crate::validation::Validator;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub proximity: ProximityConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl ConfigSchema {
    /// Check every section, reporting all problems at once.
    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;
        Validator::new()
            .positive("proximity.range_meters", self.proximity.range_meters)
            .non_zero("proximity.staleness_secs", self.proximity.staleness_secs)
            .ordered(
                "simulation.response_delay_ms",
                sim.response_delay_min_ms,
                sim.response_delay_max_ms,
            )
            .range(
                "simulation.departure_probability",
                sim.departure_probability,
                0.0,
                1.0,
            )
            .positive("simulation.step_meters", sim.step_meters)
            .non_zero("simulation.tick_ms", sim.tick_ms)
            .required("telemetry.log_level", &self.telemetry.log_level)
            .validate()
            .into_result(ErrorCode::ConfigValidationError)
    }
}

/// Visibility and staleness settings for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityConfig {
    /// Maximum distance at which a peer is visible
    #[serde(default = "default_range_meters")]
    pub range_meters: f64,

    /// Seconds without a sighting before a peer is expired
    #[serde(default = "default_staleness_secs")]
    pub staleness_secs: u64,
}

impl ProximityConfig {
    /// Staleness as a [`Duration`]
    pub fn staleness(&self) -> Duration {
        Duration::from_secs(self.staleness_secs)
    }
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            range_meters: default_range_meters(),
            staleness_secs: default_staleness_secs(),
        }
    }
}

fn default_range_meters() -> f64 {
    5000.0
}

fn default_staleness_secs() -> u64 {
    120
}

/// Settings for the simulated collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of simulated drivers kept around the observer
    #[serde(default = "default_peer_count")]
    pub peer_count: usize,

    /// Seed for reproducible runs; random when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Lower bound of the canned-reply delay
    #[serde(default = "default_response_delay_min_ms")]
    pub response_delay_min_ms: u64,

    /// Upper bound of the canned-reply delay
    #[serde(default = "default_response_delay_max_ms")]
    pub response_delay_max_ms: u64,

    /// Chance per poll that a simulated driver leaves
    #[serde(default = "default_departure_probability")]
    pub departure_probability: f64,

    /// Distance moved per tick by the observer and each driver
    #[serde(default = "default_step_meters")]
    pub step_meters: f64,

    /// Simulated time per tick
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl SimulationConfig {
    /// Simulated time per tick as a [`Duration`]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            peer_count: default_peer_count(),
            seed: None,
            response_delay_min_ms: default_response_delay_min_ms(),
            response_delay_max_ms: default_response_delay_max_ms(),
            departure_probability: default_departure_probability(),
            step_meters: default_step_meters(),
            tick_ms: default_tick_ms(),
        }
    }
}

fn default_peer_count() -> usize {
    5
}

fn default_response_delay_min_ms() -> u64 {
    2000
}

fn default_response_delay_max_ms() -> u64 {
    5000
}

fn default_departure_probability() -> f64 {
    0.02
}

fn default_step_meters() -> f64 {
    25.0
}

fn default_tick_ms() -> u64 {
    1000
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySettings {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let schema = ConfigSchema::default();
        assert_eq!(schema.proximity.range_meters, 5000.0);
        assert_eq!(schema.proximity.staleness(), Duration::from_secs(120));
        assert_eq!(schema.simulation.peer_count, 5);
        assert_eq!(schema.simulation.tick(), Duration::from_secs(1));
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let schema: ConfigSchema = toml::from_str(
            r#"
            [proximity]
            range_meters = 2500.0
            "#,
        )
        .unwrap();

        assert_eq!(schema.proximity.range_meters, 2500.0);
        assert_eq!(schema.proximity.staleness_secs, 120);
        assert_eq!(schema.telemetry.log_level, "info");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut schema = ConfigSchema::default();
        schema.proximity.range_meters = 0.0;
        schema.simulation.response_delay_min_ms = 9000;

        let err = schema.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigValidationError);
        assert!(err.message.contains("proximity.range_meters"));
        assert!(err.message.contains("simulation.response_delay_ms"));
    }

    #[test]
    fn test_nan_departure_probability_rejected() {
        let err = crate::config::Config::from_toml("[simulation]\ndeparture_probability = nan")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigValidationError);
        assert!(err.message.contains("simulation.departure_probability"));
    }
}
