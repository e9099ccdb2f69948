use crate::CrazyflieError;

use serde::Deserialize;
use serde_yaml::Value;
use std::fs::File;
use std::io::Read;

/// Demo configuration loaded from YAML
#[derive(Deserialize)]
pub struct Config {
    /// Stepping and logging rates
    pub simulation: SimulationConfig,
    /// Undo history settings
    pub history: HistoryConfig,
    /// Crazyflie geometry
    pub airframe: AirframeConfig,
    /// Actions to apply at given steps
    pub schedule: ScheduleConfig,
}

#[derive(Deserialize)]
pub struct SimulationConfig {
    /// Stepping frequency in Hz
    pub frequency: f32,
    /// Rate at which state is sent to rerun in Hz
    pub log_frequency: f32,
    /// Length of the run in s
    pub duration: f32,
    /// Spawn a rerun viewer
    pub use_rerun: bool,
}

#[derive(Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of undo snapshots
    pub capacity: usize,
}

/// Dimensions in m, see `Airframe`
#[derive(Deserialize)]
pub struct AirframeConfig {
    pub arm_length: f32,
    pub rotor_radius: f32,
    pub rotor_height: f32,
    pub body_half_sizes: [f32; 3],
}

#[derive(Deserialize, Default)]
pub struct ScheduleConfig {
    pub steps: Vec<ScheduleStep>,
}

/// One scheduled action, e.g. `{step: 100, action: SetRoll, params: {roll: 0.5}}`
#[derive(Deserialize)]
pub struct ScheduleStep {
    /// Simulation step the action runs at
    pub step: usize,
    /// Action name, see `Action::from_step`
    pub action: String,
    /// Action parameters, null when omitted
    #[serde(default)]
    pub params: Value,
}

impl Config {
    /// Load configuration from a YAML file.
    /// # Arguments
    /// * `filename` - The name of the file to load.
    /// # Errors
    /// * Returns `IoError` if the file cannot be read
    /// * Returns `ConfigError` if the YAML does not match the expected layout
    /// * Returns `InvalidConfig` if a rate or length is out of range
    pub fn from_yaml(filename: &str) -> Result<Self, CrazyflieError> {
        let mut contents = String::new();
        File::open(filename)?.read_to_string(&mut contents)?;
        Self::parse(&contents)
    }
    fn parse(contents: &str) -> Result<Self, CrazyflieError> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }
    fn validate(&self) -> Result<(), CrazyflieError> {
        let sim = &self.simulation;
        for (name, value) in [
            ("simulation.frequency", sim.frequency),
            ("simulation.log_frequency", sim.log_frequency),
            ("airframe.arm_length", self.airframe.arm_length),
            ("airframe.rotor_radius", self.airframe.rotor_radius),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CrazyflieError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !(sim.duration.is_finite() && sim.duration >= 0.0) {
            return Err(CrazyflieError::InvalidConfig(format!(
                "simulation.duration must be non-negative, got {}",
                sim.duration
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/crazyflie.yaml");
        let config = Config::from_yaml(path).unwrap();
        assert!(config.simulation.frequency > 0.0);
        assert!(config.history.capacity > 0);
        assert!(!config.schedule.steps.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            Config::from_yaml("does/not/exist.yaml"),
            Err(CrazyflieError::IoError(_))
        ));
    }

    const VALID: &str = "
simulation:
  frequency: 100.0
  log_frequency: 50.0
  duration: 1.0
  use_rerun: false
history:
  capacity: 8
airframe:
  arm_length: 0.046
  rotor_radius: 0.0235
  rotor_height: 0.01
  body_half_sizes: [0.015, 0.015, 0.005]
schedule:
  steps: []
";

    #[test]
    fn inline_config_parses() {
        let config = Config::parse(VALID).unwrap();
        assert_eq!(config.history.capacity, 8);
        assert!(config.schedule.steps.is_empty());
    }

    #[test]
    fn non_positive_rates_are_rejected() {
        for (field, bad) in [
            ("frequency: 100.0", "frequency: 0.0"),
            ("log_frequency: 50.0", "log_frequency: -5.0"),
            ("log_frequency: 50.0", "log_frequency: .nan"),
            ("duration: 1.0", "duration: -1.0"),
            ("arm_length: 0.046", "arm_length: 0.0"),
        ] {
            let contents = VALID.replace(field, bad);
            assert!(
                matches!(
                    Config::parse(&contents),
                    Err(CrazyflieError::InvalidConfig(_))
                ),
                "accepted '{}'",
                bad
            );
        }
    }

    #[test]
    fn params_default_to_null() {
        let step: ScheduleStep = serde_yaml::from_str("step: 3\naction: Undo").unwrap();
        assert_eq!(step.step, 3);
        assert!(step.params.is_null());
    }
}
