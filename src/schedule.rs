use crate::config::{ScheduleConfig, ScheduleStep};
use crate::crazyflie::CrazyflieSim;
use crate::pose::{EulerAngles, PropAngles, NUM_ROTORS};
use crate::CrazyflieError;

use nalgebra::Vector3;

/// A single edit applied to the Crazyflie by a schedule
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    SetRoll(f32),
    SetPitch(f32),
    SetYaw(f32),
    SetAttitude(EulerAngles),
    SetPosition(Vector3<f32>),
    SetPropAngles(PropAngles),
    /// Advance the rotors by `rates * dt`
    SpinProps {
        rates: [f32; NUM_ROTORS],
        dt: f32,
    },
    Undo,
    ClearHistory,
}

impl Action {
    /// Applies the action to `sim`
    /// # Errors
    /// * Propagates the setter error if the value is rejected
    pub fn apply(&self, sim: &mut CrazyflieSim) -> Result<(), CrazyflieError> {
        match self {
            Action::SetRoll(roll) => sim.set_roll(*roll),
            Action::SetPitch(pitch) => sim.set_pitch(*pitch),
            Action::SetYaw(yaw) => sim.set_yaw(*yaw),
            Action::SetAttitude(attitude) => sim.set_attitude(*attitude),
            Action::SetPosition(position) => sim.set_position(*position),
            Action::SetPropAngles(prop_angles) => sim.set_prop_angles(*prop_angles),
            Action::SpinProps { rates, dt } => sim.spin_props(rates, *dt),
            Action::Undo => {
                if !sim.undo() {
                    log::warn!("Undo requested with empty history, ignored");
                }
                Ok(())
            }
            Action::ClearHistory => {
                sim.clear_history();
                Ok(())
            }
        }
    }
    /// Parses an action from a schedule step
    /// # Errors
    /// * Returns `ScheduleError` for unknown actions or missing parameters
    /// # Example
    /// ```
    /// use crazyflie_sim::config::ScheduleStep;
    /// use crazyflie_sim::Action;
    /// let step: ScheduleStep =
    ///     serde_yaml::from_str("{step: 0, action: SetYaw, params: {yaw: 0.5}}").unwrap();
    /// assert_eq!(Action::from_step(&step).unwrap(), Action::SetYaw(0.5));
    /// ```
    pub fn from_step(step: &ScheduleStep) -> Result<Self, CrazyflieError> {
        let params = &step.params;
        match step.action.as_str() {
            "SetRoll" => Ok(Action::SetRoll(parse_f32(params, "roll")?)),
            "SetPitch" => Ok(Action::SetPitch(parse_f32(params, "pitch")?)),
            "SetYaw" => Ok(Action::SetYaw(parse_f32(params, "yaw")?)),
            "SetAttitude" => Ok(Action::SetAttitude(EulerAngles::new(
                parse_f32(params, "roll")?,
                parse_f32(params, "pitch")?,
                parse_f32(params, "yaw")?,
            ))),
            "SetPosition" => Ok(Action::SetPosition(parse_vector3(params, "position")?)),
            "SetPropAngles" => Ok(Action::SetPropAngles(PropAngles(parse_array4(
                params, "angles",
            )?))),
            "SpinProps" => Ok(Action::SpinProps {
                rates: parse_array4(params, "rates")?,
                dt: parse_f32(params, "dt")?,
            }),
            "Undo" => Ok(Action::Undo),
            "ClearHistory" => Ok(Action::ClearHistory),
            _ => Err(CrazyflieError::ScheduleError(format!(
                "Unknown action: {}",
                step.action
            ))),
        }
    }
}

/// Actions keyed by the simulation step they fire at
#[derive(Clone, Debug, Default)]
pub struct Schedule {
    steps: Vec<(usize, String, Action)>,
}

impl Schedule {
    /// Parses every step of the schedule configuration
    /// # Errors
    /// * Returns `ScheduleError` on the first step that fails to parse
    pub fn from_config(config: &ScheduleConfig) -> Result<Self, CrazyflieError> {
        let mut steps = config
            .steps
            .iter()
            .map(|s| Ok((s.step, s.action.clone(), Action::from_step(s)?)))
            .collect::<Result<Vec<_>, CrazyflieError>>()?;
        // Stable, so actions sharing a step keep their file order
        steps.sort_by_key(|(step, _, _)| *step);
        Ok(Self { steps })
    }
    pub fn len(&self) -> usize {
        self.steps.len()
    }
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
    /// Last step that carries an action
    pub fn last_step(&self) -> Option<usize> {
        self.steps.last().map(|(step, _, _)| *step)
    }
    /// Applies every action scheduled at `step`
    /// # Arguments
    /// * `sim` - The Crazyflie to edit
    /// * `step` - The current simulation step
    /// * `time` - The current simulation time, used for logging
    /// # Returns
    /// * Number of actions applied
    /// # Errors
    /// * Propagates the first rejected action
    pub fn apply_step(
        &self,
        sim: &mut CrazyflieSim,
        step: usize,
        time: f32,
    ) -> Result<usize, CrazyflieError> {
        let mut applied = 0;
        for (_, name, action) in self.steps.iter().filter(|(s, _, _)| *s == step) {
            log::info!("Time: {:.2} s,\tApply {}", time, name);
            action.apply(sim)?;
            applied += 1;
        }
        Ok(applied)
    }
}
// Helper function to parse Vector3 from YAML
// # Arguments
// * `value` - YAML value
// * `key` - key to parse
// # Returns
// * `Vector3<f32>` - parsed vector
// # Errors
// * `CrazyflieError` - if the value is not a valid vector
pub fn parse_vector3(
    value: &serde_yaml::Value,
    key: &str,
) -> Result<Vector3<f32>, CrazyflieError> {
    parse_fixed::<3>(value, key).map(Vector3::from)
}
// Helper function to parse four rotor values from YAML
pub fn parse_array4(
    value: &serde_yaml::Value,
    key: &str,
) -> Result<[f32; NUM_ROTORS], CrazyflieError> {
    parse_fixed::<NUM_ROTORS>(value, key)
}
fn parse_fixed<const N: usize>(
    value: &serde_yaml::Value,
    key: &str,
) -> Result<[f32; N], CrazyflieError> {
    value[key]
        .as_sequence()
        .filter(|seq| seq.len() == N)
        .and_then(|seq| {
            let mut out = [0.0; N];
            for (slot, v) in out.iter_mut().zip(seq) {
                *slot = v.as_f64()? as f32;
            }
            Some(out)
        })
        .ok_or_else(|| CrazyflieError::ScheduleError(format!("Invalid {} vector", key)))
}
// Helper function to parse f32 from YAML
// # Arguments
// * `value` - YAML value
// * `key` - key to parse
// # Returns
// * `f32` - parsed value
// # Errors
// * `CrazyflieError` - if the value is not a valid f32
pub fn parse_f32(value: &serde_yaml::Value, key: &str) -> Result<f32, CrazyflieError> {
    value[key]
        .as_f64()
        .map(|v| v as f32)
        .ok_or_else(|| CrazyflieError::ScheduleError(format!("Invalid {}", key)))
}
