use crate::config::AirframeConfig;
use crate::pose::NUM_ROTORS;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use std::f32::consts::FRAC_1_SQRT_2;

/// Geometry of a quadcopter in X configuration
/// Rotors are ordered M1 front-right, M2 back-right, M3 back-left, M4 front-left,
/// with x pointing forward and y to the left.
#[derive(Clone, Debug, PartialEq)]
pub struct Airframe {
    /// Distance from the body origin to each rotor hub in m
    pub arm_length: f32,
    /// Propeller radius in m
    pub rotor_radius: f32,
    /// Height of the rotor plane above the body origin in m
    pub rotor_height: f32,
    /// Half extents of the central body box in m
    pub body_half_sizes: Vector3<f32>,
}

impl Default for Airframe {
    /// Crazyflie 2.x dimensions
    fn default() -> Self {
        Self {
            arm_length: 0.046,
            rotor_radius: 0.0235,
            rotor_height: 0.01,
            body_half_sizes: Vector3::new(0.015, 0.015, 0.005),
        }
    }
}

impl From<&AirframeConfig> for Airframe {
    fn from(config: &AirframeConfig) -> Self {
        Self {
            arm_length: config.arm_length,
            rotor_radius: config.rotor_radius,
            rotor_height: config.rotor_height,
            body_half_sizes: Vector3::from(config.body_half_sizes),
        }
    }
}

impl Airframe {
    /// Rotor hub positions in the body frame
    /// # Example
    /// ```
    /// use crazyflie_sim::Airframe;
    /// let airframe = Airframe::default();
    /// let mounts = airframe.rotor_mounts();
    /// assert!(mounts[0].x > 0.0 && mounts[0].y < 0.0);
    /// ```
    pub fn rotor_mounts(&self) -> [Vector3<f32>; NUM_ROTORS] {
        let d = self.arm_length * FRAC_1_SQRT_2;
        let h = self.rotor_height;
        [
            Vector3::new(d, -d, h),
            Vector3::new(-d, -d, h),
            Vector3::new(-d, d, h),
            Vector3::new(d, d, h),
        ]
    }
    /// Pose of each rotor relative to the body: `Translate(mount) * Rz(angle)`
    /// # Arguments
    /// * `prop_angles` - Spin angle of each rotor
    /// # Returns
    /// * One isometry per rotor, ordered M1..M4
    pub fn rotor_local_transforms(
        &self,
        prop_angles: &[f32; NUM_ROTORS],
    ) -> [Isometry3<f32>; NUM_ROTORS] {
        let mounts = self.rotor_mounts();
        std::array::from_fn(|i| {
            Isometry3::from_parts(
                Translation3::from(mounts[i]),
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), prop_angles[i]),
            )
        })
    }
}
