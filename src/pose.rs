use crate::CrazyflieError;

use nalgebra::{
    Isometry3, Matrix3, Matrix4, Rotation3, RowVector4, Translation3, UnitQuaternion, Vector3,
};
use std::f32::consts::{FRAC_PI_2, PI};

/// Number of rotors on the airframe
pub const NUM_ROTORS: usize = 4;
/// Below this value of cos(pitch) roll and yaw are no longer separable
pub const GIMBAL_LOCK_TOLERANCE: f32 = 1e-6;
/// Tolerance used when checking that a matrix is a proper rotation
pub const ROTATION_TOLERANCE: f32 = 1e-4;

/// Wraps an angle into (-pi, pi]
/// Angles already in range are returned unchanged.
/// # Example
/// ```
/// use crazyflie_sim::pose::wrap_angle;
/// use std::f32::consts::PI;
/// assert!((wrap_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-6);
/// assert_eq!(wrap_angle(0.25), 0.25);
/// ```
pub fn wrap_angle(angle: f32) -> f32 {
    if angle > -PI && angle <= PI {
        return angle;
    }
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}
/// Checks that `rotation` is orthonormal with a positive determinant
/// # Errors
/// * Returns `InvalidPose` if the matrix is not a proper rotation
pub fn validate_rotation(rotation: &Matrix3<f32>) -> Result<(), CrazyflieError> {
    let orthonormality_error = (rotation.transpose() * rotation - Matrix3::identity()).norm();
    if !(orthonormality_error <= ROTATION_TOLERANCE) {
        return Err(CrazyflieError::InvalidPose(format!(
            "rotation block is not orthonormal (error {})",
            orthonormality_error
        )));
    }
    if rotation.determinant() <= 0.0 {
        return Err(CrazyflieError::InvalidPose(
            "rotation block is a reflection".to_string(),
        ));
    }
    Ok(())
}
/// Roll, pitch and yaw in radians, ZYX convention
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EulerAngles {
    /// Rotation about the body x axis
    pub roll: f32,
    /// Rotation about the body y axis
    pub pitch: f32,
    /// Rotation about the body z axis
    pub yaw: f32,
}

impl EulerAngles {
    /// Creates Euler angles from roll, pitch and yaw
    pub fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self { roll, pitch, yaw }
    }
    /// Returns `true` if no angle is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.roll.is_finite() && self.pitch.is_finite() && self.yaw.is_finite()
    }
    /// Composes the rotation `Rz(yaw) * Ry(pitch) * Rx(roll)`
    pub fn to_rotation_matrix(&self) -> Matrix3<f32> {
        let yaw = Rotation3::from_axis_angle(&Vector3::z_axis(), self.yaw);
        let pitch = Rotation3::from_axis_angle(&Vector3::y_axis(), self.pitch);
        let roll = Rotation3::from_axis_angle(&Vector3::x_axis(), self.roll);
        (yaw * pitch * roll).into_inner()
    }
    /// Same rotation expressed the way `from_rotation_matrix` would report it
    /// Roll and yaw are wrapped into (-pi, pi]; a pitch past +-pi/2 is folded back
    /// as `(roll + pi, pi - pitch, yaw + pi)`.
    /// # Errors
    /// * Returns `NonFinite` if an angle is NaN or infinite
    /// * Returns `DegenerateRotation` if the pitch is at gimbal lock
    /// # Example
    /// ```
    /// use crazyflie_sim::EulerAngles;
    /// use std::f32::consts::PI;
    /// let folded = EulerAngles::new(0.0, 2.0, 0.0).canonical().unwrap();
    /// assert!((folded.pitch - (PI - 2.0)).abs() < 1e-6);
    /// assert!((folded.yaw - PI).abs() < 1e-6);
    /// ```
    pub fn canonical(&self) -> Result<Self, CrazyflieError> {
        if !self.is_finite() {
            return Err(CrazyflieError::NonFinite("attitude"));
        }
        let (mut roll, mut pitch, mut yaw) = (self.roll, wrap_angle(self.pitch), self.yaw);
        if pitch.abs() > FRAC_PI_2 {
            pitch = pitch.signum() * PI - pitch;
            roll += PI;
            yaw += PI;
        }
        if !(pitch.cos().abs() > GIMBAL_LOCK_TOLERANCE) {
            return Err(CrazyflieError::DegenerateRotation { pitch });
        }
        Ok(Self {
            roll: wrap_angle(roll),
            pitch,
            yaw: wrap_angle(yaw),
        })
    }
    /// Recovers roll, pitch and yaw from a rotation matrix
    /// Pitch is returned in (-pi/2, pi/2), roll and yaw in (-pi, pi].
    /// # Arguments
    /// * `rotation` - A proper rotation matrix
    /// # Errors
    /// * Returns `DegenerateRotation` when cos(pitch) vanishes (gimbal lock)
    /// # Example
    /// ```
    /// use crazyflie_sim::EulerAngles;
    /// let angles = EulerAngles::new(0.1, -0.2, 0.3);
    /// let recovered = EulerAngles::from_rotation_matrix(&angles.to_rotation_matrix()).unwrap();
    /// assert!((recovered.pitch + 0.2).abs() < 1e-6);
    /// ```
    pub fn from_rotation_matrix(rotation: &Matrix3<f32>) -> Result<Self, CrazyflieError> {
        // cos(pitch) >= 0 is the norm of the first column's xy part
        let cos_pitch = rotation[(0, 0)].hypot(rotation[(1, 0)]);
        let pitch = (-rotation[(2, 0)]).atan2(cos_pitch);
        if !(cos_pitch > GIMBAL_LOCK_TOLERANCE) {
            return Err(CrazyflieError::DegenerateRotation { pitch });
        }
        let yaw = rotation[(1, 0)].atan2(rotation[(0, 0)]);
        let roll = rotation[(2, 1)].atan2(rotation[(2, 2)]);
        Ok(Self { roll, pitch, yaw })
    }
}
/// Rigid body pose of the Crazyflie
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// Position of the body origin in the world frame
    pub position: Vector3<f32>,
    /// Orientation of the body
    pub attitude: EulerAngles,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Creates a pose from a position and an attitude
    pub fn new(position: Vector3<f32>, attitude: EulerAngles) -> Self {
        Self { position, attitude }
    }
    /// Pose at the origin with no rotation
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            attitude: EulerAngles::default(),
        }
    }
    /// Returns `true` if position and attitude hold only finite values
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite()) && self.attitude.is_finite()
    }
    /// Orientation as a unit quaternion
    pub fn orientation(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_euler_angles(self.attitude.roll, self.attitude.pitch, self.attitude.yaw)
    }
    /// Rigid transform with the same translation and orientation as `to_homogeneous`
    pub fn to_isometry(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(self.position), self.orientation())
    }
    /// Composes `Translate(position) * Rz(yaw) * Ry(pitch) * Rx(roll)`
    /// # Example
    /// ```
    /// use crazyflie_sim::{EulerAngles, Pose};
    /// use nalgebra::Vector3;
    /// let pose = Pose::new(Vector3::new(1.0, 2.0, 3.0), EulerAngles::default());
    /// let matrix = pose.to_homogeneous();
    /// assert_eq!(matrix[(0, 3)], 1.0);
    /// assert_eq!(matrix[(3, 3)], 1.0);
    /// ```
    pub fn to_homogeneous(&self) -> Matrix4<f32> {
        Translation3::from(self.position).to_homogeneous()
            * self.attitude.to_rotation_matrix().to_homogeneous()
    }
    /// Decomposes a homogeneous transform into a pose
    /// # Arguments
    /// * `matrix` - 4x4 homogeneous rigid transform
    /// # Errors
    /// * Returns `InvalidPose` if the matrix is not a rigid transform
    /// * Returns `DegenerateRotation` if the rotation is at gimbal lock
    pub fn from_homogeneous(matrix: &Matrix4<f32>) -> Result<Self, CrazyflieError> {
        let bottom_row = matrix.row(3) - RowVector4::new(0.0, 0.0, 0.0, 1.0);
        if !(bottom_row.norm() <= ROTATION_TOLERANCE) {
            return Err(CrazyflieError::InvalidPose(format!(
                "bottom row must be [0 0 0 1], got {}",
                matrix.row(3)
            )));
        }
        let position: Vector3<f32> = matrix.fixed_view::<3, 1>(0, 3).into_owned();
        if !position.iter().all(|v| v.is_finite()) {
            return Err(CrazyflieError::NonFinite("position"));
        }
        let rotation: Matrix3<f32> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        validate_rotation(&rotation)?;
        Ok(Self {
            position,
            attitude: EulerAngles::from_rotation_matrix(&rotation)?,
        })
    }
}
/// Spin angle of each rotor in radians, ordered M1..M4
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PropAngles(pub [f32; NUM_ROTORS]);

impl PropAngles {
    /// Returns `true` if every angle is finite
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|a| a.is_finite())
    }
}
