use crate::airframe::Airframe;
use crate::history::{History, Snapshot};
use crate::pose::{wrap_angle, EulerAngles, Pose, PropAngles, NUM_ROTORS};
use crate::CrazyflieError;

use nalgebra::{Isometry3, Matrix4, Vector3};

/// Display state of a Crazyflie: body pose, rotor spin angles and undo history
/// Position and attitude are the source of truth and the homogeneous transform is
/// derived on demand. Angles are stored in canonical form: roll and yaw in
/// (-pi, pi], pitch in (-pi/2, pi/2). The readers therefore agree with a
/// decomposition of `pose_matrix`.
/// Every setter records the previous state before mutating and leaves the state
/// untouched when it returns an error.
/// # Example
/// ```
/// use crazyflie_sim::CrazyflieSim;
/// use nalgebra::Vector3;
///
/// let mut sim = CrazyflieSim::new(16).unwrap();
/// sim.set_position(Vector3::new(0.0, 0.0, 1.0)).unwrap();
/// sim.set_yaw(0.5).unwrap();
/// assert_eq!(sim.history_len(), 2);
/// sim.undo();
/// assert_eq!(sim.yaw(), 0.0);
/// assert_eq!(sim.position().z, 1.0);
/// ```
#[derive(Clone, Debug)]
pub struct CrazyflieSim {
    pose: Pose,
    prop_angles: PropAngles,
    history: History,
}

impl Default for CrazyflieSim {
    fn default() -> Self {
        Self {
            pose: Pose::identity(),
            prop_angles: PropAngles::default(),
            history: History::default(),
        }
    }
}

impl CrazyflieSim {
    /// Creates a Crazyflie at the origin with zero prop angles
    /// # Arguments
    /// * `history_capacity` - Maximum number of undo snapshots
    /// # Errors
    /// * Returns `InvalidHistoryCapacity` if `history_capacity` is zero
    pub fn new(history_capacity: usize) -> Result<Self, CrazyflieError> {
        Ok(Self {
            pose: Pose::identity(),
            prop_angles: PropAngles::default(),
            history: History::new(history_capacity)?,
        })
    }
    /// Current body pose with canonical attitude
    pub fn pose(&self) -> &Pose {
        &self.pose
    }
    /// Homogeneous transform `Translate(position) * Rz(yaw) * Ry(pitch) * Rx(roll)`
    pub fn pose_matrix(&self) -> Matrix4<f32> {
        self.pose.to_homogeneous()
    }
    /// Body position in the world frame
    pub fn position(&self) -> Vector3<f32> {
        self.pose.position
    }
    /// Roll, pitch and yaw as returned by decomposing `pose_matrix`
    pub fn attitude(&self) -> EulerAngles {
        self.pose.attitude
    }
    /// Roll in (-pi, pi]
    pub fn roll(&self) -> f32 {
        self.pose.attitude.roll
    }
    /// Pitch in (-pi/2, pi/2)
    pub fn pitch(&self) -> f32 {
        self.pose.attitude.pitch
    }
    /// Yaw in (-pi, pi]
    pub fn yaw(&self) -> f32 {
        self.pose.attitude.yaw
    }
    pub fn prop_angles(&self) -> &PropAngles {
        &self.prop_angles
    }
    /// Number of mutations that can be undone
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }
    fn record(&mut self) {
        let snapshot = Snapshot {
            pose: self.pose,
            prop_angles: self.prop_angles,
        };
        self.history.push(snapshot);
    }
    /// Canonicalizes the attitude, then records and stores the pose
    fn write_pose(&mut self, pose: Pose) -> Result<(), CrazyflieError> {
        let attitude = pose.attitude.canonical()?;
        self.record();
        self.pose = Pose::new(pose.position, attitude);
        Ok(())
    }
    /// Sets roll, keeping pitch, yaw and position
    /// # Errors
    /// * Returns `NonFinite` if `roll` is NaN or infinite
    /// * Returns `DegenerateRotation` if the current pitch is at gimbal lock
    pub fn set_roll(&mut self, roll: f32) -> Result<(), CrazyflieError> {
        if !roll.is_finite() {
            return Err(CrazyflieError::NonFinite("roll"));
        }
        let mut pose = self.pose;
        pose.attitude.roll = roll;
        self.write_pose(pose)
    }
    /// Sets pitch, keeping roll, yaw and position
    /// A pitch beyond +-pi/2 is stored as the equivalent attitude
    /// `(roll + pi, pi - pitch, yaw + pi)`.
    /// # Errors
    /// * Returns `NonFinite` if `pitch` is NaN or infinite
    /// * Returns `DegenerateRotation` if `pitch` is at +-pi/2
    pub fn set_pitch(&mut self, pitch: f32) -> Result<(), CrazyflieError> {
        if !pitch.is_finite() {
            return Err(CrazyflieError::NonFinite("pitch"));
        }
        let mut pose = self.pose;
        pose.attitude.pitch = pitch;
        self.write_pose(pose)
    }
    /// Sets yaw, keeping roll, pitch and position
    /// # Errors
    /// * Returns `NonFinite` if `yaw` is NaN or infinite
    pub fn set_yaw(&mut self, yaw: f32) -> Result<(), CrazyflieError> {
        if !yaw.is_finite() {
            return Err(CrazyflieError::NonFinite("yaw"));
        }
        let mut pose = self.pose;
        pose.attitude.yaw = yaw;
        self.write_pose(pose)
    }
    /// Sets roll, pitch and yaw as a single mutation
    /// # Errors
    /// * Returns `NonFinite` if any angle is NaN or infinite
    /// * Returns `DegenerateRotation` if the pitch is at +-pi/2
    pub fn set_attitude(&mut self, attitude: EulerAngles) -> Result<(), CrazyflieError> {
        if !attitude.is_finite() {
            return Err(CrazyflieError::NonFinite("attitude"));
        }
        self.write_pose(Pose::new(self.pose.position, attitude))
    }
    /// Moves the body, keeping its attitude
    pub fn set_position(&mut self, position: Vector3<f32>) -> Result<(), CrazyflieError> {
        if !position.iter().all(|v| v.is_finite()) {
            return Err(CrazyflieError::NonFinite("position"));
        }
        self.write_pose(Pose::new(position, self.pose.attitude))
    }
    /// Replaces position and attitude as a single mutation
    pub fn set_pose(&mut self, pose: Pose) -> Result<(), CrazyflieError> {
        if !pose.is_finite() {
            return Err(CrazyflieError::NonFinite("pose"));
        }
        self.write_pose(pose)
    }
    /// Replaces the pose with a raw homogeneous transform
    /// # Arguments
    /// * `matrix` - 4x4 rigid transform
    /// # Errors
    /// * Returns `InvalidPose` if the matrix is not a rigid transform
    /// * Returns `DegenerateRotation` if the rotation is at gimbal lock
    pub fn set_pose_matrix(&mut self, matrix: &Matrix4<f32>) -> Result<(), CrazyflieError> {
        let pose = Pose::from_homogeneous(matrix)?;
        self.write_pose(pose)
    }
    /// Replaces all four rotor spin angles as a single mutation
    pub fn set_prop_angles(&mut self, prop_angles: PropAngles) -> Result<(), CrazyflieError> {
        if !prop_angles.is_finite() {
            return Err(CrazyflieError::NonFinite("prop angles"));
        }
        self.record();
        self.prop_angles = prop_angles;
        Ok(())
    }
    /// Sets the spin angle of one rotor
    /// # Errors
    /// * Returns `InvalidRotor` if `index` is not below `NUM_ROTORS`
    pub fn set_prop_angle(&mut self, index: usize, angle: f32) -> Result<(), CrazyflieError> {
        if index >= NUM_ROTORS {
            return Err(CrazyflieError::InvalidRotor(index));
        }
        let mut prop_angles = self.prop_angles;
        prop_angles.0[index] = angle;
        self.set_prop_angles(prop_angles)
    }
    /// Advances every rotor by `rate * dt`, keeping angles in (-pi, pi]
    /// # Arguments
    /// * `rates` - Spin rate of each rotor in rad/s, sign gives the direction
    /// * `dt` - Elapsed time in s
    pub fn spin_props(&mut self, rates: &[f32; NUM_ROTORS], dt: f32) -> Result<(), CrazyflieError> {
        let mut prop_angles = self.prop_angles;
        for (angle, rate) in prop_angles.0.iter_mut().zip(rates) {
            *angle = wrap_angle(*angle + rate * dt);
        }
        self.set_prop_angles(prop_angles)
    }
    /// Restores the newest snapshot
    /// # Returns
    /// * `true` if a snapshot was restored, `false` if the history was empty
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(snapshot) => {
                self.pose = snapshot.pose;
                self.prop_angles = snapshot.prop_angles;
                log::debug!("Undo, {} snapshots left", self.history.len());
                true
            }
            None => false,
        }
    }
    /// Forgets every snapshot, keeping the current state
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
    /// World transform of each rotor: `Pose * Translate(mount) * Rz(prop angle)`
    /// # Arguments
    /// * `airframe` - Rotor placement
    pub fn rotor_transforms(&self, airframe: &Airframe) -> [Isometry3<f32>; NUM_ROTORS] {
        let body = self.pose.to_isometry();
        airframe
            .rotor_local_transforms(&self.prop_angles.0)
            .map(|local| body * local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn assert_same_angle(a: f32, b: f32) {
        assert!(wrap_angle(a - b).abs() < 1e-5, "{} and {} differ", a, b);
    }

    fn assert_readers_match_matrix(sim: &CrazyflieSim) {
        let decomposed =
            EulerAngles::from_rotation_matrix(&sim.attitude().to_rotation_matrix()).unwrap();
        let from_matrix = Pose::from_homogeneous(&sim.pose_matrix()).unwrap().attitude;
        for expected in [decomposed, from_matrix] {
            assert_same_angle(sim.roll(), expected.roll);
            assert_relative_eq!(sim.pitch(), expected.pitch, epsilon = 1e-5);
            assert_same_angle(sim.yaw(), expected.yaw);
        }
    }

    #[test]
    fn starts_at_identity() {
        let sim = CrazyflieSim::default();
        assert_eq!(sim.pose_matrix(), Matrix4::identity());
        assert_eq!(sim.prop_angles(), &PropAngles([0.0; 4]));
        assert!(!sim.can_undo());
    }

    #[test]
    fn position_leaves_angles_alone() {
        let mut sim = CrazyflieSim::default();
        sim.set_attitude(EulerAngles::new(0.1, 0.2, 0.3)).unwrap();
        sim.set_position(Vector3::new(1.0, -2.0, 0.5)).unwrap();
        assert_eq!(sim.attitude(), EulerAngles::new(0.1, 0.2, 0.3));
        let matrix = sim.pose_matrix();
        assert_relative_eq!(matrix[(0, 3)], 1.0);
        assert_relative_eq!(matrix[(1, 3)], -2.0);
        assert_relative_eq!(matrix[(2, 3)], 0.5);
    }

    #[test]
    fn roll_leaves_pitch_yaw_position_alone() {
        let mut sim = CrazyflieSim::default();
        sim.set_pitch(-0.4).unwrap();
        sim.set_yaw(2.0).unwrap();
        sim.set_position(Vector3::new(0.0, 1.0, 2.0)).unwrap();
        sim.set_roll(FRAC_PI_4).unwrap();
        assert_eq!(sim.pitch(), -0.4);
        assert_eq!(sim.yaw(), 2.0);
        assert_eq!(sim.position(), Vector3::new(0.0, 1.0, 2.0));
        let recovered = Pose::from_homogeneous(&sim.pose_matrix()).unwrap();
        assert_relative_eq!(recovered.attitude.roll, FRAC_PI_4, epsilon = 1e-5);
        assert_relative_eq!(recovered.attitude.pitch, -0.4, epsilon = 1e-5);
        assert_relative_eq!(recovered.attitude.yaw, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn undo_walks_back_each_mutation() {
        let mut sim = CrazyflieSim::default();
        let mut poses = vec![sim.pose_matrix()];
        for i in 1..=5 {
            sim.set_yaw(0.1 * i as f32).unwrap();
            sim.set_position(Vector3::new(i as f32, 0.0, 0.0)).unwrap();
            poses.push(sim.pose_matrix());
        }
        assert_eq!(sim.history_len(), 10);
        for _ in 0..5 {
            assert!(sim.undo());
            assert!(sim.undo());
            poses.pop();
            assert_eq!(sim.pose_matrix(), *poses.last().unwrap());
        }
        assert!(!sim.undo());
        assert_eq!(sim.pose_matrix(), Matrix4::identity());
    }

    #[test]
    fn undo_restores_prop_angles() {
        let mut sim = CrazyflieSim::default();
        sim.set_prop_angle(2, 1.0).unwrap();
        sim.spin_props(&[1.0, -1.0, 1.0, -1.0], 0.5).unwrap();
        assert_relative_eq!(sim.prop_angles().0[2], 1.5, epsilon = 1e-6);
        assert!(sim.undo());
        assert_eq!(sim.prop_angles(), &PropAngles([0.0, 0.0, 1.0, 0.0]));
    }

    #[test]
    fn rejected_input_changes_nothing() {
        let mut sim = CrazyflieSim::default();
        assert!(matches!(
            sim.set_roll(f32::NAN),
            Err(CrazyflieError::NonFinite("roll"))
        ));
        assert!(sim
            .set_position(Vector3::new(0.0, f32::INFINITY, 0.0))
            .is_err());
        assert!(matches!(
            sim.set_prop_angle(4, 0.0),
            Err(CrazyflieError::InvalidRotor(4))
        ));
        let locked = Pose::new(Vector3::zeros(), EulerAngles::new(0.0, FRAC_PI_2, 0.0));
        assert!(matches!(
            sim.set_pose_matrix(&locked.to_homogeneous()),
            Err(CrazyflieError::DegenerateRotation { .. })
        ));
        assert_eq!(sim.history_len(), 0);
        assert_eq!(sim.pose_matrix(), Matrix4::identity());
    }

    #[test]
    fn pose_matrix_is_decomposed() {
        let mut sim = CrazyflieSim::default();
        let pose = Pose::new(Vector3::new(1.0, 2.0, 3.0), EulerAngles::new(0.3, 0.2, 0.1));
        sim.set_pose_matrix(&pose.to_homogeneous()).unwrap();
        assert_relative_eq!(sim.roll(), 0.3, epsilon = 1e-5);
        assert_relative_eq!(sim.pitch(), 0.2, epsilon = 1e-5);
        assert_relative_eq!(sim.yaw(), 0.1, epsilon = 1e-5);
        assert_relative_eq!(sim.position(), pose.position, epsilon = 1e-6);
    }

    #[test]
    fn spin_wraps_angles() {
        let mut sim = CrazyflieSim::default();
        sim.spin_props(&[2.5 * PI, 0.0, 0.0, -2.5 * PI], 1.0).unwrap();
        for angle in sim.prop_angles().0 {
            assert!(angle > -PI && angle <= PI);
        }
        assert_relative_eq!(sim.prop_angles().0[0], FRAC_PI_2, epsilon = 1e-5);
        assert_relative_eq!(sim.prop_angles().0[3], -FRAC_PI_2, epsilon = 1e-5);
    }

    #[test]
    fn out_of_range_angles_are_stored_canonically() {
        let mut sim = CrazyflieSim::default();
        sim.set_pitch(2.0).unwrap();
        assert_readers_match_matrix(&sim);
        assert_same_angle(sim.roll(), PI);
        sim.set_roll(4.0).unwrap();
        assert_readers_match_matrix(&sim);
        assert_relative_eq!(sim.roll(), 4.0 - 2.0 * PI, epsilon = 1e-5);
        assert_relative_eq!(sim.pitch(), PI - 2.0, epsilon = 1e-5);
        assert_same_angle(sim.yaw(), PI);

        sim.set_yaw(-7.0).unwrap();
        assert_readers_match_matrix(&sim);
        assert!(sim.yaw() > -PI && sim.yaw() <= PI);
        assert_eq!(sim.history_len(), 3);
    }

    #[test]
    fn vertical_pitch_is_rejected() {
        let mut sim = CrazyflieSim::default();
        sim.set_roll(0.3).unwrap();
        for pitch in [FRAC_PI_2, -FRAC_PI_2, 3.0 * FRAC_PI_2] {
            assert!(matches!(
                sim.set_pitch(pitch),
                Err(CrazyflieError::DegenerateRotation { .. })
            ));
        }
        assert_eq!(sim.history_len(), 1);
        assert_eq!(sim.roll(), 0.3);
        assert_eq!(sim.pitch(), 0.0);
    }

    #[test]
    fn own_matrix_round_trips() {
        let mut sim = CrazyflieSim::default();
        sim.set_pose(Pose::new(
            Vector3::new(0.2, 0.0, 1.0),
            EulerAngles::new(-2.0, 1.2, 3.0),
        ))
        .unwrap();
        let before = sim.pose_matrix();
        sim.set_pose_matrix(&before).unwrap();
        assert_relative_eq!(sim.pose_matrix(), before, epsilon = 1e-5);
        assert_readers_match_matrix(&sim);
    }

    #[test]
    fn bounded_history_forgets_oldest() {
        let mut sim = CrazyflieSim::new(3).unwrap();
        for i in 1..=5 {
            sim.set_roll(i as f32 * 0.1).unwrap();
        }
        assert_eq!(sim.history_len(), 3);
        while sim.undo() {}
        assert_relative_eq!(sim.roll(), 0.2);
    }

    #[test]
    fn rotors_follow_the_body() {
        let airframe = Airframe::default();
        let mut sim = CrazyflieSim::default();
        sim.set_position(Vector3::new(0.0, 0.0, 1.0)).unwrap();
        sim.set_yaw(FRAC_PI_2).unwrap();
        sim.set_prop_angle(0, FRAC_PI_2).unwrap();
        let transforms = sim.rotor_transforms(&airframe);
        let mounts = airframe.rotor_mounts();
        for (transform, mount) in transforms.iter().zip(mounts.iter()) {
            let hub = transform.transform_point(&Point3::origin());
            // Quarter turn maps (x, y) to (-y, x)
            let expected = Vector3::new(-mount.y, mount.x, 1.0 + mount.z);
            assert_relative_eq!(hub.coords, expected, epsilon = 1e-6);
        }
        // Body yaw plus blade spin: a half turn in the world frame
        let blade = transforms[0].transform_vector(&Vector3::x());
        assert_relative_eq!(blade, -Vector3::x(), epsilon = 1e-6);
    }
}
