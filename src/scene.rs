use crate::airframe::Airframe;
use crate::crazyflie::CrazyflieSim;
use crate::pose::NUM_ROTORS;
use crate::CrazyflieError;

use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};
use std::f32::consts::PI;

/// Number of segments used to draw a rotor disc
const DISC_SEGMENTS: usize = 24;

/// Display handle binding a Crazyflie to a rerun entity subtree
/// Entities logged below `root`:
/// * `base_link` - body transform, with `body` and `arms` geometry
/// * `base_link/rotor_1..4` - rotor transforms relative to the body, with `disc` geometry
/// * `rotor_hubs` - rotor hub positions in the world frame
/// * `trail` - flown path
/// * `attitude/*`, `position/*` - scalar plots
pub struct CrazyflieScene {
    root: String,
    airframe: Airframe,
}

impl CrazyflieScene {
    /// Creates a display handle
    /// # Arguments
    /// * `root` - Entity path all Crazyflie entities are logged under
    /// * `airframe` - Geometry used to place and draw the rotors
    /// # Errors
    /// * Returns `InvalidHandle` if `root` is empty, contains whitespace or empty path parts
    /// # Example
    /// ```
    /// use crazyflie_sim::{Airframe, CrazyflieScene};
    /// assert!(CrazyflieScene::new("world/cf1", Airframe::default()).is_ok());
    /// assert!(CrazyflieScene::new("world//cf1", Airframe::default()).is_err());
    /// ```
    pub fn new(root: &str, airframe: Airframe) -> Result<Self, CrazyflieError> {
        if root.is_empty() {
            return Err(CrazyflieError::InvalidHandle(
                "entity path is empty".to_string(),
            ));
        }
        if root.chars().any(char::is_whitespace) {
            return Err(CrazyflieError::InvalidHandle(format!(
                "entity path '{}' contains whitespace",
                root
            )));
        }
        if root.split('/').any(str::is_empty) {
            return Err(CrazyflieError::InvalidHandle(format!(
                "entity path '{}' has an empty part",
                root
            )));
        }
        Ok(Self {
            root: root.to_string(),
            airframe,
        })
    }
    fn path(&self, child: &str) -> String {
        format!("{}/{}", self.root, child)
    }
    /// Log the airframe geometry, which does not change over time
    /// # Arguments
    /// * `rec` - The rerun::RecordingStream instance
    /// # Errors
    /// * If the data cannot be logged to the recording stream
    pub fn log_static(&self, rec: &rerun::RecordingStream) -> Result<(), CrazyflieError> {
        let half = self.airframe.body_half_sizes;
        rec.log_static(
            self.path("base_link/body"),
            &rerun::Boxes3D::from_centers_and_half_sizes(
                [rerun::external::glam::Vec3::ZERO],
                [rerun::external::glam::Vec3::new(half.x, half.y, half.z)],
            )
            .with_colors([rerun::Color::from_rgb(64, 64, 64)]),
        )?;
        let arms = self
            .airframe
            .rotor_mounts()
            .iter()
            .map(|m| vec![(0.0, 0.0, 0.0), (m.x, m.y, m.z)])
            .collect::<Vec<Vec<(f32, f32, f32)>>>();
        rec.log_static(
            self.path("base_link/arms"),
            &rerun::LineStrips3D::new(arms)
                .with_colors([rerun::Color::from_rgb(200, 200, 200)])
                .with_radii([0.002]),
        )?;
        let disc = disc_strips(self.airframe.rotor_radius);
        for i in 0..NUM_ROTORS {
            // Front rotors in red so heading reads at a glance
            let color = if i == 0 || i == 3 {
                rerun::Color::from_rgb(255, 80, 80)
            } else {
                rerun::Color::from_rgb(80, 160, 255)
            };
            rec.log_static(
                self.path(&format!("base_link/rotor_{}/disc", i + 1)),
                &rerun::LineStrips3D::new(disc.clone())
                    .with_colors([color])
                    .with_radii([0.001]),
            )?;
        }
        Ok(())
    }
    /// Log the body and rotor transforms together with attitude and position plots
    /// # Arguments
    /// * `rec` - The rerun::RecordingStream instance
    /// * `sim` - The Crazyflie state to display
    /// # Errors
    /// * If the data cannot be logged to the recording stream
    pub fn log_state(
        &self,
        rec: &rerun::RecordingStream,
        sim: &CrazyflieSim,
    ) -> Result<(), CrazyflieError> {
        rec.log(
            self.path("base_link"),
            &to_rerun_transform(&sim.pose().to_isometry()).with_axis_length(0.05),
        )?;
        let local = self.airframe.rotor_local_transforms(&sim.prop_angles().0);
        for (i, rotor) in local.iter().enumerate() {
            rec.log(
                self.path(&format!("base_link/rotor_{}", i + 1)),
                &to_rerun_transform(rotor),
            )?;
        }
        let hubs = sim
            .rotor_transforms(&self.airframe)
            .iter()
            .map(|rotor| {
                let hub = rotor.transform_point(&Point3::origin());
                (hub.x, hub.y, hub.z)
            })
            .collect::<Vec<(f32, f32, f32)>>();
        rec.log(
            self.path("rotor_hubs"),
            &rerun::Points3D::new(hubs).with_radii([0.004]),
        )?;
        let position = sim.position();
        let attitude = sim.attitude();
        for (name, value) in [
            ("attitude/roll", attitude.roll),
            ("attitude/pitch", attitude.pitch),
            ("attitude/yaw", attitude.yaw),
            ("position/x", position.x),
            ("position/y", position.y),
            ("position/z", position.z),
        ] {
            rec.log(self.path(name), &rerun::Scalar::new(value as f64))?;
        }
        Ok(())
    }
    /// log trail data to the rerun recording stream
    /// # Arguments
    /// * `rec` - The rerun::RecordingStream instance
    /// * `trail` - The Trail instance
    /// # Errors
    /// * If the data cannot be logged to the recording stream
    pub fn log_trail(
        &self,
        rec: &rerun::RecordingStream,
        trail: &Trail,
    ) -> Result<(), CrazyflieError> {
        let path = trail
            .points
            .iter()
            .map(|p| (p.x, p.y, p.z))
            .collect::<Vec<(f32, f32, f32)>>();
        rec.log(
            self.path("trail"),
            &rerun::LineStrips3D::new([path]).with_colors([rerun::Color::from_rgb(0, 255, 255)]),
        )?;
        Ok(())
    }
}

fn to_rerun_quaternion(q: &UnitQuaternion<f32>) -> rerun::Quaternion {
    rerun::Quaternion::from_xyzw([q.i, q.j, q.k, q.w])
}

fn to_rerun_transform(isometry: &Isometry3<f32>) -> rerun::Transform3D {
    let t = isometry.translation.vector;
    rerun::Transform3D::from_translation_rotation(
        rerun::Vec3D::new(t.x, t.y, t.z),
        to_rerun_quaternion(&isometry.rotation),
    )
}

/// Rotor disc outline plus one blade line along the rotor x axis
fn disc_strips(radius: f32) -> Vec<Vec<(f32, f32, f32)>> {
    let circle: Vec<(f32, f32, f32)> = (0..=DISC_SEGMENTS)
        .map(|i| {
            let theta = 2.0 * PI * i as f32 / DISC_SEGMENTS as f32;
            (radius * theta.cos(), radius * theta.sin(), 0.0)
        })
        .collect();
    let blade = vec![(-radius, 0.0, 0.0), (radius, 0.0, 0.0)];
    vec![circle, blade]
}

/// Path flown by the Crazyflie
pub struct Trail {
    /// A vector of 3D points
    pub points: Vec<Vector3<f32>>,
    /// The last point that was kept
    pub last_point: Vector3<f32>,
    /// The minimum distance between kept points
    pub min_distance: f32,
}

impl Trail {
    /// Create a new Trail instance
    /// # Arguments
    /// * `initial_point` - The initial point to add to the trail
    pub fn new(initial_point: Vector3<f32>) -> Self {
        Self {
            points: vec![initial_point],
            last_point: initial_point,
            min_distance: 0.01,
        }
    }
    /// Add a point to the trail if it is further than the minimum distance
    /// # Returns
    /// * `true` if the point was added, `false` otherwise
    pub fn add_point(&mut self, point: Vector3<f32>) -> bool {
        if (point - self.last_point).norm() > self.min_distance {
            self.points.push(point);
            self.last_point = point;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EulerAngles;

    #[test]
    fn invalid_handles_fail_fast() {
        for root in ["", "world/ cf", "/world", "world/", "a//b"] {
            assert!(
                matches!(
                    CrazyflieScene::new(root, Airframe::default()),
                    Err(CrazyflieError::InvalidHandle(_))
                ),
                "accepted '{}'",
                root
            );
        }
        let scene = CrazyflieScene::new("world/crazyflie", Airframe::default()).unwrap();
        assert_eq!(scene.path("trail"), "world/crazyflie/trail");
    }

    #[test]
    fn trail_skips_close_points() {
        let mut trail = Trail::new(Vector3::zeros());
        assert!(!trail.add_point(Vector3::new(0.005, 0.0, 0.0)));
        assert!(trail.add_point(Vector3::new(0.02, 0.0, 0.0)));
        assert!(!trail.add_point(Vector3::new(0.025, 0.0, 0.0)));
        assert_eq!(trail.points.len(), 2);
    }

    #[test]
    fn disc_closes_on_itself() {
        let strips = disc_strips(0.5);
        let circle = &strips[0];
        assert_eq!(circle.len(), DISC_SEGMENTS + 1);
        let (first, last) = (circle[0], circle[DISC_SEGMENTS]);
        assert!((first.0 - last.0).abs() < 1e-5 && (first.1 - last.1).abs() < 1e-5);
    }

    #[test]
    fn logs_into_memory_stream() {
        let (rec, _storage) = rerun::RecordingStreamBuilder::new("crazyflie_sim_test")
            .memory()
            .unwrap();
        let scene = CrazyflieScene::new("world/crazyflie", Airframe::default()).unwrap();
        let mut sim = CrazyflieSim::default();
        sim.set_attitude(EulerAngles::new(0.1, 0.2, 0.3)).unwrap();
        scene.log_static(&rec).unwrap();
        scene.log_state(&rec, &sim).unwrap();
        scene.log_trail(&rec, &Trail::new(sim.position())).unwrap();
    }
}
