//! # Crazyflie Display State
//! This crate keeps the display state of a Crazyflie quadcopter rendered as an
//! articulated rigid body: one body pose, four propeller spin angles and an undo history.
//! ## Features
//! - Rigid-body pose composition (translation, yaw, pitch, roll) and ZYX Euler decomposition
//! - Explicit gimbal-lock detection instead of silent NaN propagation
//! - Bounded snapshot history with pop-based undo
//! - Step-indexed animation schedules read from YAML
//! - Integration with the `rerun` crate for visualization
//! # Example
//! ```
//! use crazyflie_sim::CrazyflieSim;
//! use std::f32::consts::FRAC_PI_4;
//!
//! let mut sim = CrazyflieSim::default();
//! sim.set_roll(FRAC_PI_4).unwrap();
//! assert!((sim.roll() - FRAC_PI_4).abs() < 1e-6);
//! assert!(sim.undo());
//! assert_eq!(sim.roll(), 0.0);
//! ```
pub mod airframe;
pub mod config;
pub mod crazyflie;
pub mod history;
pub mod pose;
pub mod scene;
pub mod schedule;

pub use airframe::Airframe;
pub use crazyflie::CrazyflieSim;
pub use history::{History, Snapshot};
pub use pose::{EulerAngles, Pose, PropAngles, NUM_ROTORS};
pub use scene::{CrazyflieScene, Trail};
pub use schedule::{Action, Schedule};

#[derive(thiserror::Error, Debug)]
/// Represents errors that can occur while manipulating or displaying the Crazyflie
pub enum CrazyflieError {
    /// Rotation at gimbal lock, roll and yaw cannot be separated
    #[error("Degenerate rotation: pitch {pitch} is at gimbal lock")]
    DegenerateRotation {
        /// Pitch recovered before the decomposition gave up
        pitch: f32,
    },
    /// Matrix that is not a rigid transform
    #[error("Invalid pose: {0}")]
    InvalidPose(String),
    /// NaN or infinite value handed to a setter
    #[error("Non-finite value for {0}")]
    NonFinite(&'static str),
    /// Rotor index outside of the airframe
    #[error("Invalid rotor index {0}, expected 0..4")]
    InvalidRotor(usize),
    /// Display handle that cannot address an entity
    #[error("Invalid display handle: {0}")]
    InvalidHandle(String),
    /// History must hold at least one snapshot
    #[error("History capacity must be greater than zero")]
    InvalidHistoryCapacity,
    /// Malformed animation schedule
    #[error("Schedule error: {0}")]
    ScheduleError(String),
    /// Error related to Rerun visualization
    #[error("Rerun error: {0}")]
    RerunError(#[from] rerun::RecordingStreamError),
    /// Configuration value out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    /// Error while parsing the configuration file
    #[error("Config error: {0}")]
    ConfigError(#[from] serde_yaml::Error),
    /// Error while reading the configuration file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
