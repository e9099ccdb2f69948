use crate::pose::{Pose, PropAngles};
use crate::CrazyflieError;

use std::collections::VecDeque;

/// Capacity used by `CrazyflieSim::default`
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// State of the Crazyflie before a mutation
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Snapshot {
    /// Body pose
    pub pose: Pose,
    /// Rotor spin angles
    pub prop_angles: PropAngles,
}

/// Bounded undo history, newest snapshot last
/// Once full, pushing a snapshot drops the oldest one.
/// # Example
/// ```
/// use crazyflie_sim::{History, Snapshot};
/// let mut history = History::new(2).unwrap();
/// history.push(Snapshot::default());
/// assert_eq!(history.len(), 1);
/// assert!(history.pop().is_some());
/// assert!(history.pop().is_none());
/// ```
#[derive(Clone, Debug)]
pub struct History {
    snapshots: VecDeque<Snapshot>,
    capacity: usize,
}

impl History {
    /// Creates an empty history
    /// # Arguments
    /// * `capacity` - Maximum number of snapshots kept
    /// # Errors
    /// * Returns `InvalidHistoryCapacity` if `capacity` is zero
    pub fn new(capacity: usize) -> Result<Self, CrazyflieError> {
        if capacity == 0 {
            return Err(CrazyflieError::InvalidHistoryCapacity);
        }
        Ok(Self {
            snapshots: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        })
    }
    /// Appends a snapshot, evicting the oldest one when full
    pub fn push(&mut self, snapshot: Snapshot) {
        if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front();
            log::debug!("History full ({}), dropped oldest snapshot", self.capacity);
        }
        self.snapshots.push_back(snapshot);
    }
    /// Removes and returns the newest snapshot
    pub fn pop(&mut self) -> Option<Snapshot> {
        self.snapshots.pop_back()
    }
    /// Number of snapshots held
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
    /// Drops every snapshot, the capacity is kept
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self {
            snapshots: VecDeque::with_capacity(DEFAULT_HISTORY_CAPACITY),
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}
