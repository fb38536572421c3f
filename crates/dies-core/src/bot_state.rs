use serde::{Deserialize, Serialize};

use crate::{Angle, BotId, Vector2};

/// Where a [`BotState`] came from.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotStateSource {
    /// Estimated by the vision filter.
    Filtered,
    /// Reported by the robot itself over its telemetry link.
    Internal,
    /// Predicted from the trajectory the robot is currently executing.
    Trajectory,
}

/// Pose and velocity of a single robot.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct BotState {
    pub id: BotId,
    /// Position in mm
    pub pos: Vector2,
    /// Heading of the robot
    pub orientation: Angle,
    /// Velocity in mm/s
    pub vel: Vector2,
    /// Angular velocity in rad/s
    pub angular_vel: f64,
    pub source: BotStateSource,
}

impl BotState {
    pub fn new(id: BotId, pos: Vector2, orientation: Angle, source: BotStateSource) -> Self {
        Self {
            id,
            pos,
            orientation,
            vel: Vector2::zeros(),
            angular_vel: 0.0,
            source,
        }
    }

    pub fn with_vel(mut self, vel: Vector2, angular_vel: f64) -> Self {
        self.vel = vel;
        self.angular_vel = angular_vel;
        self
    }

    /// Squared planar distance between the positions of two states.
    pub fn distance_sqr(&self, other: &BotState) -> f64 {
        (self.pos - other.pos).norm_squared()
    }
}
