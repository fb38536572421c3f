use serde::Serialize;

use crate::{BotId, BotState, DiesInstant, TimedTrajectory};

/// Default distance between robot center and dribbler, in mm.
pub const DEFAULT_CENTER_TO_DRIBBLER: f64 = 75.0;

/// Telemetry bundle for one robot, as provided by the robot link.
#[derive(Serialize, Clone, Debug)]
pub struct RobotInfo {
    pub id: BotId,
    /// Time of the world frame this info was requested for
    pub timestamp: DiesInstant,
    /// Whether the robot is connected to us
    pub connected: bool,
    /// The state the robot reports about itself
    pub internal_state: Option<BotState>,
    /// Distance from the robot center to the dribbler, in mm
    pub center_to_dribbler: f64,
    /// The trajectory the robot is currently executing
    #[serde(skip)]
    pub trajectory: Option<TimedTrajectory>,
    /// Whether the ball light barrier is interrupted
    pub barrier_interrupted: bool,
    /// Whether the robot reports itself fit to play
    pub healthy: bool,
    /// Whether the robot currently plays as goalkeeper
    pub reported_goalie: bool,
}

impl RobotInfo {
    /// Info for a robot we have no link to.
    pub fn unconnected(id: BotId) -> Self {
        Self {
            id,
            timestamp: DiesInstant::ZERO,
            connected: false,
            internal_state: None,
            center_to_dribbler: DEFAULT_CENTER_TO_DRIBBLER,
            trajectory: None,
            barrier_interrupted: false,
            healthy: true,
            reported_goalie: false,
        }
    }

    /// Info for a connected robot without any telemetry yet.
    pub fn connected(id: BotId) -> Self {
        Self {
            connected: true,
            ..Self::unconnected(id)
        }
    }

    pub fn with_internal_state(mut self, state: BotState) -> Self {
        self.internal_state = Some(state);
        self
    }

    pub fn with_trajectory(mut self, trajectory: TimedTrajectory) -> Self {
        self.trajectory = Some(trajectory);
        self
    }
}
