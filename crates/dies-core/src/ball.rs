use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{BotId, DiesInstant, FilteredVisionBall, Vector2, Vector3};

/// Radius of the ball, in mm.
pub const BALL_RADIUS: f64 = 21.5;

/// Deceleration of a rolling ball, in mm/s².
const BALL_ROLL_DECELERATION: f64 = 400.0;

/// The moment and parameters of a ball being kicked.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KickEvent {
    /// The robot that kicked the ball
    pub kicking_bot: BotId,
    /// Time of the kick
    pub timestamp: DiesInstant,
    /// Ball position at the kick, in mm
    pub position: Vector2,
    /// Initial ball velocity after the kick, in mm/s
    pub kick_vel: Vector3,
    /// Start time of the ball trajectory fitted to the kick
    pub trajectory_start_time: DiesInstant,
}

impl KickEvent {
    /// The absolute kick speed in mm/s.
    pub fn kick_speed(&self) -> f64 {
        self.kick_vel.norm()
    }
}

/// Diagnostic state of the upstream kick fitter.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BallKickFitState {
    pub pos: Vector3,
    pub vel: Vector3,
    pub kick_timestamp: DiesInstant,
    /// Time of the frame this fit was reported in
    pub timestamp: DiesInstant,
}

/// The fused ball of one world frame.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TrackedBall {
    pub timestamp: DiesInstant,
    /// Position in mm
    pub pos: Vector3,
    /// Velocity in mm/s
    pub vel: Vector3,
    /// Acceleration in mm/s²
    pub acc: Vector3,
    /// Whether the ball is in the air after a chip kick
    pub chipped: bool,
    /// Last time any camera saw the ball
    pub last_visible: DiesInstant,
    /// The current kick event, shared with the frames before and after this one
    pub kick_event: Option<Arc<KickEvent>>,
}

impl TrackedBall {
    pub fn from_filtered(timestamp: DiesInstant, ball: &FilteredVisionBall) -> Self {
        Self {
            timestamp,
            pos: ball.pos,
            vel: ball.vel,
            acc: ball.acc,
            chipped: ball.chipped,
            last_visible: ball.last_visible,
            kick_event: None,
        }
    }

    pub fn with_kick_event(mut self, kick_event: Option<Arc<KickEvent>>) -> Self {
        self.kick_event = kick_event;
        self
    }

    /// Planar position in mm.
    pub fn pos2(&self) -> Vector2 {
        self.pos.xy()
    }

    /// Planar speed in mm/s.
    pub fn speed2(&self) -> f64 {
        self.vel.xy().norm()
    }

    /// Where a rolling ball comes to rest, assuming constant deceleration.
    pub fn stop_position(&self) -> Vector2 {
        let vel = self.vel.xy();
        let speed = vel.norm();
        if !speed.is_finite() || speed < f64::EPSILON {
            return self.pos2();
        }
        self.pos2() + vel * (speed / (2.0 * BALL_ROLL_DECELERATION))
    }
}
