use dies_core::{Angle, RobotInfo, TrackedBall, Vector2, WorldSettings};

/// Decides whether a robot touches the ball.
///
/// The ball of the current frame has to be set with [`Self::set_tracked_ball`]
/// before any robot is evaluated.
#[derive(Debug, Clone)]
pub struct BallContactCalculator {
    ball_pos: Option<Vector2>,
    tolerance: f64,
    barrier_ball_contact: bool,
}

impl BallContactCalculator {
    pub fn new(settings: &WorldSettings) -> Self {
        Self {
            ball_pos: None,
            tolerance: settings.ball_contact_tolerance,
            barrier_ball_contact: settings.barrier_ball_contact,
        }
    }

    pub fn update_settings(&mut self, settings: &WorldSettings) {
        self.tolerance = settings.ball_contact_tolerance;
        self.barrier_ball_contact = settings.barrier_ball_contact;
    }

    pub fn set_tracked_ball(&mut self, ball: &TrackedBall) {
        self.ball_pos = Some(ball.pos2());
    }

    /// Whether the robot with the given pose touches the ball. Without a ball this
    /// is always `false`.
    pub fn ball_contact(&self, info: &RobotInfo, pos: Vector2, orientation: Angle) -> bool {
        if self.barrier_ball_contact && info.barrier_interrupted {
            return true;
        }
        let Some(ball_pos) = self.ball_pos else {
            return false;
        };
        let dribbler = pos + orientation.to_vector() * info.center_to_dribbler;
        (ball_pos - dribbler).norm() < self.tolerance
    }
}
