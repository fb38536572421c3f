use serde::{Deserialize, Serialize};

use crate::{
    Angle, BallKickFitState, BotId, BotState, BotStateSource, DiesInstant, KickEvent, ShapeMap,
    Vector2, Vector3,
};

/// A robot as estimated by the vision filter.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FilteredVisionBot {
    pub id: BotId,
    /// Position in mm
    pub pos: Vector2,
    pub orientation: Angle,
    /// Velocity in mm/s
    #[serde(default = "Vector2::zeros")]
    pub vel: Vector2,
    /// Angular velocity in rad/s
    #[serde(default)]
    pub angular_vel: f64,
    /// Detection quality in [0, 1]
    #[serde(default = "full_quality")]
    pub quality: f64,
}

fn full_quality() -> f64 {
    1.0
}

impl FilteredVisionBot {
    pub fn to_bot_state(&self) -> BotState {
        BotState::new(self.id, self.pos, self.orientation, BotStateSource::Filtered)
            .with_vel(self.vel, self.angular_vel)
    }
}

/// The ball as estimated by the vision filter.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FilteredVisionBall {
    pub pos: Vector3,
    pub vel: Vector3,
    #[serde(default = "Vector3::zeros")]
    pub acc: Vector3,
    #[serde(default)]
    pub chipped: bool,
    #[serde(default)]
    pub last_visible: DiesInstant,
}

impl Default for FilteredVisionBall {
    fn default() -> Self {
        Self {
            pos: Vector3::zeros(),
            vel: Vector3::zeros(),
            acc: Vector3::zeros(),
            chipped: false,
            last_visible: DiesInstant::ZERO,
        }
    }
}

/// One output frame of the vision filter.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FilteredVisionFrame {
    /// Monotonically increasing frame number
    pub id: u64,
    pub timestamp: DiesInstant,
    #[serde(default)]
    pub bots: Vec<FilteredVisionBot>,
    #[serde(default)]
    pub ball: FilteredVisionBall,
    /// A kick detected in this frame
    #[serde(default)]
    pub kick_event: Option<KickEvent>,
    #[serde(default)]
    pub kick_fit_state: Option<BallKickFitState>,
    /// Debug shapes produced by the vision filter
    #[serde(default)]
    pub shapes: ShapeMap,
}

/// A ball detection of a single camera.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CamBall {
    pub camera_id: u32,
    /// Detection confidence in [0, 1]
    pub confidence: f64,
    /// Position in mm
    pub pos: Vector3,
    /// Capture time of the frame the ball was detected in
    pub t_capture: DiesInstant,
}

/// The raw detections of one camera frame.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CamDetectionFrame {
    pub camera_id: u32,
    pub frame_number: u64,
    pub t_capture: DiesInstant,
    #[serde(default)]
    pub balls: Vec<CamBall>,
}

/// A camera frame together with the ball considered the real one.
#[derive(Serialize, Clone, Debug)]
pub struct ExtendedCamDetectionFrame {
    pub frame: CamDetectionFrame,
    pub ball: Option<CamBall>,
}
