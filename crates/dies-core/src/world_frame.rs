use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use serde::{Serialize, Serializer};

use crate::{
    BallKickFitState, BotId, BotState, DiesInstant, GameState, KickEvent, RefereeMsg, RobotInfo,
    SideAssignment, TrackedBall,
};

/// The fused record of one robot in one frame.
#[derive(Serialize, Clone, Debug)]
pub struct TrackedBot {
    pub id: BotId,
    pub timestamp: DiesInstant,
    /// The fused state
    pub state: BotState,
    /// The state estimated by the vision filter, if the robot was seen
    pub filtered_state: Option<BotState>,
    /// The state of the buffered trajectory, if any
    pub buffered_traj_state: Option<BotState>,
    /// Whether the robot touches the ball
    pub ball_contact: bool,
    pub robot_info: RobotInfo,
}

/// The world as seen by the world predictor, without referee information.
#[derive(Serialize, Clone, Debug)]
pub struct SimpleWorldFrame {
    /// Id of the vision frame this world frame was built from
    pub frame_number: u64,
    pub timestamp: DiesInstant,
    /// Serialized as a list, since JSON map keys must be strings
    #[serde(serialize_with = "serialize_map_values")]
    pub bots: BTreeMap<BotId, TrackedBot>,
    pub ball: TrackedBall,
    pub kick_event: Option<Arc<KickEvent>>,
    pub kick_fit_state: Option<BallKickFitState>,
}

/// One complete, immutable world frame as handed to consumers.
#[derive(Serialize, Clone, Debug)]
pub struct WorldFrameWrapper {
    pub simple_world_frame: SimpleWorldFrame,
    /// The latest referee message, if any was received
    pub referee_msg: Option<Arc<RefereeMsg>>,
    pub game_state: GameState,
    /// Robots that should be substituted
    pub bots_to_interchange: BTreeSet<BotId>,
    pub side_assignment: SideAssignment,
}

impl WorldFrameWrapper {
    pub fn timestamp(&self) -> DiesInstant {
        self.simple_world_frame.timestamp
    }

    pub fn frame_number(&self) -> u64 {
        self.simple_world_frame.frame_number
    }

    pub fn bot(&self, id: &BotId) -> Option<&TrackedBot> {
        self.simple_world_frame.bots.get(id)
    }
}

fn serialize_map_values<S, K, V>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    serializer.collect_seq(map.values())
}
