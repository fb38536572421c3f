use serde::{Deserialize, Serialize};

use crate::{TeamColor, Vector2};

/// The game state, derived from referee commands and ball movement.
#[derive(Serialize, Deserialize, Clone, Debug, Copy, Default, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum GameStateType {
    #[default]
    Unknown,
    Halt,
    Timeout,
    Stop,
    PrepareKickoff,
    /// Automatic ball placement in progress with the given target location
    BallPlacement(Vector2),
    PreparePenalty,
    Kickoff,
    FreeKick,
    Penalty,
    PenaltyRun,
    Run,
    /// The ball left the field at the given position while the game was running
    BallLeftField(Vector2),
}

impl std::fmt::Display for GameStateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            GameStateType::Unknown => "Unknown",
            GameStateType::Halt => "Halt",
            GameStateType::Timeout => "Timeout",
            GameStateType::Stop => "Stop",
            GameStateType::PrepareKickoff => "PrepareKickoff",
            GameStateType::BallPlacement(_) => "BallPlacement",
            GameStateType::PreparePenalty => "PreparePenalty",
            GameStateType::Kickoff => "Kickoff",
            GameStateType::FreeKick => "FreeKick",
            GameStateType::Penalty => "Penalty",
            GameStateType::PenaltyRun => "PenaltyRun",
            GameStateType::Run => "Run",
            GameStateType::BallLeftField(_) => "BallLeftField",
        };
        write!(f, "{}", str)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GameState {
    /// The state of current game
    pub state_type: GameStateType,
    /// The team (if any) currently operating in asymmetric states
    pub operating_team: Option<TeamColor>,
}

impl GameState {
    /// Where the ball left the field, if the game is in that state.
    pub fn ball_exit_pos(&self) -> Option<Vector2> {
        match self.state_type {
            GameStateType::BallLeftField(pos) => Some(pos),
            _ => None,
        }
    }
}
