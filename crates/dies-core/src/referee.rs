use serde::{Deserialize, Serialize};

use crate::{DiesInstant, TeamColor, Vector2};

/// Referee commands, named as in the SSL game controller protocol.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefCommand {
    Halt,
    Stop,
    NormalStart,
    ForceStart,
    PrepareKickoffYellow,
    PrepareKickoffBlue,
    PreparePenaltyYellow,
    PreparePenaltyBlue,
    DirectFreeYellow,
    DirectFreeBlue,
    IndirectFreeYellow,
    IndirectFreeBlue,
    TimeoutYellow,
    TimeoutBlue,
    GoalYellow,
    GoalBlue,
    BallPlacementYellow,
    BallPlacementBlue,
}

impl RefCommand {
    /// The team a command is addressed to, if it is asymmetric.
    pub fn team(&self) -> Option<TeamColor> {
        match self {
            RefCommand::PrepareKickoffBlue
            | RefCommand::PreparePenaltyBlue
            | RefCommand::DirectFreeBlue
            | RefCommand::IndirectFreeBlue
            | RefCommand::TimeoutBlue
            | RefCommand::GoalBlue
            | RefCommand::BallPlacementBlue => Some(TeamColor::Blue),
            RefCommand::PrepareKickoffYellow
            | RefCommand::PreparePenaltyYellow
            | RefCommand::DirectFreeYellow
            | RefCommand::IndirectFreeYellow
            | RefCommand::TimeoutYellow
            | RefCommand::GoalYellow
            | RefCommand::BallPlacementYellow => Some(TeamColor::Yellow),
            _ => None,
        }
    }

    /// Whether the game is stopped in a way that allows robots to be substituted.
    pub fn is_stoppage(&self) -> bool {
        matches!(
            self,
            RefCommand::Halt | RefCommand::Stop | RefCommand::TimeoutYellow | RefCommand::TimeoutBlue
        )
    }
}

/// Per-team information of a referee message.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TeamInfo {
    pub name: String,
    /// Number of the designated goalkeeper
    pub goalie: u32,
    /// Whether the team may currently substitute robots
    #[serde(default)]
    pub bot_substitution_allowed: bool,
    /// Number of robots the team may have on the field
    #[serde(default)]
    pub max_allowed_bots: Option<u32>,
}

impl Default for TeamInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            goalie: 0,
            bot_substitution_allowed: false,
            max_allowed_bots: None,
        }
    }
}

/// A decoded referee message.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RefereeMsg {
    pub command: RefCommand,
    /// Incremented by the game controller for every new command
    pub command_counter: u32,
    /// Timestamp of the world frame during which the current command was first
    /// received. Assigned on reception.
    #[serde(default)]
    pub frame_timestamp: DiesInstant,
    #[serde(default)]
    pub blue: TeamInfo,
    #[serde(default)]
    pub yellow: TeamInfo,
    /// Target position of a ball placement, in mm
    #[serde(default)]
    pub designated_position: Option<Vector2>,
    #[serde(default)]
    pub blue_team_on_positive_half: Option<bool>,
}

impl RefereeMsg {
    pub fn new(command: RefCommand, command_counter: u32) -> Self {
        Self {
            command,
            command_counter,
            frame_timestamp: DiesInstant::ZERO,
            blue: TeamInfo::default(),
            yellow: TeamInfo::default(),
            designated_position: None,
            blue_team_on_positive_half: None,
        }
    }

    pub fn with_frame_timestamp(mut self, frame_timestamp: DiesInstant) -> Self {
        self.frame_timestamp = frame_timestamp;
        self
    }

    pub fn team_info(&self, color: TeamColor) -> &TeamInfo {
        match color {
            TeamColor::Blue => &self.blue,
            TeamColor::Yellow => &self.yellow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_use_protocol_names() {
        let msg: RefereeMsg =
            serde_json::from_str(r#"{"command": "FORCE_START", "command_counter": 5}"#).unwrap();
        assert_eq!(msg.command, RefCommand::ForceStart);
        assert_eq!(msg.command_counter, 5);
        assert_eq!(msg.frame_timestamp, DiesInstant::ZERO);
    }

    #[test]
    fn command_team() {
        assert_eq!(RefCommand::DirectFreeBlue.team(), Some(TeamColor::Blue));
        assert_eq!(RefCommand::BallPlacementYellow.team(), Some(TeamColor::Yellow));
        assert_eq!(RefCommand::Stop.team(), None);
    }
}
