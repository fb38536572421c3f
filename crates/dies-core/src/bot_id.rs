use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TeamColor {
    Blue,
    Yellow,
}

/// A robot, identified by its number and team color.
///
/// Ordering is by team first, then by number, so maps keyed by `BotId` iterate
/// in a stable order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct BotId {
    pub color: TeamColor,
    pub number: u32,
}

impl BotId {
    pub fn new(color: TeamColor, number: u32) -> Self {
        Self { color, number }
    }

    pub fn blue(number: u32) -> Self {
        Self::new(TeamColor::Blue, number)
    }

    pub fn yellow(number: u32) -> Self {
        Self::new(TeamColor::Yellow, number)
    }
}

impl std::fmt::Display for BotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self.color {
            TeamColor::Blue => 'B',
            TeamColor::Yellow => 'Y',
        };
        write!(f, "{}{}", self.number, c)
    }
}

/// The side the two teams are assigned to.
///
/// `BluePositive` means that the blue team's goal is the positive side of the field.
/// `YellowPositive` means that the yellow team's goal is the positive side of the field.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SideAssignment {
    BluePositive,
    #[default]
    YellowPositive,
}
