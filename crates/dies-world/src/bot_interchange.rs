use std::collections::{BTreeMap, BTreeSet};

use dies_core::{BotId, RefereeMsg, TeamColor, TeamInfo, TrackedBot};

/// Finds the robots that should leave the field for a substitute.
///
/// Substitution is driven by the referee: nothing is flagged unless the game is
/// stopped and the team is allowed to substitute. Within a team, these robots
/// are flagged:
///  - robots that report themselves unhealthy
///  - robots that play goalkeeper but are not the designated goalie
///  - the robots exceeding the allowed number, highest numbers first and the
///    designated goalie last
///
/// Only connected robots are considered, since we cannot swap anything else.
#[derive(Debug, Default, Clone, Copy)]
pub struct BotInterchangeCalculator;

impl BotInterchangeCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn bots_to_interchange(
        &self,
        bots: &BTreeMap<BotId, TrackedBot>,
        referee_msg: Option<&RefereeMsg>,
    ) -> BTreeSet<BotId> {
        let Some(msg) = referee_msg else {
            return BTreeSet::new();
        };
        if !msg.command.is_stoppage() {
            return BTreeSet::new();
        }

        [TeamColor::Blue, TeamColor::Yellow]
            .into_iter()
            .filter(|color| msg.team_info(*color).bot_substitution_allowed)
            .flat_map(|color| team_interchange(bots, color, msg.team_info(color)))
            .collect()
    }
}

fn team_interchange(
    bots: &BTreeMap<BotId, TrackedBot>,
    color: TeamColor,
    team: &TeamInfo,
) -> Vec<BotId> {
    let (mut flagged, mut remaining): (Vec<&TrackedBot>, Vec<&TrackedBot>) = bots
        .values()
        .filter(|bot| bot.id.color == color && bot.robot_info.connected)
        .partition(|bot| {
            let info = &bot.robot_info;
            !info.healthy || (info.reported_goalie && bot.id.number != team.goalie)
        });

    if let Some(max) = team.max_allowed_bots {
        let excess = remaining.len().saturating_sub(max as usize);
        if excess > 0 {
            remaining.sort_by_key(|bot| {
                (
                    bot.id.number == team.goalie,
                    std::cmp::Reverse(bot.id.number),
                )
            });
            flagged.extend(remaining.into_iter().take(excess));
        }
    }

    let ids: Vec<BotId> = flagged.into_iter().map(|bot| bot.id).collect();
    if !ids.is_empty() {
        log::debug!("Bots to interchange for {:?}: {:?}", color, ids);
    }
    ids
}
