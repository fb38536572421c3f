use std::collections::HashMap;

use dies_core::{BotId, BotState, DiesInstant, RobotInfo, TimedTrajectory, WorldSettings};

/// Result of evaluating the trajectory hold for one robot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldOutcome {
    /// The state to publish
    pub state: BotState,
    /// The state of the buffered trajectory at this frame, if there is one
    pub traj_state: Option<BotState>,
}

/// Holds the state of a robot's own trajectory while it stays close to the fused
/// estimate.
///
/// The first trajectory a robot reports is buffered and evaluated on every
/// following frame. As long as it stays within `max_position_diff` of the fused
/// state, its state is published instead of the fused one. Once it drifts away
/// the buffer is dropped and the next reported trajectory is buffered fresh.
#[derive(Debug, Default)]
pub struct TrajectoryHoldCalculator {
    buffered: HashMap<BotId, TimedTrajectory>,
    latest: HashMap<BotId, BotState>,
    prefer_traj_state: bool,
    max_position_diff: f64,
}

impl TrajectoryHoldCalculator {
    pub fn new(settings: &WorldSettings) -> Self {
        Self {
            buffered: HashMap::new(),
            latest: HashMap::new(),
            prefer_traj_state: settings.prefer_traj_state,
            max_position_diff: settings.max_position_diff,
        }
    }

    pub fn update_settings(&mut self, settings: &WorldSettings) {
        self.prefer_traj_state = settings.prefer_traj_state;
        self.max_position_diff = settings.max_position_diff;
    }

    /// Decide which state to publish for a robot, given its fused state.
    pub fn apply(&mut self, info: &RobotInfo, fused: BotState, now: DiesInstant) -> HoldOutcome {
        let Some((traj_state, fresh)) = self.traj_state(info, now) else {
            return HoldOutcome {
                state: fused,
                traj_state: None,
            };
        };

        let similar = traj_state.distance_sqr(&fused) < self.max_position_diff.powi(2);
        if !similar {
            log::debug!("Trajectory of {} deviates from fused state, dropping it", info.id);
            self.reset(info.id);
            return HoldOutcome {
                state: fused,
                traj_state: Some(traj_state),
            };
        }

        let state = if self.prefer_traj_state && !fresh {
            self.latest_state(info.id).unwrap_or(fused)
        } else {
            fused
        };
        HoldOutcome {
            state,
            traj_state: Some(traj_state),
        }
    }

    /// Evaluate the buffered trajectory of a robot, buffering the reported one if
    /// there is none yet. The flag is set if the trajectory was buffered just now.
    fn traj_state(&mut self, info: &RobotInfo, now: DiesInstant) -> Option<(BotState, bool)> {
        let Some(reported) = info.trajectory.as_ref() else {
            self.reset(info.id);
            return None;
        };
        let mut fresh = false;
        let buffered = self.buffered.entry(info.id).or_insert_with(|| {
            fresh = true;
            reported.clone()
        });
        let state = buffered.state_at(info.id, now);
        self.latest.insert(info.id, state);
        Some((state, fresh))
    }

    /// The state of the buffered trajectory as evaluated on the last frame.
    pub fn latest_state(&self, id: BotId) -> Option<BotState> {
        self.latest.get(&id).copied()
    }

    /// Whether a trajectory is buffered for the robot.
    pub fn is_buffered(&self, id: BotId) -> bool {
        self.buffered.contains_key(&id)
    }

    /// Drop the buffered trajectory of a robot.
    pub fn reset(&mut self, id: BotId) {
        self.buffered.remove(&id);
        self.latest.remove(&id);
    }

    /// Drop all buffered trajectories.
    pub fn clear(&mut self) {
        self.buffered.clear();
        self.latest.clear();
    }
}
