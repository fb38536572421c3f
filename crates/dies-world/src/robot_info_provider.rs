use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, RwLock},
};

use dies_core::{BotId, DiesInstant, RobotInfo};

/// Source of robot telemetry, usually the robot link.
pub trait RobotInfoProvider: Send {
    /// Ids of all robots we currently have a link to.
    fn connected_bot_ids(&self) -> BTreeSet<BotId>;

    /// Telemetry of a robot. Robots without a link get an unconnected record.
    fn robot_info(&self, id: BotId) -> RobotInfo;

    /// Called with the timestamp of each world frame before any lookup.
    fn set_last_wf_timestamp(&mut self, _timestamp: DiesInstant) {}
}

/// Receives the robot info of each frame, so the vision filter can use robot
/// feedback.
pub trait VisionFilterFeedback: Send {
    fn set_robot_info_map(&mut self, infos: &BTreeMap<BotId, RobotInfo>);
}

/// A [`RobotInfoProvider`] backed by a map that can be written from elsewhere,
/// eg. from the thread receiving robot feedback.
#[derive(Debug, Clone, Default)]
pub struct SharedRobotInfo {
    infos: Arc<RwLock<BTreeMap<BotId, RobotInfo>>>,
    last_wf_timestamp: DiesInstant,
}

impl SharedRobotInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the info of a robot.
    pub fn update(&self, info: RobotInfo) {
        let mut infos = self.infos.write().unwrap_or_else(|err| err.into_inner());
        infos.insert(info.id, info);
    }

    pub fn remove(&self, id: BotId) -> Option<RobotInfo> {
        let mut infos = self.infos.write().unwrap_or_else(|err| err.into_inner());
        infos.remove(&id)
    }
}

impl RobotInfoProvider for SharedRobotInfo {
    fn connected_bot_ids(&self) -> BTreeSet<BotId> {
        let infos = self.infos.read().unwrap_or_else(|err| err.into_inner());
        infos
            .values()
            .filter(|info| info.connected)
            .map(|info| info.id)
            .collect()
    }

    fn robot_info(&self, id: BotId) -> RobotInfo {
        let infos = self.infos.read().unwrap_or_else(|err| err.into_inner());
        let mut info = infos
            .get(&id)
            .cloned()
            .unwrap_or_else(|| RobotInfo::unconnected(id));
        info.timestamp = self.last_wf_timestamp;
        info
    }

    fn set_last_wf_timestamp(&mut self, timestamp: DiesInstant) {
        self.last_wf_timestamp = timestamp;
    }
}
