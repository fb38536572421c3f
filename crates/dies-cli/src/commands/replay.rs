use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
    sync::Arc,
};

use anyhow::{Context, Result};
use dies_core::{
    Angle, BotId, BotState, BotStateSource, CamDetectionFrame, DiesInstant, FilteredVisionFrame,
    RefereeMsg, RobotInfo, TimedTrajectory, Vector2, Waypoint, WaypointTrajectory,
    WorldFrameWrapper, WorldSettings, DEFAULT_CENTER_TO_DRIBBLER,
};
use dies_world::{CollectorContext, SharedRobotInfo, WorldInfoCollector};
use serde::Deserialize;
use tokio::sync::mpsc;

/// One line of a replay file.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    RobotInfo(RobotReport),
    Vision(FilteredVisionFrame),
    Referee(RefereeMsg),
    Cam(CamDetectionFrame),
    Clear,
}

/// Telemetry of one robot as written in a replay file.
#[derive(Debug, Deserialize)]
pub struct RobotReport {
    pub id: BotId,
    #[serde(default = "yes")]
    pub connected: bool,
    #[serde(default)]
    pub internal_state: Option<PoseReport>,
    #[serde(default)]
    pub center_to_dribbler: Option<f64>,
    #[serde(default)]
    pub trajectory: Option<TrajectoryReport>,
    #[serde(default)]
    pub barrier_interrupted: bool,
    #[serde(default = "yes")]
    pub healthy: bool,
    #[serde(default)]
    pub reported_goalie: bool,
}

#[derive(Debug, Deserialize)]
pub struct PoseReport {
    pub pos: Vector2,
    pub orientation: Angle,
    #[serde(default = "Vector2::zeros")]
    pub vel: Vector2,
    #[serde(default)]
    pub angular_vel: f64,
}

#[derive(Debug, Deserialize)]
pub struct TrajectoryReport {
    pub start: DiesInstant,
    pub waypoints: Vec<Waypoint>,
}

fn yes() -> bool {
    true
}

impl RobotReport {
    pub fn into_robot_info(self) -> RobotInfo {
        let id = self.id;
        let mut info = if self.connected {
            RobotInfo::connected(id)
        } else {
            RobotInfo::unconnected(id)
        };
        if let Some(pose) = self.internal_state {
            info = info.with_internal_state(
                BotState::new(id, pose.pos, pose.orientation, BotStateSource::Internal)
                    .with_vel(pose.vel, pose.angular_vel),
            );
        }
        if let Some(report) = self.trajectory {
            match WaypointTrajectory::new(report.waypoints) {
                Some(traj) => {
                    info = info.with_trajectory(TimedTrajectory::new(report.start, Arc::new(traj)));
                }
                None => tracing::warn!("Ignoring empty trajectory of {}", id),
            }
        }
        info.center_to_dribbler = self.center_to_dribbler.unwrap_or(DEFAULT_CENTER_TO_DRIBBLER);
        info.barrier_interrupted = self.barrier_interrupted;
        info.healthy = self.healthy;
        info.reported_goalie = self.reported_goalie;
        info
    }
}

/// Parse a replay file. Empty lines and lines starting with `#` are skipped.
pub fn read_events(reader: impl BufRead) -> Result<Vec<ReplayEvent>> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", idx + 1))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(line)
            .with_context(|| format!("Invalid event on line {}", idx + 1))?;
        events.push(event);
    }
    Ok(events)
}

/// Replay an event file and write every world frame as a JSON line. Returns the
/// number of frames written.
pub async fn replay(input: &Path, output: Option<&Path>, settings: WorldSettings) -> Result<usize> {
    let file = File::open(input)
        .with_context(|| format!("Failed to open replay file {}", input.display()))?;
    let events = read_events(BufReader::new(file))?;
    tracing::info!("Replaying {} events from {}", events.len(), input.display());

    let writer: Box<dyn Write + Send> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output file {}", path.display())
        })?)),
        None => Box::new(io::stdout()),
    };

    let (frame_tx, frame_rx) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_frames(frame_rx, writer));

    let robots = SharedRobotInfo::new();
    let collector = WorldInfoCollector::new(settings, CollectorContext::new(robots.clone()));
    collector.start();
    collector.add_consumer(frame_tx)?;

    for event in events {
        match event {
            ReplayEvent::RobotInfo(report) => robots.update(report.into_robot_info()),
            ReplayEvent::Vision(frame) => {
                collector.on_new_filtered_vision_frame(&frame);
            }
            ReplayEvent::Referee(msg) => collector.on_new_referee_msg(msg),
            ReplayEvent::Cam(frame) => {
                collector.on_new_cam_detection_frame(frame);
            }
            ReplayEvent::Clear => collector.on_clear(),
        }
    }

    // Dropping the collector closes the consumer queue, which ends the writer
    drop(collector);
    writer_task.await.context("Frame writer failed")?
}

async fn write_frames(
    mut frame_rx: mpsc::UnboundedReceiver<Arc<WorldFrameWrapper>>,
    mut writer: Box<dyn Write + Send>,
) -> Result<usize> {
    let mut count = 0;
    while let Some(frame) = frame_rx.recv().await {
        let line = serde_json::to_string(frame.as_ref()).context("Failed to serialize frame")?;
        writeln!(writer, "{}", line).context("Failed to write frame")?;
        count += 1;
    }
    writer.flush().context("Failed to flush output")?;
    Ok(count)
}
