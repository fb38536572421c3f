use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::FieldGeometry;

/// Settings for the `WorldInfoCollector`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Use robot feedback for position and velocity when both feedback and vision
    /// are available.
    pub prefer_robot_feedback: bool,
    /// Prefer the state of the current trajectory that the robot executes.
    pub prefer_traj_state: bool,
    /// Maximum distance between trajectory and fused position for the trajectory
    /// to be held, in mm.
    pub max_position_diff: f64,
    /// Planar ball speed below which the last kick event is dropped, in mm/s.
    pub kick_event_stop_speed: f64,
    /// Maximum distance between the dribbler and the ball center for a robot to
    /// be considered touching the ball, in mm.
    pub ball_contact_tolerance: f64,
    /// Treat an interrupted light barrier as ball contact.
    pub barrier_ball_contact: bool,
    /// Radius around the previously selected camera ball within which candidates
    /// are considered the same ball, in mm.
    pub ball_continuity_radius: f64,
    /// Time after which the previously selected camera ball is forgotten, in s.
    pub ball_switch_timeout: f64,
    /// Distance the ball has to move for a restart to count as taken, in mm.
    pub restart_ball_move_distance: f64,
    /// Time after which a free kick turns into normal play, in s.
    pub free_kick_timeout: f64,
    /// Extra margin beyond the field lines before the ball counts as out, in mm.
    pub ball_out_margin: f64,
    pub field: FieldGeometry,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            prefer_robot_feedback: true,
            prefer_traj_state: true,
            max_position_diff: 100.0,
            kick_event_stop_speed: 100.0,
            ball_contact_tolerance: 40.0,
            barrier_ball_contact: true,
            ball_continuity_radius: 300.0,
            ball_switch_timeout: 0.5,
            restart_ball_move_distance: 50.0,
            free_kick_timeout: 10.0,
            ball_out_margin: 0.0,
            field: FieldGeometry::default(),
        }
    }
}

impl WorldSettings {
    /// Load settings from a JSON file. Returns the defaults if the file does not
    /// exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => {
                let settings: WorldSettings = serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse settings {}", path.display()))?;
                Ok(settings.sanitized())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => {
                Err(err).with_context(|| format!("Failed to read settings {}", path.display()))
            }
        }
    }

    /// Replace invalid thresholds (negative, NaN or infinite) with their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let checks: [(&str, &mut f64, f64); 8] = [
            ("max_position_diff", &mut self.max_position_diff, defaults.max_position_diff),
            (
                "kick_event_stop_speed",
                &mut self.kick_event_stop_speed,
                defaults.kick_event_stop_speed,
            ),
            (
                "ball_contact_tolerance",
                &mut self.ball_contact_tolerance,
                defaults.ball_contact_tolerance,
            ),
            (
                "ball_continuity_radius",
                &mut self.ball_continuity_radius,
                defaults.ball_continuity_radius,
            ),
            (
                "ball_switch_timeout",
                &mut self.ball_switch_timeout,
                defaults.ball_switch_timeout,
            ),
            (
                "restart_ball_move_distance",
                &mut self.restart_ball_move_distance,
                defaults.restart_ball_move_distance,
            ),
            ("free_kick_timeout", &mut self.free_kick_timeout, defaults.free_kick_timeout),
            ("ball_out_margin", &mut self.ball_out_margin, defaults.ball_out_margin),
        ];
        for (name, value, default) in checks {
            if !value.is_finite() || *value < 0.0 {
                log::warn!("Invalid setting {name} = {value}, falling back to {default}");
                *value = default;
            }
        }
        if !self.field.is_valid() {
            log::warn!("Invalid field geometry {:?}, falling back to default", self.field);
            self.field = defaults.field;
        }
        self
    }
}
