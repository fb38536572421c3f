use std::{fmt::Debug, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{Angle, BotId, BotState, BotStateSource, DiesInstant, Vector2};

/// Read access to a motion trajectory a robot is executing.
///
/// Times are relative to the start of the trajectory, in seconds.
pub trait BotTrajectory: Debug + Send + Sync {
    /// Position and heading at time `t`.
    fn pose_at(&self, t: f64) -> (Vector2, Angle);

    /// Linear and angular velocity at time `t`.
    fn vel_at(&self, t: f64) -> (Vector2, f64);

    /// Duration of the trajectory.
    fn total_time(&self) -> f64;
}

/// A trajectory together with the instant it was started at.
#[derive(Debug, Clone)]
pub struct TimedTrajectory {
    pub start: DiesInstant,
    pub trajectory: Arc<dyn BotTrajectory>,
}

impl TimedTrajectory {
    pub fn new(start: DiesInstant, trajectory: Arc<dyn BotTrajectory>) -> Self {
        Self { start, trajectory }
    }

    /// Evaluate the trajectory at an absolute instant. The time is clamped to the
    /// trajectory's duration.
    pub fn state_at(&self, id: BotId, now: DiesInstant) -> BotState {
        let t = now
            .duration_since(&self.start)
            .min(self.trajectory.total_time().max(0.0));
        let (pos, orientation) = self.trajectory.pose_at(t);
        let (vel, angular_vel) = self.trajectory.vel_at(t);
        BotState::new(id, pos, orientation, BotStateSource::Trajectory).with_vel(vel, angular_vel)
    }

}

/// A timed pose sample of a [`WaypointTrajectory`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    /// Seconds since the start of the trajectory
    pub t: f64,
    pub pos: Vector2,
    pub orientation: Angle,
}

/// A trajectory that interpolates linearly between timed waypoints.
///
/// Always holds at least one waypoint, also when deserialized.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "WaypointList")]
pub struct WaypointTrajectory {
    waypoints: Vec<Waypoint>,
}

#[derive(Deserialize)]
struct WaypointList {
    waypoints: Vec<Waypoint>,
}

impl TryFrom<WaypointList> for WaypointTrajectory {
    type Error = &'static str;

    fn try_from(list: WaypointList) -> Result<Self, Self::Error> {
        WaypointTrajectory::new(list.waypoints).ok_or("a trajectory needs at least one waypoint")
    }
}

impl WaypointTrajectory {
    /// Create a trajectory from waypoints. Waypoints are sorted by time; returns
    /// `None` if there are none.
    pub fn new(mut waypoints: Vec<Waypoint>) -> Option<Self> {
        if waypoints.is_empty() {
            return None;
        }
        waypoints.sort_by(|a, b| a.t.total_cmp(&b.t));
        Some(Self { waypoints })
    }

    /// A trajectory that stays at a single pose.
    pub fn stationary(pos: Vector2, orientation: Angle) -> Self {
        Self {
            waypoints: vec![Waypoint {
                t: 0.0,
                pos,
                orientation,
            }],
        }
    }

    /// The pair of waypoints enclosing `t` and the interpolation factor.
    fn segment(&self, t: f64) -> (&Waypoint, &Waypoint, f64) {
        let first = &self.waypoints[0];
        if t <= first.t || self.waypoints.len() == 1 {
            return (first, first, 0.0);
        }
        for pair in self.waypoints.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if t <= b.t {
                let span = b.t - a.t;
                let s = if span > f64::EPSILON { (t - a.t) / span } else { 1.0 };
                return (a, b, s);
            }
        }
        let last = &self.waypoints[self.waypoints.len() - 1];
        (last, last, 0.0)
    }
}

impl BotTrajectory for WaypointTrajectory {
    fn pose_at(&self, t: f64) -> (Vector2, Angle) {
        let (a, b, s) = self.segment(t);
        (a.pos + (b.pos - a.pos) * s, a.orientation.lerp(b.orientation, s))
    }

    fn vel_at(&self, t: f64) -> (Vector2, f64) {
        let (a, b, _) = self.segment(t);
        let span = b.t - a.t;
        if span <= f64::EPSILON {
            return (Vector2::zeros(), 0.0);
        }
        (
            (b.pos - a.pos) / span,
            (b.orientation - a.orientation).radians() / span,
        )
    }

    fn total_time(&self) -> f64 {
        self.waypoints[self.waypoints.len() - 1].t
    }
}
