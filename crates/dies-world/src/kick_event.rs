use std::sync::Arc;

use dies_core::{KickEvent, Vector3, WorldSettings};

/// Keeps the latest kick event alive until the ball stops.
///
/// The tracker is either armed (it holds a kick event) or idle. The held event
/// is shared by reference between frames: consumers can compare frames with
/// [`Arc::ptr_eq`] to find out whether they see the same kick.
#[derive(Debug, Default)]
pub struct KickEventTracker {
    current: Option<Arc<KickEvent>>,
    stop_speed: f64,
}

impl KickEventTracker {
    pub fn new(settings: &WorldSettings) -> Self {
        Self {
            current: None,
            stop_speed: settings.kick_event_stop_speed,
        }
    }

    pub fn update_settings(&mut self, settings: &WorldSettings) {
        self.stop_speed = settings.kick_event_stop_speed;
    }

    /// Update the tracker with the kick event reported in this frame (if any)
    /// and the current ball velocity.
    pub fn update(
        &mut self,
        new_event: Option<&KickEvent>,
        ball_vel: &Vector3,
    ) -> Option<Arc<KickEvent>> {
        match new_event {
            // The vision filter keeps reporting a kick for a while
            Some(event) if self.current.as_deref() == Some(event) => {}
            Some(event) => {
                log::debug!(
                    "Kick by {} at {} with {:.0} mm/s",
                    event.kicking_bot,
                    event.timestamp,
                    event.kick_speed()
                );
                self.current = Some(Arc::new(event.clone()));
            }
            None => {
                let speed = ball_vel.xy().norm();
                let stopped = speed.is_nan() || speed < self.stop_speed;
                if stopped && self.current.take().is_some() {
                    log::debug!("Ball stopped, kick event cleared");
                }
            }
        }
        self.current.clone()
    }

    pub fn current(&self) -> Option<&Arc<KickEvent>> {
        self.current.as_ref()
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use dies_core::{BotId, DiesInstant, Vector2};

    use super::*;

    fn kick(t: f64) -> KickEvent {
        KickEvent {
            kicking_bot: BotId::blue(3),
            timestamp: DiesInstant::from_secs(t),
            position: Vector2::new(100.0, 0.0),
            kick_vel: Vector3::new(3000.0, 0.0, 0.0),
            trajectory_start_time: DiesInstant::from_secs(t),
        }
    }

    fn tracker() -> KickEventTracker {
        KickEventTracker::new(&WorldSettings::default())
    }

    #[test]
    fn event_persists_while_ball_rolls() {
        let mut tracker = tracker();
        let moving = Vector3::new(2000.0, 0.0, 0.0);
        let armed = tracker.update(Some(&kick(1.0)), &moving).unwrap();

        for _ in 0..5 {
            let held = tracker.update(None, &moving).unwrap();
            assert!(Arc::ptr_eq(&armed, &held));
        }
    }

    #[test]
    fn repeated_event_keeps_identity() {
        let mut tracker = tracker();
        let moving = Vector3::new(2000.0, 0.0, 0.0);
        let first = tracker.update(Some(&kick(1.0)), &moving).unwrap();
        let second = tracker.update(Some(&kick(1.0)), &moving).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let newer = tracker.update(Some(&kick(2.0)), &moving).unwrap();
        assert!(!Arc::ptr_eq(&first, &newer));
        assert_eq!(newer.timestamp, DiesInstant::from_secs(2.0));
    }

    #[test]
    fn goes_idle_when_ball_stops() {
        let mut tracker = tracker();
        tracker.update(Some(&kick(1.0)), &Vector3::new(2000.0, 0.0, 0.0));
        assert!(tracker
            .update(None, &Vector3::new(150.0, 0.0, 0.0))
            .is_some());
        assert!(tracker.update(None, &Vector3::new(50.0, 0.0, 0.0)).is_none());
        assert!(tracker.current().is_none());
    }

    #[test]
    fn new_event_arms_even_with_slow_ball() {
        let mut tracker = tracker();
        assert!(tracker.update(Some(&kick(1.0)), &Vector3::zeros()).is_some());
    }

    #[test]
    fn vertical_speed_is_ignored() {
        let mut tracker = tracker();
        tracker.update(Some(&kick(1.0)), &Vector3::new(2000.0, 0.0, 0.0));
        assert!(tracker
            .update(None, &Vector3::new(0.0, 0.0, 2000.0))
            .is_none());
    }

    #[test]
    fn reset_forces_idle() {
        let mut tracker = tracker();
        tracker.update(Some(&kick(1.0)), &Vector3::new(2000.0, 0.0, 0.0));
        tracker.reset();
        tracker.reset();
        assert!(tracker
            .update(None, &Vector3::new(2000.0, 0.0, 0.0))
            .is_none());
    }
}
