use std::cmp::Ordering;

use dies_core::{CamBall, DiesInstant, FieldGeometry, WorldSettings};

/// Picks the real ball among the ball detections of the cameras.
///
/// Detections outside the boundary walls are ignored. Selection policy:
/// 1. While the previously selected ball was seen less than
///    `ball_switch_timeout` ago, the candidate closest to it (planar distance)
///    within `ball_continuity_radius` is selected.
/// 2. Otherwise the best candidate by [`rank`] is selected: highest
///    confidence, then latest capture time, then lowest camera id, then lowest
///    x and y position.
/// 3. Without candidates the previous selection is kept until it times out.
///
/// Ties in step 1 are broken by [`rank`] as well, so the result never depends
/// on the order of the candidates.
#[derive(Debug, Clone)]
pub struct CurrentBallDetector {
    last: Option<CamBall>,
    continuity_radius: f64,
    switch_timeout: f64,
    field: FieldGeometry,
}

impl CurrentBallDetector {
    pub fn new(settings: &WorldSettings) -> Self {
        Self {
            last: None,
            continuity_radius: settings.ball_continuity_radius,
            switch_timeout: settings.ball_switch_timeout,
            field: settings.field.clone(),
        }
    }

    pub fn update_settings(&mut self, settings: &WorldSettings) {
        self.continuity_radius = settings.ball_continuity_radius;
        self.switch_timeout = settings.ball_switch_timeout;
        self.field = settings.field.clone();
    }

    pub fn find_current_ball(&mut self, balls: &[CamBall], now: DiesInstant) -> Option<CamBall> {
        if let Some(last) = &self.last {
            if now.duration_since(&last.t_capture) > self.switch_timeout {
                log::debug!("Lost track of ball at {:?}", last.pos);
                self.last = None;
            }
        }

        let balls: Vec<&CamBall> = balls
            .iter()
            .filter(|b| self.field.is_inside_walls(b.pos.xy()))
            .collect();

        let continued = self.last.as_ref().and_then(|last| {
            let dist = |b: &CamBall| (b.pos.xy() - last.pos.xy()).norm();
            balls
                .iter()
                .copied()
                .filter(|b| dist(b) <= self.continuity_radius)
                .min_by(|a, b| dist(a).total_cmp(&dist(b)).then_with(|| rank(a, b)))
        });

        let selected = match continued {
            Some(ball) => Some(ball.clone()),
            None => balls.iter().copied().min_by(|a, b| rank(a, b)).cloned(),
        };

        match selected {
            Some(ball) => {
                self.last = Some(ball.clone());
                Some(ball)
            }
            None => self.last.clone(),
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Orders candidates from best to worst, independent of camera context.
fn rank(a: &CamBall, b: &CamBall) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| {
            b.t_capture
                .as_secs_f64()
                .total_cmp(&a.t_capture.as_secs_f64())
        })
        .then_with(|| a.camera_id.cmp(&b.camera_id))
        .then_with(|| a.pos.x.total_cmp(&b.pos.x))
        .then_with(|| a.pos.y.total_cmp(&b.pos.y))
}
