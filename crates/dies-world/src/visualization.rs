use std::collections::VecDeque;

use dies_core::{
    DebugColor, DebugShape, ShapeMap, TeamColor, Vector2, WorldFrameWrapper, BALL_RADIUS,
};

const BOT_RADIUS: f64 = 90.0;
const BALL_TRAIL_LEN: usize = 30;
/// Length of the kick velocity line per mm/s of kick speed
const KICK_LINE_SCALE: f64 = 0.25;

/// Builds debug shapes from world frames.
#[derive(Debug, Default)]
pub struct WorldFrameVisualization {
    ball_trail: VecDeque<Vector2>,
}

impl WorldFrameVisualization {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.ball_trail.clear();
    }

    pub fn process(&mut self, frame: &WorldFrameWrapper) -> ShapeMap {
        let mut shapes = ShapeMap::new();
        let swf = &frame.simple_world_frame;

        // Ball
        let ball = &swf.ball;
        let ball_pos = ball.pos2();
        let ball_color = if ball.chipped {
            DebugColor::Red
        } else {
            DebugColor::Orange
        };
        shapes.add("BALL", DebugShape::circle_fill(ball_pos, BALL_RADIUS, ball_color));
        for radius in [105.0, 120.0] {
            shapes.add(
                "BALL_DISTANCE",
                DebugShape::circle_stroke(ball_pos, radius, DebugColor::Yellow),
            );
        }
        shapes.add(
            "BALL_STOP_POS",
            DebugShape::cross(ball.stop_position(), ball_color),
        );

        if self.ball_trail.len() == BALL_TRAIL_LEN {
            self.ball_trail.pop_front();
        }
        self.ball_trail.push_back(ball_pos);
        for (start, end) in self.ball_trail.iter().zip(self.ball_trail.iter().skip(1)) {
            shapes.add("BALL_TRAIL", DebugShape::line(*start, *end, DebugColor::Orange));
        }

        // Bots
        for bot in swf.bots.values() {
            let color = match bot.id.color {
                TeamColor::Blue => DebugColor::Blue,
                TeamColor::Yellow => DebugColor::Yellow,
            };
            let pos = bot.state.pos;
            shapes.add("BOTS", DebugShape::circle_stroke(pos, BOT_RADIUS, color));
            let heading = pos + bot.state.orientation.to_vector() * BOT_RADIUS;
            shapes.add("BOTS", DebugShape::line(pos, heading, color));
            if bot.ball_contact {
                shapes.add(
                    "BALL_CONTACT",
                    DebugShape::circle_fill(pos, BOT_RADIUS / 3.0, DebugColor::Green),
                );
            }
            if frame.bots_to_interchange.contains(&bot.id) {
                shapes.add("INTERCHANGE", DebugShape::cross(pos, DebugColor::Purple));
            }
        }

        if let Some(kick) = swf.kick_event.as_ref() {
            let end = kick.position + kick.kick_vel.xy() * KICK_LINE_SCALE;
            shapes.add("KICK", DebugShape::line(kick.position, end, DebugColor::Red));
            shapes.add("KICK", DebugShape::cross(kick.position, DebugColor::Red));
        }

        if let Some(exit) = frame.game_state.ball_exit_pos() {
            shapes.add("BALL_EXIT", DebugShape::cross(exit, DebugColor::Purple));
        }

        shapes
    }
}
