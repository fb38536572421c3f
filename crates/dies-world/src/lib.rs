//! Fusion of vision, robot feedback, and referee input into world frames.
//!
//! The [`WorldInfoCollector`] is the entry point. It owns one instance of each
//! calculator and publishes a [`dies_core::WorldFrameWrapper`] for every
//! filtered vision frame it receives.

mod ball_contact;
mod bot_interchange;
mod bot_state_selector;
mod collector;
mod current_ball;
mod dispatch;
mod game_state;
mod kick_event;
mod robot_info_provider;
mod task;
mod trajectory_hold;
mod visualization;

pub use ball_contact::BallContactCalculator;
pub use bot_interchange::BotInterchangeCalculator;
pub use bot_state_selector::BotStateSelector;
pub use collector::{
    CollectorContext, WorldInfoCollector, VISION_FILTER_SHAPE_SOURCE,
    WORLD_PREDICTOR_SHAPE_SOURCE,
};
pub use current_ball::CurrentBallDetector;
pub use dispatch::{
    FrameDispatcher, ObserverEvent, SubscriptionId, WorldFrameConsumer, WorldFrameObserver,
};
pub use game_state::GameStateCalculator;
pub use kick_event::KickEventTracker;
pub use robot_info_provider::{RobotInfoProvider, SharedRobotInfo, VisionFilterFeedback};
pub use task::{spawn_collector, CollectorHandle, CollectorMsg};
pub use trajectory_hold::{HoldOutcome, TrajectoryHoldCalculator};
pub use visualization::WorldFrameVisualization;
