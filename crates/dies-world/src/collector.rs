use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::Result;
use dies_core::{
    BotId, BotState, CamBall, CamDetectionFrame, DiesInstant, ExtendedCamDetectionFrame,
    FilteredVisionBot, FilteredVisionFrame, GameState, RefereeMsg, RobotInfo, SideAssignment,
    SimpleWorldFrame, TrackedBall, TrackedBot, WorldFrameWrapper, WorldSettings,
};

use crate::{
    BallContactCalculator, BotInterchangeCalculator, BotStateSelector, CurrentBallDetector,
    FrameDispatcher, GameStateCalculator, KickEventTracker, ObserverEvent, RobotInfoProvider,
    SubscriptionId, TrajectoryHoldCalculator, VisionFilterFeedback, WorldFrameConsumer,
    WorldFrameObserver, WorldFrameVisualization,
};

/// Shape source name of the world frame visualization.
pub const WORLD_PREDICTOR_SHAPE_SOURCE: &str = "WP";
/// Shape source name of the shapes forwarded from the vision filter.
pub const VISION_FILTER_SHAPE_SOURCE: &str = "VISION_FILTER";

/// The collaborators of the collector.
pub struct CollectorContext {
    pub robot_info: Box<dyn RobotInfoProvider>,
    pub vision_feedback: Option<Box<dyn VisionFilterFeedback>>,
}

impl CollectorContext {
    pub fn new(robot_info: impl RobotInfoProvider + 'static) -> Self {
        Self {
            robot_info: Box::new(robot_info),
            vision_feedback: None,
        }
    }

    pub fn with_vision_feedback(mut self, feedback: impl VisionFilterFeedback + 'static) -> Self {
        self.vision_feedback = Some(Box::new(feedback));
        self
    }
}

struct CollectorState {
    settings: WorldSettings,
    context: CollectorContext,
    selector: BotStateSelector,
    trajectory_hold: TrajectoryHoldCalculator,
    ball_contact: BallContactCalculator,
    ball_detector: CurrentBallDetector,
    kick_tracker: KickEventTracker,
    interchange: BotInterchangeCalculator,
    game_state: GameStateCalculator,
    visualization: WorldFrameVisualization,
    last_wf_timestamp: DiesInstant,
    latest_referee_msg: Option<Arc<RefereeMsg>>,
    side_assignment: SideAssignment,
    last_bot_ids: BTreeSet<BotId>,
    latest_frame: Option<Arc<WorldFrameWrapper>>,
    consumers: FrameDispatcher<Arc<WorldFrameWrapper>>,
    observers: FrameDispatcher<ObserverEvent>,
}

/// Fuses vision, robot feedback, and referee input into world frames.
///
/// All state sits behind one lock, so the input methods can be called from
/// different threads. Frames are assembled and handed to the dispatch queues
/// while holding the lock, which keeps their timestamps in order. Consumers and
/// observers run on their own threads and never block the collector.
pub struct WorldInfoCollector {
    state: Mutex<CollectorState>,
}

impl WorldInfoCollector {
    pub fn new(settings: WorldSettings, context: CollectorContext) -> Self {
        let settings = settings.sanitized();
        let state = CollectorState {
            selector: BotStateSelector::new(&settings),
            trajectory_hold: TrajectoryHoldCalculator::new(&settings),
            ball_contact: BallContactCalculator::new(&settings),
            ball_detector: CurrentBallDetector::new(&settings),
            kick_tracker: KickEventTracker::new(&settings),
            interchange: BotInterchangeCalculator::new(),
            game_state: GameStateCalculator::new(&settings),
            visualization: WorldFrameVisualization::new(),
            last_wf_timestamp: DiesInstant::ZERO,
            latest_referee_msg: None,
            side_assignment: SideAssignment::default(),
            last_bot_ids: BTreeSet::new(),
            latest_frame: None,
            consumers: FrameDispatcher::new("consumer"),
            observers: FrameDispatcher::new("observer"),
            settings,
            context,
        };
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CollectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Prepare for a new run. Registrations left over from a previous run are
    /// dropped.
    pub fn start(&self) {
        let mut state = self.lock();
        let consumers = state.consumers.clear_all();
        let observers = state.observers.clear_all();
        if consumers > 0 || observers > 0 {
            log::warn!(
                "Dropping {} consumers and {} observers left from a previous run",
                consumers,
                observers
            );
        }
        state.reset();
    }

    pub fn update_settings(&self, settings: WorldSettings) {
        let settings = settings.sanitized();
        let mut state = self.lock();
        state.selector.update_settings(&settings);
        state.trajectory_hold.update_settings(&settings);
        state.ball_contact.update_settings(&settings);
        state.ball_detector.update_settings(&settings);
        state.kick_tracker.update_settings(&settings);
        state.game_state.update_settings(&settings);
        state.settings = settings;
        log::debug!("World settings updated");
    }

    pub fn settings(&self) -> WorldSettings {
        self.lock().settings.clone()
    }

    /// Build and publish the world frame for a vision frame.
    pub fn on_new_filtered_vision_frame(
        &self,
        frame: &FilteredVisionFrame,
    ) -> Arc<WorldFrameWrapper> {
        self.lock().process_vision_frame(frame)
    }

    /// Store the latest referee message. It is used from the next world frame on.
    pub fn on_new_referee_msg(&self, msg: RefereeMsg) {
        self.lock().process_referee_msg(msg);
    }

    /// Select the current ball of a camera frame and forward it to observers.
    pub fn on_new_cam_detection_frame(&self, frame: CamDetectionFrame) -> Option<CamBall> {
        let mut state = self.lock();
        let ball = state
            .ball_detector
            .find_current_ball(&frame.balls, frame.t_capture);
        let extended = ExtendedCamDetectionFrame {
            frame,
            ball: ball.clone(),
        };
        state
            .observers
            .dispatch(&ObserverEvent::CamDetectionFrame(Arc::new(extended)));
        ball
    }

    /// Reset everything derived from earlier input.
    pub fn on_clear(&self) {
        let mut state = self.lock();
        state.observers.dispatch(&ObserverEvent::Clear);
        state.reset();
        log::info!("World info collector cleared");
    }

    pub fn add_consumer(&self, mut consumer: impl WorldFrameConsumer) -> Result<SubscriptionId> {
        self.lock()
            .consumers
            .subscribe(move |frame: Arc<WorldFrameWrapper>| consumer.on_new_world_frame(&frame))
    }

    pub fn remove_consumer(&self, id: SubscriptionId) -> bool {
        self.lock().consumers.unsubscribe(id)
    }

    pub fn add_observer(&self, mut observer: impl WorldFrameObserver) -> Result<SubscriptionId> {
        self.lock()
            .observers
            .subscribe(move |event: ObserverEvent| event.deliver(&mut observer))
    }

    pub fn remove_observer(&self, id: SubscriptionId) -> bool {
        self.lock().observers.unsubscribe(id)
    }

    pub fn latest_frame(&self) -> Option<Arc<WorldFrameWrapper>> {
        self.lock().latest_frame.clone()
    }

    pub fn latest_referee_msg(&self) -> Option<Arc<RefereeMsg>> {
        self.lock().latest_referee_msg.clone()
    }

    pub fn game_state(&self) -> GameState {
        self.lock().game_state.game_state().clone()
    }
}

impl CollectorState {
    fn process_vision_frame(&mut self, frame: &FilteredVisionFrame) -> Arc<WorldFrameWrapper> {
        let timestamp = frame.timestamp.max(self.last_wf_timestamp);
        if timestamp != frame.timestamp {
            log::debug!(
                "Vision frame {} is older than the last world frame, using {}",
                frame.id,
                timestamp
            );
        }
        self.last_wf_timestamp = timestamp;
        self.context.robot_info.set_last_wf_timestamp(timestamp);

        let ball = TrackedBall::from_filtered(timestamp, &frame.ball);
        self.ball_contact.set_tracked_ball(&ball);

        let filtered = filtered_bots(&frame.bots);
        let relevant: BTreeSet<BotId> = self
            .context
            .robot_info
            .connected_bot_ids()
            .into_iter()
            .chain(filtered.keys().copied())
            .collect();
        let infos: BTreeMap<BotId, RobotInfo> = relevant
            .iter()
            .map(|id| (*id, self.context.robot_info.robot_info(*id)))
            .collect();
        if let Some(feedback) = self.context.vision_feedback.as_mut() {
            feedback.set_robot_info_map(&infos);
        }

        let bots: BTreeMap<BotId, TrackedBot> = infos
            .into_values()
            .filter_map(|info| {
                let filtered_state = filtered.get(&info.id).map(|bot| bot.to_bot_state());
                self.track_bot(info, filtered_state, timestamp)
            })
            .map(|bot| (bot.id, bot))
            .collect();

        for id in self.last_bot_ids.iter().filter(|id| !bots.contains_key(id)) {
            log::warn!("Lost track of {}", id);
            self.trajectory_hold.reset(*id);
        }
        self.last_bot_ids = bots.keys().copied().collect();

        let kick_event = self
            .kick_tracker
            .update(frame.kick_event.as_ref(), &frame.ball.vel);
        let ball = ball.with_kick_event(kick_event.clone());

        let bots_to_interchange = self
            .interchange
            .bots_to_interchange(&bots, self.latest_referee_msg.as_deref());

        let simple_world_frame = SimpleWorldFrame {
            frame_number: frame.id,
            timestamp,
            bots,
            ball,
            kick_event,
            kick_fit_state: frame.kick_fit_state.clone(),
        };
        let game_state = self.game_state.next_game_state(
            self.latest_referee_msg.as_deref(),
            simple_world_frame.ball.pos2(),
            timestamp,
        );
        let wfw = Arc::new(WorldFrameWrapper {
            simple_world_frame,
            referee_msg: self.latest_referee_msg.clone(),
            game_state,
            bots_to_interchange,
            side_assignment: self.side_assignment,
        });

        self.consumers.dispatch(&wfw);
        self.observers
            .dispatch(&ObserverEvent::WorldFrame(Arc::clone(&wfw)));

        let shapes = self.visualization.process(&wfw);
        self.observers.dispatch(&ObserverEvent::ShapeMap {
            source: WORLD_PREDICTOR_SHAPE_SOURCE,
            shapes: Arc::new(shapes),
        });
        if !frame.shapes.is_empty() {
            self.observers.dispatch(&ObserverEvent::ShapeMap {
                source: VISION_FILTER_SHAPE_SOURCE,
                shapes: Arc::new(frame.shapes.clone()),
            });
        }

        self.latest_frame = Some(Arc::clone(&wfw));
        wfw
    }

    fn track_bot(
        &mut self,
        info: RobotInfo,
        filtered_state: Option<BotState>,
        timestamp: DiesInstant,
    ) -> Option<TrackedBot> {
        let Some(selected) = self
            .selector
            .select(filtered_state.as_ref(), info.internal_state.as_ref())
        else {
            log::debug!("No state for {}, skipping it", info.id);
            return None;
        };

        let outcome = self.trajectory_hold.apply(&info, selected, timestamp);
        let ball_contact =
            self.ball_contact
                .ball_contact(&info, outcome.state.pos, outcome.state.orientation);
        Some(TrackedBot {
            id: info.id,
            timestamp,
            state: outcome.state,
            filtered_state,
            buffered_traj_state: outcome.traj_state,
            ball_contact,
            robot_info: info,
        })
    }

    fn process_referee_msg(&mut self, msg: RefereeMsg) {
        let frame_timestamp = match self.latest_referee_msg.as_deref() {
            Some(latest) if latest.command_counter == msg.command_counter => {
                latest.frame_timestamp
            }
            _ => self.last_wf_timestamp,
        };
        if let Some(blue_on_positive) = msg.blue_team_on_positive_half {
            self.side_assignment = if blue_on_positive {
                SideAssignment::BluePositive
            } else {
                SideAssignment::YellowPositive
            };
        }
        self.latest_referee_msg = Some(Arc::new(msg.with_frame_timestamp(frame_timestamp)));
    }

    fn reset(&mut self) {
        self.last_wf_timestamp = DiesInstant::ZERO;
        self.ball_detector.reset();
        self.game_state.reset();
        self.visualization.reset();
        self.kick_tracker.reset();
        self.trajectory_hold.clear();
        self.last_bot_ids.clear();
        self.latest_referee_msg = None;
        self.latest_frame = None;
    }
}

/// Index the vision bots by id. Of duplicate detections the one with the best
/// quality is kept.
fn filtered_bots(bots: &[FilteredVisionBot]) -> BTreeMap<BotId, &FilteredVisionBot> {
    let mut by_id: BTreeMap<BotId, &FilteredVisionBot> = BTreeMap::new();
    for bot in bots {
        match by_id.get(&bot.id) {
            Some(existing) if existing.quality >= bot.quality => {
                log::debug!("Duplicate vision bot {}", bot.id);
            }
            _ => {
                by_id.insert(bot.id, bot);
            }
        }
    }
    by_id
}
