use std::{
    sync::{mpsc, Arc},
    time::Duration,
};

use dies_core::{
    Angle, BotId, BotStateSource, CamBall, CamDetectionFrame, DebugColor, DebugShape, DiesInstant,
    FilteredVisionBall, FilteredVisionBot, FilteredVisionFrame, GameStateType, KickEvent,
    RefCommand, RefereeMsg, RobotInfo, ShapeMap, TimedTrajectory, Vector2, Vector3,
    WaypointTrajectory, WorldFrameWrapper, WorldSettings,
};
use dies_world::{
    spawn_collector, CollectorContext, CollectorMsg, SharedRobotInfo, WorldFrameConsumer,
    WorldFrameObserver, WorldInfoCollector, VISION_FILTER_SHAPE_SOURCE,
    WORLD_PREDICTOR_SHAPE_SOURCE,
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn collector_with(robots: &SharedRobotInfo) -> WorldInfoCollector {
    WorldInfoCollector::new(
        WorldSettings::default(),
        CollectorContext::new(robots.clone()),
    )
}

fn collector() -> WorldInfoCollector {
    collector_with(&SharedRobotInfo::new())
}

fn frame(id: u64, t: f64) -> FilteredVisionFrame {
    FilteredVisionFrame {
        id,
        timestamp: DiesInstant::from_secs(t),
        bots: vec![FilteredVisionBot {
            id: BotId::yellow(1),
            pos: Vector2::new(-1000.0, 0.0),
            orientation: Angle::default(),
            vel: Vector2::zeros(),
            angular_vel: 0.0,
            quality: 1.0,
        }],
        ball: FilteredVisionBall::default(),
        kick_event: None,
        kick_fit_state: None,
        shapes: ShapeMap::new(),
    }
}

fn with_ball_vel(mut frame: FilteredVisionFrame, vel: Vector3) -> FilteredVisionFrame {
    frame.ball.vel = vel;
    frame
}

fn kick() -> KickEvent {
    KickEvent {
        kicking_bot: BotId::yellow(1),
        timestamp: DiesInstant::from_secs(0.1),
        position: Vector2::zeros(),
        kick_vel: Vector3::new(4000.0, 0.0, 0.0),
        trajectory_start_time: DiesInstant::from_secs(0.1),
    }
}

struct ChannelConsumer(mpsc::Sender<u64>);

impl WorldFrameConsumer for ChannelConsumer {
    fn on_new_world_frame(&mut self, frame: &Arc<WorldFrameWrapper>) {
        let _ = self.0.send(frame.frame_number());
    }
}

#[derive(Debug)]
enum Observed {
    Frame(u64),
    Cam(Option<u32>),
    Clear,
    Shapes(String, ShapeMap),
}

struct ChannelObserver(mpsc::Sender<Observed>);

impl WorldFrameObserver for ChannelObserver {
    fn on_new_world_frame(&mut self, frame: &Arc<WorldFrameWrapper>) {
        let _ = self.0.send(Observed::Frame(frame.frame_number()));
    }

    fn on_new_cam_detection_frame(&mut self, frame: &dies_core::ExtendedCamDetectionFrame) {
        let _ = self
            .0
            .send(Observed::Cam(frame.ball.as_ref().map(|b| b.camera_id)));
    }

    fn on_clear_cam_detection_frame(&mut self) {
        let _ = self.0.send(Observed::Clear);
    }

    fn on_new_shape_map(&mut self, source: &str, shapes: &ShapeMap) {
        let _ = self
            .0
            .send(Observed::Shapes(source.to_owned(), shapes.clone()));
    }
}

#[test_log::test]
fn kick_event_cleared_when_ball_stops() {
    let collector = collector();

    let mut kicked = with_ball_vel(frame(1, 0.1), Vector3::new(4000.0, 0.0, 0.0));
    kicked.kick_event = Some(kick());
    let first = collector.on_new_filtered_vision_frame(&kicked);
    let armed = first.simple_world_frame.kick_event.clone().unwrap();
    assert!(Arc::ptr_eq(
        &armed,
        first.simple_world_frame.ball.kick_event.as_ref().unwrap()
    ));

    let rolling = collector.on_new_filtered_vision_frame(&with_ball_vel(
        frame(2, 0.2),
        Vector3::new(3000.0, 0.0, 0.0),
    ));
    assert!(Arc::ptr_eq(
        &armed,
        rolling.simple_world_frame.kick_event.as_ref().unwrap()
    ));

    let stopped = collector.on_new_filtered_vision_frame(&frame(3, 0.3));
    assert!(stopped.simple_world_frame.kick_event.is_none());
    assert!(stopped.simple_world_frame.ball.kick_event.is_none());
}

#[test_log::test]
fn duplicate_referee_counter_keeps_timestamp() {
    let collector = collector();
    collector.on_new_filtered_vision_frame(&frame(1, 0.5));

    collector.on_new_referee_msg(RefereeMsg::new(RefCommand::ForceStart, 5));
    let first = collector.on_new_filtered_vision_frame(&frame(2, 1.0));
    collector.on_new_referee_msg(RefereeMsg::new(RefCommand::ForceStart, 5));
    let second = collector.on_new_filtered_vision_frame(&frame(3, 2.0));

    assert_eq!(first.game_state.state_type, GameStateType::Run);
    assert_eq!(second.game_state, first.game_state);

    let first_ref = first.referee_msg.as_ref().unwrap();
    let second_ref = second.referee_msg.as_ref().unwrap();
    assert_eq!(first_ref.frame_timestamp, DiesInstant::from_secs(0.5));
    assert_eq!(first_ref.frame_timestamp, second_ref.frame_timestamp);

    // A new counter is stamped with the latest world frame
    collector.on_new_referee_msg(RefereeMsg::new(RefCommand::Stop, 6));
    let third = collector.on_new_filtered_vision_frame(&frame(4, 3.0));
    assert_eq!(third.game_state.state_type, GameStateType::Stop);
    assert_eq!(
        third.referee_msg.as_ref().unwrap().frame_timestamp,
        DiesInstant::from_secs(2.0)
    );
}

#[test_log::test]
fn frame_timestamps_never_decrease() {
    let collector = collector();
    let published: Vec<f64> = [1.0, 0.8, 1.2, 1.1, 1.3]
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            collector
                .on_new_filtered_vision_frame(&frame(i as u64, t))
                .timestamp()
                .as_secs_f64()
        })
        .collect();
    assert_eq!(published, vec![1.0, 1.0, 1.2, 1.2, 1.3]);
}

#[test_log::test]
fn clear_twice_equals_clear_once() {
    let run = |clears: usize| {
        let collector = collector();
        collector.on_new_referee_msg(RefereeMsg::new(RefCommand::ForceStart, 1));
        let mut kicked = with_ball_vel(frame(1, 5.0), Vector3::new(4000.0, 0.0, 0.0));
        kicked.kick_event = Some(kick());
        collector.on_new_filtered_vision_frame(&kicked);

        for _ in 0..clears {
            collector.on_clear();
        }
        assert!(collector.latest_frame().is_none());
        assert!(collector.latest_referee_msg().is_none());
        collector.on_new_filtered_vision_frame(&with_ball_vel(
            frame(2, 1.0),
            Vector3::new(4000.0, 0.0, 0.0),
        ))
    };

    let once = run(1);
    let twice = run(2);
    for wfw in [&once, &twice] {
        // The timestamp was reset, so an earlier frame is not clamped anymore
        assert_eq!(wfw.timestamp(), DiesInstant::from_secs(1.0));
        assert!(wfw.simple_world_frame.kick_event.is_none());
        assert!(wfw.referee_msg.is_none());
        assert_eq!(wfw.game_state.state_type, GameStateType::Unknown);
    }
    assert_eq!(once.game_state, twice.game_state);
}

#[test_log::test]
fn trajectory_is_held_while_close() {
    let robots = SharedRobotInfo::new();
    let traj = WaypointTrajectory::stationary(Vector2::new(-990.0, 0.0), Angle::default());
    let info = RobotInfo::connected(BotId::yellow(1))
        .with_trajectory(TimedTrajectory::new(DiesInstant::ZERO, Arc::new(traj)));
    robots.update(info);
    let collector = collector_with(&robots);

    let first = collector.on_new_filtered_vision_frame(&frame(1, 0.0));
    let bot = first.bot(&BotId::yellow(1)).unwrap();
    assert_eq!(bot.state.source, BotStateSource::Filtered);
    assert!(bot.buffered_traj_state.is_some());

    for i in 2..5 {
        let wfw = collector.on_new_filtered_vision_frame(&frame(i, i as f64 * 0.1));
        let bot = wfw.bot(&BotId::yellow(1)).unwrap();
        assert_eq!(bot.state.source, BotStateSource::Trajectory);
        assert_eq!(bot.state.pos, Vector2::new(-990.0, 0.0));
    }

    let mut far = frame(5, 0.5);
    far.bots[0].pos = Vector2::new(0.0, 0.0);
    let wfw = collector.on_new_filtered_vision_frame(&far);
    let bot = wfw.bot(&BotId::yellow(1)).unwrap();
    assert_eq!(bot.state.source, BotStateSource::Filtered);
    assert_eq!(bot.state.pos, Vector2::zeros());
}

#[test_log::test]
fn consumers_receive_every_frame_in_order() {
    let collector = collector();
    collector.start();
    let (tx_a, rx_a) = mpsc::channel();
    let (tx_b, rx_b) = mpsc::channel();
    collector.add_consumer(ChannelConsumer(tx_a)).unwrap();
    collector.add_consumer(ChannelConsumer(tx_b)).unwrap();

    for i in 0..50 {
        collector.on_new_filtered_vision_frame(&frame(i, i as f64 * 0.01));
    }

    for rx in [rx_a, rx_b] {
        let received: Vec<u64> = (0..50).map(|_| rx.recv_timeout(TIMEOUT).unwrap()).collect();
        assert_eq!(received, (0..50).collect::<Vec<_>>());
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }
}

struct PanickingConsumer;

impl WorldFrameConsumer for PanickingConsumer {
    fn on_new_world_frame(&mut self, _frame: &Arc<WorldFrameWrapper>) {
        panic!("consumer failure");
    }
}

struct SlowConsumer;

impl WorldFrameConsumer for SlowConsumer {
    fn on_new_world_frame(&mut self, _frame: &Arc<WorldFrameWrapper>) {
        std::thread::sleep(Duration::from_millis(200));
    }
}

#[test_log::test]
fn failing_consumers_do_not_stall_others() {
    let collector = collector();
    collector.add_consumer(PanickingConsumer).unwrap();
    collector.add_consumer(SlowConsumer).unwrap();
    let (tx, rx) = mpsc::channel();
    collector.add_consumer(ChannelConsumer(tx)).unwrap();

    let start = std::time::Instant::now();
    for i in 0..20 {
        collector.on_new_filtered_vision_frame(&frame(i, i as f64 * 0.01));
    }
    // 20 frames for the slow consumer take 4s
    assert!(start.elapsed() < Duration::from_secs(2));

    let received: Vec<u64> = (0..20).map(|_| rx.recv_timeout(TIMEOUT).unwrap()).collect();
    assert_eq!(received, (0..20).collect::<Vec<_>>());
}

#[test_log::test]
fn removed_consumer_gets_nothing() {
    let collector = collector();
    let (tx, rx) = mpsc::channel();
    let id = collector.add_consumer(ChannelConsumer(tx)).unwrap();
    assert!(collector.remove_consumer(id));
    collector.on_new_filtered_vision_frame(&frame(1, 0.0));
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test_log::test]
fn observers_get_side_channels() {
    let collector = collector();
    let (tx, rx) = mpsc::channel();
    collector.add_observer(ChannelObserver(tx)).unwrap();

    let mut vision = frame(7, 0.0);
    vision
        .shapes
        .add("TRACKS", DebugShape::cross(Vector2::zeros(), DebugColor::Red));
    collector.on_new_filtered_vision_frame(&vision);

    let ball = collector.on_new_cam_detection_frame(CamDetectionFrame {
        camera_id: 2,
        frame_number: 1,
        t_capture: DiesInstant::ZERO,
        balls: vec![CamBall {
            camera_id: 2,
            confidence: 0.9,
            pos: Vector3::zeros(),
            t_capture: DiesInstant::ZERO,
        }],
    });
    assert_eq!(ball.map(|b| b.camera_id), Some(2));
    collector.on_clear();

    let events: Vec<Observed> = (0..5).map(|_| rx.recv_timeout(TIMEOUT).unwrap()).collect();
    assert!(matches!(events[0], Observed::Frame(7)));
    match &events[1] {
        Observed::Shapes(source, shapes) => {
            assert_eq!(source, WORLD_PREDICTOR_SHAPE_SOURCE);
            assert_eq!(shapes.layer("BALL").len(), 1);
            assert_eq!(shapes.layer("BOTS").len(), 2);
        }
        other => panic!("unexpected event {:?}", other),
    }
    match &events[2] {
        Observed::Shapes(source, shapes) => {
            assert_eq!(source, VISION_FILTER_SHAPE_SOURCE);
            assert_eq!(shapes.layer("TRACKS").len(), 1);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert!(matches!(events[3], Observed::Cam(Some(2))));
    assert!(matches!(events[4], Observed::Clear));
}

#[test_log::test]
fn start_drops_leftover_registrations() {
    let collector = collector();
    let (tx, rx) = mpsc::channel();
    collector.add_consumer(ChannelConsumer(tx)).unwrap();
    collector.start();
    collector.on_new_filtered_vision_frame(&frame(1, 0.0));
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test_log::test(tokio::test)]
async fn collector_task_publishes_frames() {
    let collector = Arc::new(collector());
    let (frame_tx, mut frame_rx) = tokio::sync::mpsc::unbounded_channel::<Arc<WorldFrameWrapper>>();
    collector.add_consumer(frame_tx).unwrap();
    let (mut handle, task) = spawn_collector(Arc::clone(&collector)).unwrap();

    handle
        .send(CollectorMsg::Referee(RefereeMsg::new(RefCommand::Halt, 1)))
        .unwrap();
    handle.send(CollectorMsg::Vision(frame(1, 0.1))).unwrap();
    handle.send(CollectorMsg::Vision(frame(2, 0.2))).unwrap();

    let first = handle.recv().await.unwrap();
    assert_eq!(first.frame_number(), 1);
    assert_eq!(first.game_state.state_type, GameStateType::Halt);
    assert_eq!(handle.recv().await.unwrap().frame_number(), 2);

    let consumed = tokio::time::timeout(TIMEOUT, frame_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(consumed.frame_number(), 1);

    handle.stop();
    task.await.unwrap();
    assert!(handle.recv().await.is_none());
    assert!(handle.send(CollectorMsg::Clear).is_err());
}

#[test_log::test(tokio::test)]
async fn collector_handle_receives_every_frame() {
    let collector = Arc::new(collector());
    let (mut handle, task) = spawn_collector(collector).unwrap();

    for n in 1..=200 {
        handle
            .send(CollectorMsg::Vision(frame(n, n as f64 * 0.01)))
            .unwrap();
    }
    handle.stop();
    task.await.unwrap();

    let mut received = Vec::new();
    while let Some(frame) = tokio::time::timeout(TIMEOUT, handle.recv()).await.unwrap() {
        received.push(frame.frame_number());
    }
    assert_eq!(received, (1..=200).collect::<Vec<_>>());
}

#[test_log::test(tokio::test)]
async fn cloned_handles_receive_frames_independently() {
    let collector = Arc::new(collector());
    let (mut handle, task) = spawn_collector(collector).unwrap();
    let mut cloned = handle.clone();

    for n in 1..=3 {
        handle.send(CollectorMsg::Vision(frame(n, n as f64 * 0.1))).unwrap();
    }
    cloned.stop();
    task.await.unwrap();

    for receiver in [&mut handle, &mut cloned] {
        let mut received = Vec::new();
        while let Some(frame) = tokio::time::timeout(TIMEOUT, receiver.recv()).await.unwrap() {
            received.push(frame.frame_number());
        }
        assert_eq!(received, vec![1, 2, 3]);
    }
}
