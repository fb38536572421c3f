use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use dies_core::{
    CamDetectionFrame, FilteredVisionFrame, RefereeMsg, WorldFrameWrapper, WorldSettings,
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{SubscriptionId, WorldInfoCollector};

type FrameSender = mpsc::UnboundedSender<Arc<WorldFrameWrapper>>;

#[derive(Debug)]
pub enum CollectorMsg {
    Vision(FilteredVisionFrame),
    Referee(RefereeMsg),
    CamFrame(CamDetectionFrame),
    Clear,
    UpdateSettings(WorldSettings),
    /// Register another frame queue, used when a handle is cloned
    Subscribe(FrameSender),
    Stop,
}

/// Handle to a collector running as a tokio task.
///
/// All inputs go through one queue, so they are applied in the order they were
/// sent. Every handle is a consumer of its own and receives each frame
/// published after it was created exactly once, in order.
pub struct CollectorHandle {
    msg_tx: mpsc::UnboundedSender<CollectorMsg>,
    frame_rx: mpsc::UnboundedReceiver<Arc<WorldFrameWrapper>>,
}

impl CollectorHandle {
    /// Wait for the next world frame. Returns `None` once the task stopped and
    /// all frames published before were received.
    pub async fn recv(&mut self) -> Option<Arc<WorldFrameWrapper>> {
        self.frame_rx.recv().await
    }

    pub fn send(&self, msg: CollectorMsg) -> Result<()> {
        self.msg_tx
            .send(msg)
            .map_err(|err| anyhow!("Error sending collector message: {:?}", err.0))
    }

    pub fn stop(&self) {
        self.send(CollectorMsg::Stop)
            .map_err(|err| log::debug!("Collector already stopped: {}", err))
            .ok();
    }
}

impl Clone for CollectorHandle {
    /// The clone receives the frames published after the collector task
    /// processed the registration. If the task already stopped, it receives
    /// nothing.
    fn clone(&self) -> Self {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        self.send(CollectorMsg::Subscribe(frame_tx))
            .map_err(|err| log::debug!("Cloned handle of a stopped collector: {}", err))
            .ok();
        Self {
            msg_tx: self.msg_tx.clone(),
            frame_rx,
        }
    }
}

/// Run a collector on the current tokio runtime.
pub fn spawn_collector(
    collector: Arc<WorldInfoCollector>,
) -> Result<(CollectorHandle, JoinHandle<()>)> {
    let runtime = tokio::runtime::Handle::try_current()
        .context("The collector task needs a running tokio runtime")?;
    let (msg_tx, msg_rx) = mpsc::unbounded_channel();
    let (frame_tx, frame_rx) = mpsc::unbounded_channel();
    let handle_consumer = collector.add_consumer(frame_tx)?;

    let task = runtime.spawn(run_collector(collector, msg_rx, handle_consumer));
    Ok((CollectorHandle { msg_tx, frame_rx }, task))
}

async fn run_collector(
    collector: Arc<WorldInfoCollector>,
    mut msg_rx: mpsc::UnboundedReceiver<CollectorMsg>,
    handle_consumer: SubscriptionId,
) {
    let mut handle_consumers = vec![handle_consumer];
    while let Some(msg) = msg_rx.recv().await {
        match msg {
            CollectorMsg::Vision(frame) => {
                collector.on_new_filtered_vision_frame(&frame);
            }
            CollectorMsg::Referee(msg) => collector.on_new_referee_msg(msg),
            CollectorMsg::CamFrame(frame) => {
                collector.on_new_cam_detection_frame(frame);
            }
            CollectorMsg::Clear => collector.on_clear(),
            CollectorMsg::UpdateSettings(settings) => collector.update_settings(settings),
            CollectorMsg::Subscribe(frame_tx) => match collector.add_consumer(frame_tx) {
                Ok(id) => handle_consumers.push(id),
                Err(err) => log::error!("Failed to register collector handle: {:?}", err),
            },
            CollectorMsg::Stop => break,
        }
    }

    // Closes the handle queues once the frames already dispatched are delivered
    for id in handle_consumers {
        collector.remove_consumer(id);
    }
    log::info!("Collector task stopped");
}
