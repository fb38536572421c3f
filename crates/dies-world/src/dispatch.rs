use std::{
    collections::BTreeMap,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

use anyhow::{Context, Result};
use dies_core::{ExtendedCamDetectionFrame, ShapeMap, WorldFrameWrapper};
use tokio::sync::mpsc;

/// Receives every published world frame.
pub trait WorldFrameConsumer: Send + 'static {
    fn on_new_world_frame(&mut self, frame: &Arc<WorldFrameWrapper>);
}

/// Receives world frames and the side channels of the collector. All methods do
/// nothing by default.
pub trait WorldFrameObserver: Send + 'static {
    fn on_new_world_frame(&mut self, _frame: &Arc<WorldFrameWrapper>) {}

    fn on_new_cam_detection_frame(&mut self, _frame: &ExtendedCamDetectionFrame) {}

    /// Called when the collector was cleared.
    fn on_clear_cam_detection_frame(&mut self) {}

    /// Debug shapes, tagged with the name of the source that produced them.
    fn on_new_shape_map(&mut self, _source: &str, _shapes: &ShapeMap) {}
}

/// Forwards frames into a channel, eg. to an async task.
impl WorldFrameConsumer for mpsc::UnboundedSender<Arc<WorldFrameWrapper>> {
    fn on_new_world_frame(&mut self, frame: &Arc<WorldFrameWrapper>) {
        if self.send(Arc::clone(frame)).is_err() {
            log::debug!("World frame receiver dropped");
        }
    }
}

/// Events delivered to observers.
#[derive(Debug, Clone)]
pub enum ObserverEvent {
    WorldFrame(Arc<WorldFrameWrapper>),
    CamDetectionFrame(Arc<ExtendedCamDetectionFrame>),
    Clear,
    ShapeMap {
        source: &'static str,
        shapes: Arc<ShapeMap>,
    },
}

impl ObserverEvent {
    pub fn deliver(&self, observer: &mut dyn WorldFrameObserver) {
        match self {
            ObserverEvent::WorldFrame(frame) => observer.on_new_world_frame(frame),
            ObserverEvent::CamDetectionFrame(frame) => observer.on_new_cam_detection_frame(frame),
            ObserverEvent::Clear => observer.on_clear_cam_detection_frame(),
            ObserverEvent::ShapeMap { source, shapes } => observer.on_new_shape_map(source, shapes),
        }
    }
}

/// Handle of a registered consumer or observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Queued events at which a warning about a slow subscriber is logged, and
/// again at every multiple.
const BACKLOG_WARN_THRESHOLD: usize = 500;

struct Subscriber<E> {
    sender: mpsc::UnboundedSender<E>,
    /// Events dispatched but not yet handled
    backlog: Arc<AtomicUsize>,
}

/// Fans events out to subscribers, each running on its own thread.
///
/// Every subscriber has an unbounded queue, so dispatching never blocks and a
/// slow subscriber only delays itself. Events arrive in dispatch order, each
/// exactly once. A subscriber whose handler panics is disconnected and dropped
/// on the next dispatch. A growing backlog is logged as a warning.
pub struct FrameDispatcher<E> {
    name: &'static str,
    subscribers: BTreeMap<SubscriptionId, Subscriber<E>>,
    next_id: u64,
}

impl<E: Clone + Send + 'static> FrameDispatcher<E> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            subscribers: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Register a handler. It is called on a dedicated thread for every event
    /// dispatched after this call.
    pub fn subscribe<F>(&mut self, mut handler: F) -> Result<SubscriptionId>
    where
        F: FnMut(E) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        let (sender, mut receiver) = mpsc::unbounded_channel::<E>();
        let name = self.name;
        let backlog = Arc::new(AtomicUsize::new(0));
        let handled = Arc::clone(&backlog);

        thread::Builder::new()
            .name(format!("{}-{}", name, id.0))
            .spawn(move || {
                while let Some(event) = receiver.blocking_recv() {
                    let result = catch_unwind(AssertUnwindSafe(|| handler(event)));
                    handled.fetch_sub(1, Ordering::Relaxed);
                    if result.is_err() {
                        log::warn!("{} {} panicked, disconnecting it", name, id);
                        break;
                    }
                }
            })
            .with_context(|| format!("Failed to spawn dispatch thread for {} {}", name, id))?;

        self.next_id += 1;
        self.subscribers.insert(id, Subscriber { sender, backlog });
        Ok(id)
    }

    /// Number of events dispatched to a subscriber that it has not handled yet.
    pub fn backlog(&self, id: SubscriptionId) -> Option<usize> {
        self.subscribers
            .get(&id)
            .map(|s| s.backlog.load(Ordering::Relaxed))
    }

    /// Remove a subscriber. Events already queued are still delivered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    pub fn dispatch(&mut self, event: &E) {
        let name = self.name;
        self.subscribers.retain(|id, subscriber| {
            // Counted before sending, so the handler thread never sees it negative
            let queued = subscriber.backlog.fetch_add(1, Ordering::Relaxed) + 1;
            if subscriber.sender.send(event.clone()).is_err() {
                log::warn!("{} {} is gone, dropping it", name, id);
                return false;
            }
            if queued % BACKLOG_WARN_THRESHOLD == 0 {
                log::warn!("{} {} is falling behind, {} events queued", name, id, queued);
            }
            true
        });
    }

    /// Drop all subscribers, returning how many there were.
    pub fn clear_all(&mut self) -> usize {
        let count = self.subscribers.len();
        self.subscribers.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
