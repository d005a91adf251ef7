use crate::pipeline::options::{PipelineOptions, DEFAULT_EVENT_QUEUE_CAPACITY};
use crate::pipeline::report::FrameReport;
use crate::pipeline::violations::ViolationRecord;
use crossbeam::channel::{Receiver, Sender, TrySendError};
use log::{debug, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Events published by the frame pipeline
///
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    FrameProcessed { data: FrameReport },
    NewViolation { data: ViolationRecord },
    AlertsReset { timestamp: f64 },
}

/// Receiver of pipeline events
///
/// Called synchronously on the frame path, implementations must not block.
///
pub trait EventNotifier {
    fn send(&mut self, event: &PipelineEvent);
}

#[derive(Default, Clone, Debug)]
pub struct NoopNotifier;

impl EventNotifier for NoopNotifier {
    fn send(&mut self, _event: &PipelineEvent) {}
}

impl<A, B> EventNotifier for (A, B)
where
    A: EventNotifier,
    B: EventNotifier,
{
    fn send(&mut self, event: &PipelineEvent) {
        self.0.send(event);
        self.1.send(event);
    }
}

/// Fan-out of pipeline events to any number of subscribers
///
/// Every subscriber owns a bounded queue. An event that does not fit into a
/// subscriber queue is skipped for that subscriber; subscribers that dropped
/// their receiver are forgotten. Clones share the subscriber list.
///
#[derive(Debug, Clone)]
pub struct Broadcaster {
    subscribers: Arc<Mutex<Vec<Sender<PipelineEvent>>>>,
    capacity: usize,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_QUEUE_CAPACITY)
    }
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Subscriber queue capacity must be positive");
        Self {
            subscribers: Arc::new(Mutex::new(Vec::default())),
            capacity,
        }
    }

    /// Broadcaster with subscriber queues sized by `event_queue_capacity`
    ///
    pub fn from_options(opts: &PipelineOptions) -> Self {
        Self::new(opts.event_queue_capacity)
    }

    pub fn subscribe(&self) -> Receiver<PipelineEvent> {
        let (tx, rx) = crossbeam::channel::bounded(self.capacity);
        self.subscribers
            .lock()
            .expect("Access to subscribers must always succeed")
            .push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .expect("Access to subscribers must always succeed")
            .len()
    }
}

impl EventNotifier for Broadcaster {
    fn send(&mut self, event: &PipelineEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .expect("Access to subscribers must always succeed");
        subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Subscriber queue is full, event skipped");
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("Subscriber disconnected");
                false
            }
        });
    }
}
