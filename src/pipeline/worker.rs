use crate::alerts::AlertManager;
use crate::pipeline::detection::Detector;
use crate::pipeline::notify::EventNotifier;
use crate::pipeline::zone::ZoneClassifier;
use crate::pipeline::ParkingPipeline;
use crate::utils::time::current_time_secs;
use crate::Errors;
use anyhow::Result;
use crossbeam::channel::{Sender, TrySendError};
use log::{debug, warn};
use std::sync::Arc;
use std::thread::{spawn, JoinHandle};

enum WorkerCommands<F> {
    Frame { frame: F, now: f64 },
    ResetAlerts,
    Exit,
}

/// Runs a pipeline on its own thread
///
/// Frames and alert resets are queued and processed strictly in submission
/// order; results leave the worker through the pipeline notifier. When the
/// queue is full new frames are dropped before they reach the tracker.
///
pub struct PipelineWorker<F> {
    tx: Sender<WorkerCommands<F>>,
    alerts: Arc<AlertManager>,
    thread: Option<JoinHandle<()>>,
}

fn worker_thread<F, D, C, N>(
    mut pipeline: ParkingPipeline<D, C, N>,
    rx: crossbeam::channel::Receiver<WorkerCommands<F>>,
) where
    D: Detector<F>,
    C: ZoneClassifier<F>,
    N: EventNotifier,
{
    while let Ok(command) = rx.recv() {
        match command {
            WorkerCommands::Frame { frame, now } => {
                pipeline.process_frame(&frame, now);
            }
            WorkerCommands::ResetAlerts => pipeline.reset_alerts(),
            WorkerCommands::Exit => break,
        }
    }
    debug!("Pipeline worker for `{}` exits", pipeline.options().location);
}

impl<F> PipelineWorker<F>
where
    F: Send + 'static,
{
    /// Starts the worker thread
    ///
    /// # Parameters
    /// * `pipeline` - pipeline of the stream, moved to the worker
    /// * `queue_capacity` - how many commands may wait for the worker
    ///
    pub fn spawn<D, C, N>(pipeline: ParkingPipeline<D, C, N>, queue_capacity: usize) -> Self
    where
        D: Detector<F> + Send + 'static,
        C: ZoneClassifier<F> + Send + 'static,
        N: EventNotifier + Send + 'static,
    {
        assert!(queue_capacity > 0, "Worker queue capacity must be positive");
        let (tx, rx) = crossbeam::channel::bounded(queue_capacity);
        let alerts = pipeline.alert_manager();
        let thread = spawn(move || worker_thread(pipeline, rx));
        Self {
            tx,
            alerts,
            thread: Some(thread),
        }
    }

    /// Queues a frame without blocking
    ///
    /// Fails with [`Errors::FrameDropped`] when the queue is full.
    ///
    pub fn submit(&self, frame: F, now: f64) -> Result<()> {
        match self.tx.try_send(WorkerCommands::Frame { frame, now }) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                debug!("Worker queue is full, frame at {:.3} dropped", now);
                Err(Errors::FrameDropped.into())
            }
            Err(TrySendError::Disconnected(_)) => Err(Errors::WorkerGone.into()),
        }
    }

    /// Queues a frame stamped with the current wall clock without blocking
    ///
    pub fn submit_now(&self, frame: F) -> Result<()> {
        self.submit(frame, current_time_secs())
    }

    /// Queues a frame, waits for queue space
    ///
    pub fn submit_blocking(&self, frame: F, now: f64) -> Result<()> {
        self.tx
            .send(WorkerCommands::Frame { frame, now })
            .map_err(|_| Errors::WorkerGone.into())
    }

    /// Queues an alert reset after the already submitted frames
    ///
    pub fn reset_alerts(&self) -> Result<()> {
        self.tx
            .send(WorkerCommands::ResetAlerts)
            .map_err(|_| Errors::WorkerGone.into())
    }

    /// Commands waiting for the worker
    ///
    pub fn queued(&self) -> usize {
        self.tx.len()
    }

    pub fn alert_manager(&self) -> Arc<AlertManager> {
        self.alerts.clone()
    }
}

impl<F> Drop for PipelineWorker<F> {
    fn drop(&mut self) {
        if self.tx.send(WorkerCommands::Exit).is_err() {
            warn!("Pipeline worker is already gone");
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Pipeline worker panicked");
            }
        }
    }
}
