//! Sampling offloaded to a dedicated worker thread.
//!
//! Requests go out on an unbounded tokio channel that the worker drains
//! with `blocking_recv`; results come back on a second channel that the
//! control path polls with [`ComputeChannel::try_next`] or awaits with
//! [`ComputeChannel::next`]. There is no cancellation: every submitted
//! request is answered, and the scheduler drops the stale ones.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use field_common::{FieldError, FieldResult};
use field_engine::{IndexConfig, RasterSampler, SpatialField};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::wire::{RenderRequest, RenderResult, WorkerEvent, WorkerMessage};

/// Handle to the sampling worker.
#[derive(Debug)]
pub struct ComputeChannel {
    tx: Option<UnboundedSender<WorkerMessage>>,
    rx: UnboundedReceiver<WorkerEvent>,
    handle: Option<JoinHandle<()>>,
}

impl ComputeChannel {
    /// Start the worker thread.
    ///
    /// Fails with [`FieldError::ChannelUnavailable`] when the thread cannot
    /// be spawned; callers then sample inline.
    pub fn spawn(sampler: RasterSampler, index: IndexConfig) -> FieldResult<Self> {
        let (tx, mut requests) = mpsc::unbounded_channel::<WorkerMessage>();
        let (events, rx) = mpsc::unbounded_channel::<WorkerEvent>();

        let handle = std::thread::Builder::new()
            .name("field-sampler".to_string())
            .spawn(move || {
                let mut field = Arc::new(SpatialField::empty(&index));
                while let Some(message) = requests.blocking_recv() {
                    let event = handle_message(&sampler, &mut field, message);
                    if events.send(event).is_err() {
                        break;
                    }
                }
                debug!("Sampling worker stopped");
            })
            .map_err(|e| FieldError::ChannelUnavailable(e.to_string()))?;

        info!("Sampling worker started");
        Ok(Self {
            tx: Some(tx),
            rx,
            handle: Some(handle),
        })
    }

    /// Hand the worker a new snapshot.
    pub fn set_points(&self, field: Arc<SpatialField>) -> FieldResult<()> {
        self.send(WorkerMessage::SetPoints(field))
    }

    /// Queue a render; the answer carries the same id.
    pub fn submit(&self, request: RenderRequest) -> FieldResult<()> {
        self.send(WorkerMessage::Render(request))
    }

    fn send(&self, message: WorkerMessage) -> FieldResult<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| FieldError::ChannelUnavailable("channel is shut down".to_string()))?;
        tx.send(message)
            .map_err(|_| FieldError::ChannelUnavailable("sampling worker has exited".to_string()))
    }

    /// Next finished event, if one is ready. Never blocks.
    pub fn try_next(&mut self) -> Option<WorkerEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next event. `None` once the worker has exited.
    pub async fn next(&mut self) -> Option<WorkerEvent> {
        self.rx.recv().await
    }

    /// Whether the worker thread is still running.
    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cut both directions without waiting, leaving anything in flight
    /// unanswered.
    #[cfg(test)]
    pub(crate) fn sever(&mut self) {
        self.tx.take();
        let (_, rx) = mpsc::unbounded_channel();
        self.rx = rx;
    }

    /// Stop accepting work and wait for the worker to drain its queue.
    pub fn shutdown(mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn handle_message(
    sampler: &RasterSampler,
    field: &mut Arc<SpatialField>,
    message: WorkerMessage,
) -> WorkerEvent {
    match message {
        WorkerMessage::SetPoints(snapshot) => {
            *field = snapshot;
            WorkerEvent::PointsReady {
                version: field.version(),
                count: field.len(),
            }
        }
        WorkerMessage::Render(request) => {
            let started = Instant::now();
            let grid = sampler.sample(
                field.as_ref(),
                request.bounds,
                request.size,
                request.grid_step,
                &request.params,
            );
            debug!(
                id = request.id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Worker finished render"
            );
            WorkerEvent::Rendered(RenderResult {
                id: request.id,
                grid,
            })
        }
    }
}
