//! Recompute scheduling for station field rasters.
//!
//! [`RenderScheduler`] owns the current observation snapshot, decides when a
//! view or data change warrants sampling the field again, runs the sampling
//! inline or on a [`ComputeChannel`] worker, and draws only the newest
//! result into a [`Renderable`].

pub mod channel;
pub mod metrics;
pub mod renderable;
pub mod scheduler;
pub mod signature;
pub mod wire;

pub use channel::ComputeChannel;
pub use metrics::SchedulerMetrics;
pub use renderable::Renderable;
pub use scheduler::{Delivery, RenderScheduler, SchedulerState, TickOutcome, ViewState};
pub use signature::RenderSignature;
pub use wire::{RenderRequest, RenderResponse, RenderResult, WorkerEvent, WorkerMessage};
