//! Incremental recompute scheduling.
//!
//! Triggers (view changes, new observations, parameter changes, explicit
//! redraws) only mark work as pending. [`RenderScheduler::tick`] is the next
//! scheduling opportunity: it runs at most one recompute, and only when the
//! render signature changed or a trigger forced it. Every dispatched request
//! gets a fresh id and only the result for the newest id is drawn.

use std::sync::Arc;
use std::time::Instant;

use field_common::{FieldError, FieldResult, GeoBounds, Observation};
use field_engine::{
    apply_mask, BoundaryPolygon, EngineConfig, FieldFrame, FieldStyle, InterpolationParams,
    RasterSampler, RasterSize, SpatialField,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::channel::ComputeChannel;
use crate::metrics::SchedulerMetrics;
use crate::renderable::Renderable;
use crate::signature::RenderSignature;
use crate::wire::{RenderRequest, RenderResult, WorkerEvent};

/// What the view currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub bounds: GeoBounds,
    pub zoom: u8,
    pub pixel_width: usize,
    pub pixel_height: usize,
}

impl ViewState {
    pub fn new(bounds: GeoBounds, zoom: u8, pixel_width: usize, pixel_height: usize) -> Self {
        Self {
            bounds,
            zoom,
            pixel_width,
            pixel_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    /// Nothing pending, nothing outstanding.
    Idle,
    /// A trigger arrived since the last tick.
    Scheduled,
    /// A request is outstanding and nothing new is pending.
    Computing,
}

/// Result of one [`RenderScheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No trigger since the last tick.
    NotPending,
    /// The layer is disabled.
    Disabled,
    /// No view has been set yet.
    NoView,
    /// Same signature as the last recompute and not forced.
    Unchanged,
    /// Sent to the worker with this id.
    Dispatched(u64),
    /// Computed and delivered on the spot with this id.
    RenderedInline(u64),
}

/// What happened to a delivered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Applied,
    /// A newer request is outstanding.
    Stale,
    /// This id was already drawn.
    Duplicate,
}

/// Owns the current snapshot and decides when to recompute.
pub struct RenderScheduler<R: Renderable> {
    config: EngineConfig,
    sampler: RasterSampler,
    style: FieldStyle,
    boundary: Vec<BoundaryPolygon>,
    params: InterpolationParams,

    field: Arc<SpatialField>,
    view: Option<ViewState>,
    enabled: bool,

    pending: bool,
    force: bool,
    last_signature: Option<RenderSignature>,
    last_id: u64,
    expected_id: Option<u64>,
    applied_id: Option<u64>,

    channel: Option<ComputeChannel>,
    target: R,
    metrics: SchedulerMetrics,
}

impl<R: Renderable> RenderScheduler<R> {
    /// Scheduler that samples on the calling thread.
    pub fn new(config: EngineConfig, mut target: R) -> Self {
        let style = FieldStyle::from_config(&config);
        target.attach();
        target.set_opacity(style.opacity);
        Self {
            sampler: RasterSampler::from_config(&config),
            style,
            boundary: Vec::new(),
            params: config.idw,
            field: Arc::new(SpatialField::empty(&config.index)),
            view: None,
            enabled: true,
            pending: false,
            force: false,
            last_signature: None,
            last_id: 0,
            expected_id: None,
            applied_id: None,
            channel: None,
            target,
            metrics: SchedulerMetrics::default(),
            config,
        }
    }

    /// Scheduler that offloads sampling to a worker thread, falling back to
    /// inline sampling when the worker cannot be started.
    pub fn with_worker(config: EngineConfig, target: R) -> Self {
        let mut scheduler = Self::new(config, target);
        match ComputeChannel::spawn(scheduler.sampler, scheduler.config.index) {
            Ok(channel) => scheduler.channel = Some(channel),
            Err(e) => warn!(error = %e, "Sampling worker unavailable, rendering inline"),
        }
        scheduler
    }

    pub fn set_style(&mut self, style: FieldStyle) {
        self.style = style;
        self.target.set_opacity(self.style.opacity);
        self.redraw();
    }

    /// Change the layer opacity. Applied by the display, no recompute.
    pub fn set_opacity(&mut self, opacity: f32) -> FieldResult<()> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(FieldError::invalid_parameter("opacity", "must be within 0..=1"));
        }
        self.style.opacity = opacity;
        self.target.set_opacity(opacity);
        Ok(())
    }

    /// Clip future frames to these polygons. An empty set disables clipping.
    pub fn set_boundary(&mut self, boundary: Vec<BoundaryPolygon>) {
        self.boundary = boundary;
        self.redraw();
    }

    /// The view moved, zoomed or resized.
    pub fn set_view(&mut self, view: ViewState) {
        self.view = Some(view);
        self.pending = true;
    }

    /// Replace the observation snapshot. Always forces a recompute.
    pub fn set_observations(&mut self, observations: &[Observation]) {
        let version = self.field.version() + 1;
        let field = Arc::new(SpatialField::new(observations, version, &self.config.index));
        self.field = Arc::clone(&field);
        self.metrics.record_snapshot();

        if let Some(channel) = &self.channel {
            if let Err(e) = channel.set_points(field) {
                self.fall_back_inline(e);
            }
        }

        info!(version, observations = observations.len(), "Observation snapshot installed");
        self.pending = true;
        self.force = true;
    }

    /// Change interpolation parameters. Forces a recompute.
    pub fn set_params(&mut self, params: InterpolationParams) -> FieldResult<()> {
        params.validate()?;
        self.params = params;
        self.pending = true;
        self.force = true;
        Ok(())
    }

    /// Recompute on the next tick regardless of the signature.
    pub fn redraw(&mut self) {
        self.pending = true;
        self.force = true;
    }

    /// Turn the layer on or off. Turning it off clears the display and
    /// forgets any outstanding request.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;

        if enabled {
            self.target.attach();
            self.target.set_opacity(self.style.opacity);
            self.redraw();
        } else {
            self.pending = false;
            self.force = false;
            self.last_signature = None;
            self.expected_id = None;
            self.target.invalidate();
            self.target.detach();
        }
    }

    /// Run at most one recompute if one is warranted.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.pending {
            return TickOutcome::NotPending;
        }
        self.pending = false;
        let force = std::mem::take(&mut self.force);

        if !self.enabled {
            return TickOutcome::Disabled;
        }
        let Some(view) = self.view else {
            return TickOutcome::NoView;
        };

        let profile = self.config.quality.for_zoom(view.zoom);
        let signature = RenderSignature::new(
            view.pixel_width,
            view.pixel_height,
            view.zoom,
            &view.bounds,
            self.field.version(),
            profile,
            &self.params,
            self.style.blur,
        );

        if !force && self.last_signature == Some(signature) {
            self.metrics.record_skip();
            debug!("Render signature unchanged, skipping");
            return TickOutcome::Unchanged;
        }
        self.last_signature = Some(signature);

        self.last_id += 1;
        let id = self.last_id;
        let request = RenderRequest {
            id,
            bounds: view.bounds,
            size: self.offscreen_size(&view, profile.downscale),
            grid_step: profile.grid_step,
            params: self.params,
        };

        if let Some(channel) = &self.channel {
            match channel.submit(request.clone()) {
                Ok(()) => {
                    self.expected_id = Some(id);
                    self.metrics.record_dispatch(false);
                    debug!(id, zoom = view.zoom, "Render dispatched to worker");
                    return TickOutcome::Dispatched(id);
                }
                Err(e) => {
                    self.fall_back_inline(e);
                    // This tick already covers the redraw the fallback asked for.
                    self.pending = false;
                    self.force = false;
                }
            }
        }

        self.expected_id = Some(id);
        self.metrics.record_dispatch(true);
        let grid = self.sampler.sample(
            &self.field,
            request.bounds,
            request.size,
            request.grid_step,
            &request.params,
        );
        self.deliver(RenderResult { id, grid });
        TickOutcome::RenderedInline(id)
    }

    /// Offscreen raster size for a view.
    pub fn offscreen_size(&self, view: &ViewState, downscale: f64) -> RasterSize {
        let scale = |px: usize| {
            ((px as f64 / downscale).floor() as usize).max(self.config.min_offscreen_size)
        };
        RasterSize::new(scale(view.pixel_width), scale(view.pixel_height))
    }

    /// Accept or discard a finished computation.
    pub fn deliver(&mut self, result: RenderResult) -> Delivery {
        if self.expected_id != Some(result.id) {
            if self.applied_id == Some(result.id) {
                self.metrics.record_duplicate();
                debug!(id = result.id, "Duplicate result discarded");
                return Delivery::Duplicate;
            }
            self.metrics.record_stale();
            debug!(id = result.id, latest = self.last_id, "Stale result discarded");
            return Delivery::Stale;
        }

        let started = Instant::now();
        let mut frame = FieldFrame::from_grid(&result.grid, &self.style);
        apply_mask(&mut frame, &self.boundary);
        let display_width = self.view.map_or(frame.width, |v| v.pixel_width);
        let sigma = self.style.blur_sigma(frame.width, display_width);
        if sigma > 0.0 {
            frame = frame.soften(sigma, self.style.overlay_alpha);
            apply_mask(&mut frame, &self.boundary);
        }
        self.target.render(&frame);

        self.expected_id = None;
        self.applied_id = Some(result.id);
        self.metrics.record_applied(started.elapsed());
        debug!(
            id = result.id,
            width = frame.width,
            height = frame.height,
            "Frame applied"
        );
        Delivery::Applied
    }

    /// Apply every result the worker has finished so far. Never blocks.
    ///
    /// Returns the number of frames drawn.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.channel.as_mut().and_then(ComputeChannel::try_next) {
            if self.handle_event(event) == Some(Delivery::Applied) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the worker's next render result and deliver it.
    ///
    /// Returns `None` without waiting when sampling is inline or the worker
    /// has exited.
    pub async fn next_result(&mut self) -> Option<Delivery> {
        loop {
            let event = self.channel.as_mut()?.next().await;
            match event {
                Some(event) => {
                    if let Some(delivery) = self.handle_event(event) {
                        return Some(delivery);
                    }
                }
                None => {
                    self.fall_back_inline(FieldError::ChannelUnavailable(
                        "sampling worker has exited".to_string(),
                    ));
                    return None;
                }
            }
        }
    }

    fn handle_event(&mut self, event: WorkerEvent) -> Option<Delivery> {
        match event {
            WorkerEvent::PointsReady { version, count } => {
                debug!(version, count, "Worker installed snapshot");
                None
            }
            WorkerEvent::Rendered(result) => Some(self.deliver(result)),
        }
    }

    fn fall_back_inline(&mut self, error: FieldError) {
        warn!(error = %error, "Sampling worker unavailable, rendering inline");
        self.channel = None;
        // The outstanding request will never be answered.
        if self.expected_id.is_some() {
            self.expected_id = None;
            self.redraw();
        }
    }

    /// Estimated value at a point from the current snapshot.
    pub fn estimate(&self, lat: f64, lon: f64) -> Option<f64> {
        self.field.estimate(lat, lon, &self.params)
    }

    pub fn state(&self) -> SchedulerState {
        if self.pending {
            SchedulerState::Scheduled
        } else if self.expected_id.is_some() {
            SchedulerState::Computing
        } else {
            SchedulerState::Idle
        }
    }

    pub fn field(&self) -> Arc<SpatialField> {
        Arc::clone(&self.field)
    }

    pub fn params(&self) -> InterpolationParams {
        self.params
    }

    pub fn view(&self) -> Option<ViewState> {
        self.view
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether sampling runs on the worker thread.
    pub fn is_offloaded(&self) -> bool {
        self.channel.is_some()
    }

    /// Id of the most recently dispatched request.
    pub fn latest_id(&self) -> u64 {
        self.last_id
    }

    /// Id of the result currently on display.
    pub fn applied_id(&self) -> Option<u64> {
        self.applied_id
    }

    pub fn metrics(&self) -> &SchedulerMetrics {
        &self.metrics
    }

    pub fn target(&self) -> &R {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut R {
        &mut self.target
    }

    /// Stop the worker, if any, and hand back the display.
    pub fn into_target(mut self) -> R {
        if let Some(channel) = self.channel.take() {
            channel.shutdown();
        }
        self.target
    }
}
