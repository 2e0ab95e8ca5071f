//! Station field engine.
//!
//! Turns a snapshot of point observations into a continuous estimated field
//! and renders it into images:
//!
//! - [`SpatialIndex`] buckets observations for neighborhood queries
//! - [`SpatialField`] is the immutable, versioned snapshot shared with workers
//! - [`idw_estimate`] computes inverse-distance-weighted estimates
//! - [`RasterSampler`] evaluates the field over a bounding box in blocks
//! - [`ColorRamp`] and [`FieldFrame`] colorize a sampled grid
//! - [`apply_mask`] clips a frame to boundary polygons
//!
//! ```ignore
//! use field_engine::{EngineConfig, RasterSampler, RasterSize, SpatialField};
//!
//! let config = EngineConfig::default();
//! let field = SpatialField::new(&observations, 1, &config.index);
//! let grid = RasterSampler::from_config(&config)
//!     .sample(&field, bounds, RasterSize::new(800, 600), 6, &config.idw);
//! ```

pub mod colormap;
pub mod config;
pub mod field;
pub mod frame;
pub mod interpolation;
pub mod mask;
pub mod png;
pub mod sampler;
pub mod spatial_index;

pub use colormap::{ColorRamp, ColorStop};
pub use config::{EngineConfig, IndexConfig, InterpolationParams, QualityConfig, QualityProfile};
pub use field::SpatialField;
pub use frame::{FieldFrame, FieldStyle};
pub use interpolation::idw_estimate;
pub use mask::{
    apply_mask, decimate_ring, decimation_step, load_boundary_or_unclipped, polygons_from_file,
    polygons_from_geojson, BoundaryPolygon, Vertex,
};
pub use sampler::{RasterGrid, RasterSampler, RasterSize};
pub use spatial_index::{BinKey, SpatialIndex};
