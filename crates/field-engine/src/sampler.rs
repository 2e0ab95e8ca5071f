//! Block-sampled evaluation of a field over a bounding box.

use field_common::{GeoBounds, Observation};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{EngineConfig, InterpolationParams};
use crate::field::SpatialField;

/// Raster dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RasterSize {
    #[serde(rename = "w")]
    pub width: usize,
    #[serde(rename = "h")]
    pub height: usize,
}

impl RasterSize {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Sampled field values, one per `step`×`step` block, row-major with the
/// northern row first. Cells without an estimate hold `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    pub bounds: GeoBounds,
    /// Effective raster width in pixels.
    pub width: usize,
    /// Effective raster height in pixels.
    pub height: usize,
    pub step: usize,
    pub cols: usize,
    pub rows: usize,
    pub values: Vec<f32>,
}

impl RasterGrid {
    /// Grid with no cells.
    pub fn empty(bounds: GeoBounds, step: usize) -> Self {
        Self {
            bounds,
            width: 0,
            height: 0,
            step,
            cols: 0,
            rows: 0,
            values: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a cell; `None` outside the grid or where there is no estimate.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        let v = self.values[row * self.cols + col];
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    /// Geographic position of a cell's anchor pixel.
    pub fn anchor_lat_lon(&self, col: usize, row: usize) -> (f64, f64) {
        self.bounds.pixel_to_lat_lon(
            (col * self.step) as f64,
            (row * self.step) as f64,
            self.width,
            self.height,
        )
    }

    /// Number of cells without an estimate.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    /// Smallest and largest estimated value.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Evaluates a [`SpatialField`] over a rectangular block grid.
#[derive(Debug, Clone, Copy)]
pub struct RasterSampler {
    min_raster_size: usize,
    min_grid_step: u32,
}

impl Default for RasterSampler {
    fn default() -> Self {
        Self {
            min_raster_size: 240,
            min_grid_step: 3,
        }
    }
}

impl RasterSampler {
    pub fn new(min_raster_size: usize, min_grid_step: u32) -> Self {
        Self {
            min_raster_size: min_raster_size.max(2),
            min_grid_step: min_grid_step.max(1),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.min_raster_size, config.min_grid_step)
    }

    /// Block size actually used for a requested grid step.
    pub fn effective_step(&self, grid_step: u32) -> usize {
        grid_step.max(self.min_grid_step) as usize
    }

    /// Sample `field` over `bounds`.
    ///
    /// Zero-sized requests give an empty grid. Otherwise the raster is
    /// enlarged to the minimum size and each block is evaluated at its
    /// top-left pixel. Rows are computed in parallel; the output does not
    /// depend on scheduling.
    pub fn sample(
        &self,
        field: &SpatialField,
        bounds: GeoBounds,
        size: RasterSize,
        grid_step: u32,
        params: &InterpolationParams,
    ) -> RasterGrid {
        let step = self.effective_step(grid_step);
        if size.is_empty() {
            return RasterGrid::empty(bounds, step);
        }

        let width = size.width.max(self.min_raster_size);
        let height = size.height.max(self.min_raster_size);
        let cols = width.div_ceil(step);
        let rows = height.div_ceil(step);

        let mut values = vec![f32::NAN; cols * rows];
        values
            .par_chunks_mut(cols)
            .enumerate()
            .for_each(|(row, out)| {
                let mut candidates: Vec<&Observation> = Vec::new();
                let y = (row * step) as f64;
                for (col, cell) in out.iter_mut().enumerate() {
                    let x = (col * step) as f64;
                    let (lat, lon) = bounds.pixel_to_lat_lon(x, y, width, height);
                    if let Some(v) = field.estimate_with(lat, lon, params, &mut candidates) {
                        *cell = v as f32;
                    }
                }
            });

        let grid = RasterGrid {
            bounds,
            width,
            height,
            step,
            cols,
            rows,
            values,
        };

        debug!(
            version = field.version(),
            cols,
            rows,
            step,
            missing = grid.missing_count(),
            "Sampled field raster"
        );

        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;

    #[test]
    fn test_effective_step_minimum() {
        let sampler = RasterSampler::default();
        assert_eq!(sampler.effective_step(1), 3);
        assert_eq!(sampler.effective_step(6), 6);
    }

    #[test]
    fn test_zero_size_gives_empty_grid() {
        let field = SpatialField::empty(&IndexConfig::default());
        let bounds = GeoBounds::new(55.0, 10.0, 70.0, 25.0);
        let grid = RasterSampler::default().sample(
            &field,
            bounds,
            RasterSize::new(0, 100),
            6,
            &InterpolationParams::default(),
        );
        assert_eq!(grid.cols, 0);
        assert_eq!(grid.rows, 0);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_small_request_is_enlarged() {
        let field = SpatialField::empty(&IndexConfig::default());
        let bounds = GeoBounds::new(55.0, 10.0, 70.0, 25.0);
        let grid = RasterSampler::default().sample(
            &field,
            bounds,
            RasterSize::new(100, 300),
            7,
            &InterpolationParams::default(),
        );
        assert_eq!((grid.width, grid.height), (240, 300));
        assert_eq!(grid.cols, 35); // ceil(240 / 7)
        assert_eq!(grid.rows, 43); // ceil(300 / 7)
        assert_eq!(grid.values.len(), 35 * 43);
        assert_eq!(grid.missing_count(), grid.values.len());
    }
}
