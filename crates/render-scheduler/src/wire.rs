//! Messages exchanged with the sampling worker.
//!
//! In-process the worker receives [`WorkerMessage`]s and answers with
//! [`WorkerEvent`]s. The JSON wire form of a render exchange is
//! [`RenderRequest`] and [`RenderResponse`]; missing estimates travel as
//! `null`.

use std::sync::Arc;

use field_common::{FieldError, FieldResult, GeoBounds};
use field_engine::{InterpolationParams, RasterGrid, RasterSize, SpatialField};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One sampling job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub id: u64,
    pub bounds: GeoBounds,
    pub size: RasterSize,
    pub grid_step: u32,
    pub params: InterpolationParams,
}

/// A sampled grid tagged with the id of the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    pub id: u64,
    pub grid: RasterGrid,
}

/// Wire form of a [`RenderResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResponse {
    pub id: u64,
    pub w: usize,
    pub h: usize,
    pub step: usize,
    pub cols: usize,
    pub rows: usize,
    #[serde(with = "nan_as_null")]
    pub values: Vec<f32>,
}

impl From<&RenderResult> for RenderResponse {
    fn from(result: &RenderResult) -> Self {
        let g = &result.grid;
        Self {
            id: result.id,
            w: g.width,
            h: g.height,
            step: g.step,
            cols: g.cols,
            rows: g.rows,
            values: g.values.clone(),
        }
    }
}

impl RenderResponse {
    /// Rebuild the result; the response does not carry bounds, so the
    /// caller supplies those of the matching request.
    ///
    /// The grid shape is checked against `w`, `h` and `step` before anything
    /// downstream indexes into `values`.
    pub fn into_result(self, bounds: GeoBounds) -> FieldResult<RenderResult> {
        if self.step == 0 {
            return Err(FieldError::MalformedResponse(format!(
                "response {} has a zero step",
                self.id
            )));
        }
        let (cols, rows) = (self.w.div_ceil(self.step), self.h.div_ceil(self.step));
        if (self.cols, self.rows) != (cols, rows) {
            return Err(FieldError::MalformedResponse(format!(
                "response {} is {}x{} cells, expected {}x{} for {}x{} px at step {}",
                self.id, self.cols, self.rows, cols, rows, self.w, self.h, self.step
            )));
        }
        if self.values.len() != cols * rows {
            return Err(FieldError::MalformedResponse(format!(
                "response {} has {} values for {} cells",
                self.id,
                self.values.len(),
                cols * rows
            )));
        }

        Ok(RenderResult {
            id: self.id,
            grid: RasterGrid {
                bounds,
                width: self.w,
                height: self.h,
                step: self.step,
                cols: self.cols,
                rows: self.rows,
                values: self.values,
            },
        })
    }
}

/// Control path to worker.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// Replace the worker's snapshot. Sent before any render for its version.
    SetPoints(Arc<SpatialField>),
    Render(RenderRequest),
}

/// Worker to control path.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    PointsReady { version: u64, count: usize },
    Rendered(RenderResult),
}

mod nan_as_null {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| if v.is_nan() { None } else { Some(*v) }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        let raw = Vec::<Option<f32>>::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect())
    }
}
