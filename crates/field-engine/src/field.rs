//! Immutable observation snapshot shared between the scheduler and workers.

use field_common::Observation;
use tracing::debug;

use crate::config::{IndexConfig, InterpolationParams};
use crate::interpolation::idw_estimate;
use crate::spatial_index::SpatialIndex;

/// One observation snapshot with everything a query needs.
///
/// Built once per feed delivery and shared as `Arc<SpatialField>`. The
/// version increases with every delivery and feeds the render signature.
#[derive(Debug, Clone)]
pub struct SpatialField {
    index: SpatialIndex,
    version: u64,
    coincidence_epsilon: f64,
}

impl SpatialField {
    pub fn new(observations: &[Observation], version: u64, config: &IndexConfig) -> Self {
        let index = SpatialIndex::build(observations, config);
        debug!(
            version,
            observations = index.len(),
            bins = index.bin_count(),
            "Built spatial field"
        );
        Self {
            index,
            version,
            coincidence_epsilon: config.coincidence_epsilon,
        }
    }

    /// Field with no observations (version 0).
    pub fn empty(config: &IndexConfig) -> Self {
        Self::new(&[], 0, config)
    }

    /// Estimated value at `(lat, lon)`, or `None` when no observation is in range.
    pub fn estimate(&self, lat: f64, lon: f64, params: &InterpolationParams) -> Option<f64> {
        if !(lat.is_finite() && lon.is_finite()) {
            return None;
        }
        let candidates = self.index.query(lat, lon, params.max_candidates);
        idw_estimate(&candidates, lat, lon, params, self.coincidence_epsilon)
    }

    /// [`estimate`](Self::estimate) with a caller-owned candidate buffer.
    pub(crate) fn estimate_with<'a>(
        &'a self,
        lat: f64,
        lon: f64,
        params: &InterpolationParams,
        buf: &mut Vec<&'a Observation>,
    ) -> Option<f64> {
        if !(lat.is_finite() && lon.is_finite()) {
            return None;
        }
        self.index.query_into(lat, lon, params.max_candidates, buf);
        idw_estimate(buf, lat, lon, params, self.coincidence_epsilon)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }
}
